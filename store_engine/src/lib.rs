//! Store Engine
//!
//! The order and payment reconciliation core of the store backend: an inventory ledger, per-customer carts that
//! reserve stock as items are added, orders that freeze the cart at checkout, payment sessions opened with an external
//! gateway, and reconciliation of the gateway's signed webhooks.
//!
//! The library is divided into two main sections:
//! 1. Storage contracts ([`traits`]) and their SQLite implementation ([`SqliteDatabase`]). Record types live in
//!    [`db_types`].
//! 2. The public API ([`CartApi`], [`OrderFlowApi`], [`CheckoutApi`] and [`WebhookReconciler`]). Each is generic over a
//!    backend that implements the traits it needs.
//!
//! Cart and order changes are published as events. See [`events`] for how to hook into them.
pub mod db_types;
pub mod events;
pub mod helpers;
#[cfg(feature = "sqlite")]
mod sqlite;
mod store_api;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use sqlite::{db, SqliteDatabase};
pub use store_api::{
    cart_api::{CartApi, DEFAULT_LOW_STOCK_THRESHOLD},
    cart_objects,
    checkout_api::{CheckoutApi, CheckoutOptions},
    errors::{CheckoutError, WebhookError},
    order_flow_api::OrderFlowApi,
    order_objects,
    payment_objects,
    webhook_api::{GatewayStatus, IgnoreReason, WebhookOutcome, WebhookPayload, WebhookReconciler},
};
