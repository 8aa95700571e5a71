//! # Store engine public API
//!
//! Each API wraps a backend that implements the storage traits it needs, plus the event producers it publishes to.
//!
//! * [`cart_api`] is the cart manager. Every cart mutation reserves or releases stock.
//! * [`order_flow_api`] creates orders from carts and drives the order status state machine.
//! * [`checkout_api`] opens payment sessions with the payment gateway.
//! * [`webhook_api`] verifies gateway notifications and applies them to orders.
//!
//! ```rust,ignore
//! use store_engine::{events::EventProducers, CartApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/store.db", 5).await?;
//! let carts = CartApi::new(db, EventProducers::default());
//! carts.add_item(customer_id, product_id, 2).await?;
//! ```
pub mod cart_api;
pub mod cart_objects;
pub mod checkout_api;
pub mod errors;
pub mod order_flow_api;
pub mod order_objects;
pub mod payment_objects;
pub mod webhook_api;
