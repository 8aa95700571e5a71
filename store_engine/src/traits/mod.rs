//! # Backend contracts
//!
//! This module defines the behaviour that a storage backend must expose to drive the store engine, plus the contract
//! the engine requires from a payment gateway.
//!
//! * [`InventoryManagement`] is the inventory ledger: atomic stock reservation and release per product.
//! * [`CustomerManagement`] gives read access to customer records (and registration, which creates the cart).
//! * [`CartManagement`] keeps one cart per customer, moving stock through the ledger on every mutation.
//! * [`OrderManagement`] creates orders from carts and owns the order status state machine.
//! * [`PaymentGateway`] opens payment sessions and verifies webhook signatures.
//!
//! [`StoreDatabase`] bundles the four storage contracts for callers that need all of them.
mod cart_management;
mod customer_management;
mod inventory_management;
mod order_management;
mod payment_gateway;

mod data_objects;

pub use cart_management::{CartError, CartManagement};
pub use customer_management::{CustomerError, CustomerManagement};
pub use data_objects::{
    CancelledOrder,
    CartLine,
    CartMutation,
    NewOrderResult,
    OrderItemDetail,
    OrderTransition,
    Restock,
};
pub use inventory_management::{InventoryError, InventoryManagement};
pub use order_management::{OrderError, OrderManagement};
pub use payment_gateway::{GatewayError, PaymentGateway, PaymentSession, SessionRequest};

/// A backend that implements every storage contract. Blanket-implemented, so never implement it by hand.
pub trait StoreDatabase: InventoryManagement + CustomerManagement + CartManagement + OrderManagement {}

impl<T> StoreDatabase for T where T: InventoryManagement + CustomerManagement + CartManagement + OrderManagement {}
