use chrono::Duration;
use thiserror::Error;

use crate::{
    db_types::{Order, OrderId, OrderStatusType, Payment},
    order_objects::OrderQueryFilter,
    traits::{
        data_objects::{CancelledOrder, NewOrderResult, OrderItemDetail, OrderTransition},
        CartError,
        InventoryError,
    },
};

/// Order persistence and the order status state machine.
///
/// Every status transition is a compare-and-set against the order's current status, executed in the same
/// transaction as its side effects (stock release, cart clearing, payment records). Two racing transitions on the same
/// order can therefore never both pass a status guard.
#[allow(async_fn_in_trait)]
pub trait OrderManagement: Clone {
    /// Creates a `Pending` order from the customer's cart. The total and every line price are frozen from the current
    /// product prices. Stock and the cart are left untouched.
    ///
    /// Any earlier `Pending` order of the same customer is superseded (marked `Cancelled` without releasing stock),
    /// since the cart's reservation now backs the new order.
    async fn create_pending_order(
        &self,
        user_id: i64,
        shipping_address: Option<String>,
    ) -> Result<NewOrderResult, OrderError>;

    async fn fetch_order(&self, order_id: OrderId) -> Result<Option<Order>, OrderError>;

    async fn fetch_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItemDetail>, OrderError>;

    /// All orders for the customer, newest first.
    async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, OrderError>;

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderError>;

    /// `Pending` -> `Paid`. Records the transaction reference and a payment record. If the cart still holds the order's
    /// stock, the cart is cleared without releasing anything and the order takes the stock over. Any other starting
    /// state fails with [`OrderError::InvalidTransition`].
    async fn confirm_order(&self, order_id: OrderId, transaction_ref: &str) -> Result<Order, OrderError>;

    /// Records a payment the gateway captured after the order was cancelled, so that it can be refunded. The order does
    /// not change. Returns `None` if the order is not `Cancelled`, or if a paid record with the same reference exists.
    async fn record_payment_after_cancellation(
        &self,
        order_id: OrderId,
        transaction_ref: &str,
    ) -> Result<Option<Payment>, OrderError>;

    /// `Pending` or `Paid` -> `Cancelled`, returning the stock the order holds (see
    /// [`StockHolder`](crate::db_types::StockHolder)). If the cart still holds it, the cart is emptied without a second
    /// release. Cancelling an order that is already `Cancelled` is a no-op.
    ///
    /// Ownership is not checked here.
    async fn cancel_order(&self, order_id: OrderId) -> Result<CancelledOrder, OrderError>;

    /// `Pending` -> `Cancelled` for an abandoned order, returning its lines to stock and emptying the cart. Returns
    /// `None` (and changes nothing) if the order has left `Pending` in the meantime.
    async fn expire_order(&self, order_id: OrderId) -> Result<Option<CancelledOrder>, OrderError>;

    /// Any state except `Cancelled` -> `Failed`, with a payment record. Returns `None` if the order was cancelled or has
    /// already failed, in which case nothing changes. No stock moves.
    async fn fail_order(
        &self,
        order_id: OrderId,
        gateway_payment_id: Option<&str>,
    ) -> Result<Option<OrderTransition>, OrderError>;

    /// Administrative status change. Refuses to move an order into or out of `Cancelled`, but otherwise applies no
    /// transition guard. Cancellations go through [`Self::cancel_order`]. Moving to `Paid`, `Shipped` or `Delivered`
    /// takes the stock over from the cart when the cart still holds it.
    async fn set_order_status(&self, order_id: OrderId, status: OrderStatusType)
        -> Result<OrderTransition, OrderError>;

    async fn fetch_payments_for_order(&self, order_id: OrderId) -> Result<Vec<Payment>, OrderError>;

    /// `Pending` orders created at least `older_than` ago, oldest first.
    async fn fetch_stale_pending_orders(&self, older_than: Duration) -> Result<Vec<Order>, OrderError>;
}

#[derive(Debug, Clone, Error)]
pub enum OrderError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("The cart of customer {0} is empty")]
    EmptyCart(i64),
    #[error("Order {order_id} cannot move from {from} to {to}")]
    InvalidTransition { order_id: OrderId, from: OrderStatusType, to: OrderStatusType },
    #[error("Customer {user_id} does not own order {order_id}")]
    AccessDenied { order_id: OrderId, user_id: i64 },
    #[error("Customer {0} does not exist")]
    CustomerNotFound(i64),
    #[error("{0}")]
    Inventory(#[from] InventoryError),
    #[error("{0}")]
    Cart(#[from] CartError),
}

impl From<sqlx::Error> for OrderError {
    fn from(e: sqlx::Error) -> Self {
        OrderError::DatabaseError(e.to_string())
    }
}
