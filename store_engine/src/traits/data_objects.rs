use serde::Serialize;
use sqlx::FromRow;

use crate::db_types::{Money, Order, OrderItem, OrderStatusType};

/// The result of a successful cart mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartMutation {
    pub cart_id: i64,
    pub product_id: i64,
    /// The cart line's quantity after the change. Zero means the line was removed.
    pub quantity: i64,
    /// The product's stock level after the change.
    pub stock: i64,
    /// Pending orders that no longer match the cart and were cancelled by this change. Their stock stays reserved by
    /// the cart.
    pub superseded: Vec<Order>,
}

/// A cart line joined with the live product record.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct CartLine {
    pub product_id: i64,
    pub product_name: String,
    pub price: Money,
    pub quantity: i64,
    pub image_url: Option<String>,
}

impl CartLine {
    pub fn line_total(&self) -> Money {
        self.price * self.quantity
    }
}

/// An order line joined with the product's name and image. The price is the frozen price-at-purchase.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct OrderItemDetail {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub price_at_purchase: Money,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderResult {
    pub order: Order,
    pub items: Vec<OrderItem>,
    /// Older pending orders of the same customer that this order replaced. Their reservation carries over to the new
    /// order, so no stock was moved.
    pub superseded: Vec<Order>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Restock {
    pub product_id: i64,
    pub quantity: i64,
    /// The stock level after the units were returned.
    pub stock: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelledOrder {
    pub order: Order,
    pub previous_status: OrderStatusType,
    /// Empty when the order was already cancelled.
    pub restocked: Vec<Restock>,
}

impl CancelledOrder {
    pub fn was_already_cancelled(&self) -> bool {
        self.previous_status == OrderStatusType::Cancelled
    }
}

/// An order after a status change, with the status it left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderTransition {
    pub order: Order,
    pub previous_status: OrderStatusType,
}

impl OrderTransition {
    pub fn is_change(&self) -> bool {
        self.order.status != self.previous_status
    }
}
