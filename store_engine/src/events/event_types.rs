use serde::Serialize;

use crate::db_types::{Order, OrderStatusType};

/// A customer's cart changed. Consumers re-read the cart if they need its contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartUpdatedEvent {
    pub user_id: i64,
    pub product_id: i64,
    /// The line quantity after the change. Zero when the line was removed.
    pub quantity: i64,
}

/// A reservation left a product's stock below the low-stock threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LowStockEvent {
    pub product_id: i64,
    pub stock: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderUpdatedEvent {
    pub order: Order,
    /// `None` for a freshly created order.
    pub previous_status: Option<OrderStatusType>,
}

impl OrderUpdatedEvent {
    pub fn created(order: Order) -> Self {
        Self { order, previous_status: None }
    }

    pub fn changed(order: Order, previous_status: OrderStatusType) -> Self {
        Self { order, previous_status: Some(previous_status) }
    }
}
