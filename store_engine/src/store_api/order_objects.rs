use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Money, Order, OrderId, OrderStatusType},
    helpers::resolve_image,
    traits::OrderItemDetail,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderQueryFilter {
    pub user_id: Option<i64>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub status: Option<Vec<OrderStatusType>>,
}

impl OrderQueryFilter {
    pub fn with_user_id(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.status.get_or_insert_with(Vec::new).push(status);
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.user_id.is_none() &&
            self.status.as_ref().map_or(true, |s| s.is_empty()) &&
            self.since.is_none() &&
            self.until.is_none()
    }
}

impl Display for OrderQueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "No filters.");
        }
        if let Some(user_id) = &self.user_id {
            write!(f, "user_id: {user_id}. ")?;
        }
        if let Some(since) = &self.since {
            write!(f, "since {since}. ")?;
        }
        if let Some(until) = &self.until {
            write!(f, "until {until}. ")?;
        }
        if let Some(statuses) = self.status.as_ref().filter(|s| !s.is_empty()) {
            let statuses = statuses.iter().map(|s| s.to_string()).collect::<Vec<String>>().join(",");
            write!(f, "statuses: [{statuses}]. ")?;
        }
        Ok(())
    }
}

/// Returned when a customer checks out their cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSummary {
    pub order_id: OrderId,
    pub amount: Money,
}

/// The answer to a customer polling for payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusView {
    pub status: OrderStatusType,
    /// Empty until the order has been paid.
    pub transaction_id: String,
}

/// An order line as shown to customers and administrators. Prices are always the frozen price-at-purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemView {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub price_at_purchase: Money,
    pub image: String,
}

impl From<OrderItemDetail> for OrderItemView {
    fn from(item: OrderItemDetail) -> Self {
        Self {
            product_id: item.product_id,
            product_name: item.product_name,
            quantity: item.quantity,
            price_at_purchase: item.price_at_purchase,
            image: resolve_image(item.image_url),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: OrderId,
    pub user_id: i64,
    pub total: Money,
    pub status: OrderStatusType,
    pub created_at: DateTime<Utc>,
    pub shipping_address: Option<String>,
    pub transaction_id: Option<String>,
    pub items: Vec<OrderItemView>,
}

impl OrderView {
    pub fn new(order: Order, items: Vec<OrderItemDetail>) -> Self {
        Self {
            id: order.id,
            user_id: order.user_id,
            total: order.total,
            status: order.status,
            created_at: order.created_at,
            shipping_address: order.shipping_address,
            transaction_id: order.transaction_id,
            items: items.into_iter().map(OrderItemView::from).collect(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn filter_builder() {
        let filter = OrderQueryFilter::default();
        assert!(filter.is_empty());
        assert_eq!(filter.to_string(), "No filters.");
        let filter = filter.with_user_id(3).with_status(OrderStatusType::Paid).with_status(OrderStatusType::Shipped);
        assert!(!filter.is_empty());
        assert_eq!(filter.status.as_deref(), Some([OrderStatusType::Paid, OrderStatusType::Shipped].as_slice()));
        assert_eq!(filter.to_string(), "user_id: 3. statuses: [PAID,SHIPPED]. ");
    }

    #[test]
    fn checkout_summary_json() {
        let summary = CheckoutSummary { order_id: OrderId(12), amount: Money::from_minor_units(45_000) };
        let json = serde_json::to_string(&summary).unwrap();
        assert_eq!(json, r#"{"orderId":12,"amount":"450.00"}"#);
    }
}
