use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use store_engine::{
    db_types::{OrderId, OrderStatusType},
    order_objects::OrderQueryFilter,
};

/// `?quantity=n` on the cart routes. Adding defaults to one unit; changing a quantity must say what to change it to.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct QuantityParams {
    pub quantity: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(default)]
    pub shipping_address: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSessionRequest {
    pub order_id: OrderId,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: OrderStatusType,
}

/// Query string of the admin order listing, e.g. `?status=PAID&since=2024-06-01T00:00:00Z`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderSearchParams {
    pub status: Option<OrderStatusType>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl From<OrderSearchParams> for OrderQueryFilter {
    fn from(params: OrderSearchParams) -> Self {
        let mut filter = OrderQueryFilter::default();
        if let Some(status) = params.status {
            filter = filter.with_status(status);
        }
        if let Some(since) = params.since {
            filter = filter.since(since);
        }
        if let Some(until) = params.until {
            filter = filter.until(until);
        }
        filter
    }
}
