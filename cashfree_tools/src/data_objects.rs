use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /pg/orders`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateOrderRequest {
    pub order_id: String,
    /// Major units. Cashfree only accepts a JSON number here.
    pub order_amount: f64,
    pub order_currency: String,
    pub customer_details: CustomerDetails,
    #[serde(skip_serializing_if = "OrderMeta::is_empty")]
    pub order_meta: OrderMeta,
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerDetails {
    pub customer_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct OrderMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notify_url: Option<String>,
}

impl OrderMeta {
    pub fn is_empty(&self) -> bool {
        self.return_url.is_none() && self.notify_url.is_none()
    }
}

/// The fields of the create-order response that lead to a payable artifact. Cashfree returns a lot more than this.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateOrderResponse {
    pub cf_order_id: Option<Value>,
    pub order_status: Option<String>,
    pub payment_session_id: Option<String>,
    pub payment_link: Option<String>,
    #[serde(default)]
    pub payments: Option<PaymentUrls>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentUrls {
    pub url: Option<String>,
}

impl CreateOrderResponse {
    /// The hosted payment page, whichever field it arrived in.
    pub fn hosted_payment_url(&self) -> Option<&str> {
        self.payments.as_ref().and_then(|p| p.url.as_deref()).filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    #[test]
    fn request_body_shape() {
        let request = CreateOrderRequest {
            order_id: "ORD_12".into(),
            order_amount: 450.0,
            order_currency: "INR".into(),
            customer_details: CustomerDetails {
                customer_id: "cust_3".into(),
                customer_name: "Asha".into(),
                customer_email: "asha@example.com".into(),
                customer_phone: "9876543210".into(),
            },
            order_meta: OrderMeta { return_url: None, notify_url: Some("https://shop.example/webhook".into()) },
        };
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body,
            json!({
                "order_id": "ORD_12",
                "order_amount": 450.0,
                "order_currency": "INR",
                "customer_details": {
                    "customer_id": "cust_3",
                    "customer_name": "Asha",
                    "customer_email": "asha@example.com",
                    "customer_phone": "9876543210"
                },
                "order_meta": { "notify_url": "https://shop.example/webhook" }
            })
        );
        let bare = CreateOrderRequest { order_meta: OrderMeta::default(), ..request };
        assert!(serde_json::to_value(&bare).unwrap().get("order_meta").is_none());
    }

    #[test]
    fn response_parsing() {
        let body = r#"{
            "cf_order_id": 2149460581,
            "order_id": "ORD_12",
            "order_status": "ACTIVE",
            "payment_session_id": "session_a1b2",
            "payments": { "url": "https://sandbox.cashfree.com/pg/view/pay/ORD_12" },
            "order_meta": { "return_url": null }
        }"#;
        let response: CreateOrderResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.payment_session_id.as_deref(), Some("session_a1b2"));
        assert_eq!(response.hosted_payment_url(), Some("https://sandbox.cashfree.com/pg/view/pay/ORD_12"));
        assert!(response.payment_link.is_none());

        let response: CreateOrderResponse = serde_json::from_str(r#"{"payments": {"url": ""}}"#).unwrap();
        assert_eq!(response.hosted_payment_url(), None);
    }
}
