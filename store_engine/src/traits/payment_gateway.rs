use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::{Money, OrderId};

/// Everything the gateway needs to open a payable session for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionRequest {
    pub order_id: OrderId,
    pub amount: Money,
    pub customer_id: i64,
    pub customer_email: String,
    pub customer_name: String,
    pub customer_phone: Option<String>,
}

/// What the gateway handed back. Any of the fields may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSession {
    pub session_id: Option<String>,
    pub qr_artifact: Option<String>,
    pub payment_link: Option<String>,
}

/// The contract the engine requires from an external payment gateway.
///
/// Session creation is a network call. Callers must not hold any database transaction while awaiting it.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway: Clone {
    async fn create_session(&self, request: SessionRequest) -> Result<PaymentSession, GatewayError>;

    /// Checks a webhook signature against the raw (unparsed) request body and the timestamp header.
    fn verify_signature(&self, raw_payload: &[u8], signature: &str, timestamp: &str) -> bool;
}

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("The payment request is invalid. {0}")]
    InvalidRequest(String),
    #[error("The payment gateway rejected the request with status {status}. {message}")]
    RequestFailed { status: u16, message: String },
    #[error("The payment gateway did not respond in time")]
    Timeout,
    #[error("The payment gateway could not be reached. {0}")]
    Unavailable(String),
    #[error("The payment gateway sent a response we could not understand. {0}")]
    InvalidResponse(String),
    #[error("No payment method is available for order {0}")]
    NoPayableArtifact(OrderId),
}
