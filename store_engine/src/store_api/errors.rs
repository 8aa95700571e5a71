use thiserror::Error;

use crate::traits::{CustomerError, GatewayError, OrderError};

#[derive(Debug, Clone, Error)]
pub enum CheckoutError {
    #[error("{0}")]
    Order(#[from] OrderError),
    #[error("{0}")]
    Customer(#[from] CustomerError),
    #[error("Could not open a payment session. {0}")]
    Gateway(#[from] GatewayError),
}

#[derive(Debug, Clone, Error)]
pub enum WebhookError {
    #[error("The webhook signature is invalid")]
    InvalidSignature,
    #[error("The webhook payload could not be read. {0}")]
    MalformedPayload(String),
    #[error("{0}")]
    Order(#[from] OrderError),
}
