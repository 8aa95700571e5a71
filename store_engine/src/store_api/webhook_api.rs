//! Reconciles payment notifications pushed by the gateway.
//!
//! Deliveries may be duplicated, delayed or reordered. Every transition applied here is guarded by the order's
//! current status, so replaying an event leaves the order exactly where the first delivery put it.
use std::fmt::{Debug, Display};

use log::*;
use serde::Deserialize;
use serde_json::Value;

use crate::{
    db_types::{OrderId, OrderStatusType},
    store_api::{errors::WebhookError, order_flow_api::OrderFlowApi},
    traits::{OrderError, OrderManagement, PaymentGateway},
};

/// The parts of a gateway notification the reconciler reads. Everything else in the body is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookPayload {
    pub order_id: Option<String>,
    #[serde(default)]
    pub order: WebhookOrder,
    #[serde(default)]
    pub payment: WebhookPayment,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookOrder {
    pub order_status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookPayment {
    /// Some gateway versions send this as a number.
    pub cf_payment_id: Option<Value>,
}

impl WebhookPayload {
    pub fn gateway_payment_id(&self) -> Option<String> {
        match self.payment.cf_payment_id.as_ref()? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn normalized_status(&self) -> String {
        self.order.order_status.as_deref().unwrap_or_default().trim().to_ascii_uppercase()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayStatus {
    Paid,
    Failed,
    Other,
}

impl From<&str> for GatewayStatus {
    fn from(normalized: &str) -> Self {
        match normalized {
            "PAID" => Self::Paid,
            "FAILED" | "CANCELLED" => Self::Failed,
            _ => Self::Other,
        }
    }
}

/// How a delivery was handled. Every outcome is acknowledged to the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    Applied { order_id: OrderId },
    /// The order had been cancelled before the payment arrived. The payment was recorded for a refund and the order
    /// left as it was.
    PaidAfterCancellation { order_id: OrderId, payment_id: i64 },
    Ignored(IgnoreReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    MissingOrderId,
    UnrecognisedOrderId(String),
    UnknownOrder(OrderId),
    /// The event does not change the order. This covers duplicate deliveries and statuses we do not act on.
    NoTransition { order_id: OrderId, status: String },
}

impl Display for IgnoreReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingOrderId => write!(f, "the payload has no order id"),
            Self::UnrecognisedOrderId(id) => write!(f, "{id} is not one of our order ids"),
            Self::UnknownOrder(id) => write!(f, "order {id} does not exist"),
            Self::NoTransition { order_id, status } => write!(f, "status '{status}' does not move order {order_id}"),
        }
    }
}

pub struct WebhookReconciler<B, G> {
    orders: OrderFlowApi<B>,
    gateway: G,
}

impl<B, G> Debug for WebhookReconciler<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WebhookReconciler")
    }
}

impl<B: Clone, G: Clone> Clone for WebhookReconciler<B, G> {
    fn clone(&self) -> Self {
        Self { orders: self.orders.clone(), gateway: self.gateway.clone() }
    }
}

impl<B, G> WebhookReconciler<B, G> {
    pub fn new(orders: OrderFlowApi<B>, gateway: G) -> Self {
        Self { orders, gateway }
    }
}

impl<B, G> WebhookReconciler<B, G>
where
    B: OrderManagement,
    G: PaymentGateway,
{
    /// Verifies and applies one webhook delivery.
    ///
    /// `raw_payload` must be the body exactly as received, since the signature covers its bytes. Errors other than
    /// [`WebhookError::InvalidSignature`] leave the order untouched and should be answered in a way that makes the
    /// gateway retry.
    pub async fn process_webhook(
        &self,
        raw_payload: &[u8],
        signature: &str,
        timestamp: &str,
    ) -> Result<WebhookOutcome, WebhookError> {
        if !self.gateway.verify_signature(raw_payload, signature, timestamp) {
            warn!("🪝️ Rejecting webhook with an invalid signature (timestamp {timestamp})");
            return Err(WebhookError::InvalidSignature);
        }
        let payload = serde_json::from_slice::<WebhookPayload>(raw_payload)
            .map_err(|e| WebhookError::MalformedPayload(e.to_string()))?;
        let outcome = self.apply(payload).await?;
        match &outcome {
            WebhookOutcome::Applied { order_id } => info!("🪝️ Webhook applied to order {order_id}"),
            WebhookOutcome::PaidAfterCancellation { order_id, payment_id } => {
                warn!("🪝️ Cancelled order {order_id} was paid. Refund payment record {payment_id}")
            },
            WebhookOutcome::Ignored(reason) => info!("🪝️ Webhook ignored: {reason}"),
        }
        Ok(outcome)
    }

    async fn apply(&self, payload: WebhookPayload) -> Result<WebhookOutcome, WebhookError> {
        let Some(gateway_order_id) = payload.order_id.as_deref() else {
            return Ok(WebhookOutcome::Ignored(IgnoreReason::MissingOrderId));
        };
        let Some(order_id) = OrderId::from_gateway_order_id(gateway_order_id) else {
            return Ok(WebhookOutcome::Ignored(IgnoreReason::UnrecognisedOrderId(gateway_order_id.to_string())));
        };
        let status = payload.normalized_status();
        let no_transition = || WebhookOutcome::Ignored(IgnoreReason::NoTransition { order_id, status: status.clone() });
        let unknown = || WebhookOutcome::Ignored(IgnoreReason::UnknownOrder(order_id));
        match GatewayStatus::from(status.as_str()) {
            GatewayStatus::Paid => {
                // Without a payment reference, the gateway's order id is the best reference there is
                let reference = payload.gateway_payment_id().unwrap_or_else(|| gateway_order_id.to_string());
                match self.orders.confirm_order(order_id, &reference).await {
                    Ok(_) => Ok(WebhookOutcome::Applied { order_id }),
                    Err(OrderError::InvalidTransition { from: OrderStatusType::Cancelled, .. }) => {
                        match self.orders.record_payment_after_cancellation(order_id, &reference).await? {
                            Some(payment) => Ok(WebhookOutcome::PaidAfterCancellation { order_id, payment_id: payment.id }),
                            None => Ok(no_transition()),
                        }
                    },
                    Err(OrderError::InvalidTransition { .. }) => Ok(no_transition()),
                    Err(OrderError::OrderNotFound(_)) => Ok(unknown()),
                    Err(e) => Err(e.into()),
                }
            },
            GatewayStatus::Failed => {
                let reference = payload.gateway_payment_id();
                match self.orders.fail_order(order_id, reference.as_deref()).await {
                    Ok(Some(_)) => Ok(WebhookOutcome::Applied { order_id }),
                    Ok(None) => Ok(no_transition()),
                    Err(OrderError::OrderNotFound(_)) => Ok(unknown()),
                    Err(e) => Err(e.into()),
                }
            },
            GatewayStatus::Other => {
                // Still report unknown orders as such
                match self.orders.db().fetch_order(order_id).await? {
                    Some(_) => Ok(no_transition()),
                    None => Ok(unknown()),
                }
            },
        }
    }
}
