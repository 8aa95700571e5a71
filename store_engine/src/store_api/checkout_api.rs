use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Money, OrderId, OrderStatusType},
    helpers::{upi_deep_link, upi_qr_data_uri},
    store_api::{
        errors::CheckoutError,
        payment_objects::{PayableArtifact, PaymentSessionResponse},
    },
    traits::{
        CustomerManagement,
        GatewayError,
        OrderError,
        OrderManagement,
        PaymentGateway,
        PaymentSession,
        SessionRequest,
    },
};

const DEFAULT_CUSTOMER_NAME: &str = "Customer";

/// Settings for the locally generated UPI fallback.
#[derive(Debug, Clone)]
pub struct CheckoutOptions {
    /// The merchant's virtual payment address. Without it there is no local fallback.
    pub merchant_vpa: Option<String>,
    pub merchant_name: String,
}

impl Default for CheckoutOptions {
    fn default() -> Self {
        Self { merchant_vpa: None, merchant_name: "Store".to_string() }
    }
}

/// `CheckoutApi` opens payment sessions for pending orders.
///
/// No local state changes here. If the gateway fails, the order stays `Pending` and the customer can simply try again.
pub struct CheckoutApi<B, G> {
    db: B,
    gateway: G,
    options: CheckoutOptions,
}

impl<B, G> Debug for CheckoutApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CheckoutApi ({:?})", self.options)
    }
}

impl<B: Clone, G: Clone> Clone for CheckoutApi<B, G> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone(), gateway: self.gateway.clone(), options: self.options.clone() }
    }
}

impl<B, G> CheckoutApi<B, G> {
    pub fn new(db: B, gateway: G, options: CheckoutOptions) -> Self {
        Self { db, gateway, options }
    }
}

impl<B, G> CheckoutApi<B, G>
where
    B: OrderManagement + CustomerManagement,
    G: PaymentGateway,
{
    pub async fn create_payment_session(
        &self,
        order_id: OrderId,
        user_id: i64,
    ) -> Result<PaymentSessionResponse, CheckoutError> {
        let order = self.db.fetch_order(order_id).await?.ok_or(OrderError::OrderNotFound(order_id))?;
        if order.user_id != user_id {
            warn!("💳️ Customer {user_id} asked to pay for order {order_id}, which is not theirs");
            return Err(OrderError::AccessDenied { order_id, user_id }.into());
        }
        if order.status != OrderStatusType::Pending {
            return Err(OrderError::InvalidTransition { order_id, from: order.status, to: OrderStatusType::Paid }.into());
        }
        let customer = self.db.fetch_customer(user_id).await?.ok_or(OrderError::CustomerNotFound(user_id))?;
        let customer_name = Some(customer.name).filter(|n| !n.trim().is_empty());
        let request = SessionRequest {
            order_id,
            amount: order.total,
            customer_id: customer.id,
            customer_email: customer.email,
            customer_name: customer_name.unwrap_or_else(|| DEFAULT_CUSTOMER_NAME.to_string()),
            customer_phone: customer.phone,
        };
        debug!("💳️ Requesting a payment session for order {order_id} ({})", order.total);
        let session = self.gateway.create_session(request).await.map_err(|e| {
            warn!("💳️ The gateway could not open a session for order {order_id}. {e}");
            e
        })?;
        let artifact = self.choose_artifact(order_id, order.total, session)?;
        info!("💳️ Payment session ready for order {order_id}: {}", artifact.kind());
        Ok(PaymentSessionResponse { order_id: order_id.gateway_order_id(), amount: order.total, artifact })
    }

    /// Gateway QR, then gateway link, then gateway session id. Only when the gateway offers none of these does the
    /// local UPI QR come into play.
    fn choose_artifact(
        &self,
        order_id: OrderId,
        amount: Money,
        session: PaymentSession,
    ) -> Result<PayableArtifact, GatewayError> {
        let present = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        if let Some(qr) = present(session.qr_artifact) {
            return Ok(PayableArtifact::QrArtifact(qr));
        }
        if let Some(link) = present(session.payment_link) {
            return Ok(PayableArtifact::PaymentLink(link));
        }
        if let Some(id) = present(session.session_id) {
            return Ok(PayableArtifact::SessionId(id));
        }
        let vpa = self.options.merchant_vpa.as_deref().filter(|v| !v.trim().is_empty());
        let Some(vpa) = vpa else {
            error!("💳️ The gateway returned nothing payable for order {order_id} and no merchant VPA is configured");
            return Err(GatewayError::NoPayableArtifact(order_id));
        };
        let upi_link = upi_deep_link(vpa, &self.options.merchant_name, amount, order_id);
        let qr_artifact = upi_qr_data_uri(&upi_link).map_err(|e| {
            error!("💳️ Could not render the UPI QR code for order {order_id}. {e}");
            GatewayError::NoPayableArtifact(order_id)
        })?;
        Ok(PayableArtifact::UpiQr { upi_link, qr_artifact })
    }
}
