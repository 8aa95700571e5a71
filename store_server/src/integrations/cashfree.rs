//! The Cashfree implementation of the engine's [`PaymentGateway`] contract.
use cashfree_tools::{
    helpers::cashfree_amount,
    CashfreeApi,
    CashfreeApiError,
    CashfreeConfig,
    CreateOrderRequest,
    CreateOrderResponse,
    CustomerDetails,
    OrderMeta,
    SANDBOX_MINIMUM_AMOUNT,
};
use log::*;
use store_common::CURRENCY_CODE;
use store_engine::{
    helpers::verify_webhook_signature,
    traits::{GatewayError, PaymentGateway, PaymentSession, SessionRequest},
};

use crate::errors::ServerError;

#[derive(Clone)]
pub struct CashfreeGateway {
    api: CashfreeApi,
}

impl CashfreeGateway {
    pub fn new(config: CashfreeConfig) -> Result<Self, ServerError> {
        let api = CashfreeApi::new(config).map_err(|e| ServerError::InitializeError(e.to_string()))?;
        Ok(Self { api })
    }

    fn create_order_request(&self, request: &SessionRequest) -> CreateOrderRequest {
        let config = self.api.config();
        let mut amount = request.amount;
        if config.is_sandbox() && amount < SANDBOX_MINIMUM_AMOUNT {
            info!(
                "💳️ Order {} is for {amount}, below the sandbox minimum. Charging {SANDBOX_MINIMUM_AMOUNT} instead.",
                request.order_id
            );
            amount = SANDBOX_MINIMUM_AMOUNT;
        }
        CreateOrderRequest {
            order_id: request.order_id.gateway_order_id(),
            order_amount: cashfree_amount(amount),
            order_currency: CURRENCY_CODE.to_string(),
            customer_details: CustomerDetails {
                customer_id: format!("cust_{}", request.customer_id),
                customer_name: request.customer_name.clone(),
                customer_email: request.customer_email.clone(),
                customer_phone: request.customer_phone.clone().unwrap_or_default(),
            },
            order_meta: OrderMeta { return_url: config.return_url.clone(), notify_url: config.notify_url.clone() },
        }
    }
}

/// Cashfree opens its payment page from a link, so the link doubles as the QR content when the gateway does not send
/// a dedicated one.
fn session_from_response(response: CreateOrderResponse) -> PaymentSession {
    let payment_link = response.payment_link.clone().filter(|s| !s.is_empty());
    let qr_artifact = response.hosted_payment_url().map(String::from);
    PaymentSession { session_id: response.payment_session_id, qr_artifact, payment_link }
}

fn gateway_error(e: CashfreeApiError) -> GatewayError {
    match e {
        CashfreeApiError::InvalidRequest(s) => GatewayError::InvalidRequest(s),
        CashfreeApiError::Timeout => GatewayError::Timeout,
        CashfreeApiError::QueryError { status, message } => GatewayError::RequestFailed { status, message },
        CashfreeApiError::JsonError(s) => GatewayError::InvalidResponse(s),
        CashfreeApiError::Initialization(s) | CashfreeApiError::RestResponseError(s) => GatewayError::Unavailable(s),
    }
}

impl PaymentGateway for CashfreeGateway {
    async fn create_session(&self, request: SessionRequest) -> Result<PaymentSession, GatewayError> {
        if request.customer_phone.is_none() {
            return Err(GatewayError::InvalidRequest(format!(
                "customer {} has no phone number on file",
                request.customer_id
            )));
        }
        let body = self.create_order_request(&request);
        let response = self.api.create_order(&body).await.map_err(gateway_error)?;
        debug!("💳️ Cashfree order {:?} is {:?}", response.cf_order_id, response.order_status);
        Ok(session_from_response(response))
    }

    fn verify_signature(&self, raw_payload: &[u8], signature: &str, timestamp: &str) -> bool {
        let secret = self.api.config().secret_key.reveal();
        if secret.is_empty() {
            warn!("🪝️ CASHFREE_SECRET_KEY is not set, so no webhook can be verified");
            return false;
        }
        verify_webhook_signature(secret, timestamp, raw_payload, signature)
    }
}
