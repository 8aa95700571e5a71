use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
    Mutex,
};

use crate::{
    helpers::{sign_webhook_payload, verify_webhook_signature},
    traits::{GatewayError, PaymentGateway, PaymentSession, SessionRequest},
};

/// An in-memory payment gateway. Signatures are real, so webhooks built with [`FakeGateway::sign`] verify exactly
/// as they would against the live gateway.
#[derive(Clone)]
pub struct FakeGateway {
    secret: String,
    session: PaymentSession,
    failure: Option<GatewayError>,
    calls: Arc<AtomicUsize>,
    last_request: Arc<Mutex<Option<SessionRequest>>>,
}

impl FakeGateway {
    pub fn new(secret: &str) -> Self {
        Self {
            secret: secret.to_string(),
            session: PaymentSession::default(),
            failure: None,
            calls: Arc::new(AtomicUsize::new(0)),
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_session(mut self, session: PaymentSession) -> Self {
        self.session = session;
        self
    }

    pub fn failing_with(mut self, error: GatewayError) -> Self {
        self.failure = Some(error);
        self
    }

    pub fn sign(&self, timestamp: &str, payload: &[u8]) -> String {
        sign_webhook_payload(&self.secret, timestamp, payload).expect("HMAC accepts any key")
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<SessionRequest> {
        self.last_request.lock().expect("poisoned lock").clone()
    }
}

impl PaymentGateway for FakeGateway {
    async fn create_session(&self, request: SessionRequest) -> Result<PaymentSession, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().expect("poisoned lock") = Some(request);
        match &self.failure {
            Some(e) => Err(e.clone()),
            None => Ok(self.session.clone()),
        }
    }

    fn verify_signature(&self, raw_payload: &[u8], signature: &str, timestamp: &str) -> bool {
        verify_webhook_signature(&self.secret, timestamp, raw_payload, signature)
    }
}
