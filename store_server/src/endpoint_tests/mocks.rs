use mockall::mock;
use store_engine::traits::{GatewayError, PaymentGateway, PaymentSession, SessionRequest};

mock! {
    pub Gateway {}
    impl PaymentGateway for Gateway {
        async fn create_session(&self, request: SessionRequest) -> Result<PaymentSession, GatewayError>;
        fn verify_signature(&self, raw_payload: &[u8], signature: &str, timestamp: &str) -> bool;
    }
    impl Clone for Gateway {
        fn clone(&self) -> Self;
    }
}

/// A gateway that accepts only the signature `valid` and must never be asked for a session.
pub fn signature_checking_gateway() -> MockGateway {
    let mut gateway = MockGateway::new();
    gateway.expect_verify_signature().returning(|_, signature, _| signature == "valid");
    gateway.expect_create_session().never();
    gateway
}
