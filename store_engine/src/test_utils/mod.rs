//! Helpers for tests that need a real database or a stand-in payment gateway.
pub mod fake_gateway;
pub mod prepare_env;
