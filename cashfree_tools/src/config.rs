use std::time::Duration;

use log::*;
use store_common::{
    helpers::{env_or_default, optional_env},
    Money,
    Secret,
};

pub const DEFAULT_BASE_URL: &str = "https://sandbox.cashfree.com";
pub const DEFAULT_API_VERSION: &str = "2023-08-01";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
/// The sandbox refuses orders below one rupee.
pub const SANDBOX_MINIMUM_AMOUNT: Money = Money::from_major_units(1);

#[derive(Debug, Clone)]
pub struct CashfreeConfig {
    /// e.g. "https://sandbox.cashfree.com" or "https://api.cashfree.com"
    pub base_url: String,
    pub app_id: String,
    /// Authenticates API calls and keys the webhook signatures.
    pub secret_key: Secret<String>,
    pub api_version: String,
    pub return_url: Option<String>,
    pub notify_url: Option<String>,
    pub timeout: Duration,
}

impl Default for CashfreeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            app_id: String::default(),
            secret_key: Secret::default(),
            api_version: DEFAULT_API_VERSION.to_string(),
            return_url: None,
            notify_url: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl CashfreeConfig {
    pub fn new_from_env_or_default() -> Self {
        let base_url = env_or_default("CASHFREE_BASE_URL", DEFAULT_BASE_URL.to_string());
        let app_id = optional_env("CASHFREE_APP_ID").unwrap_or_else(|| {
            error!("🪛️ CASHFREE_APP_ID is not set. Payment sessions cannot be created without it.");
            String::default()
        });
        let secret_key = Secret::new(optional_env("CASHFREE_SECRET_KEY").unwrap_or_else(|| {
            error!("🪛️ CASHFREE_SECRET_KEY is not set. Payment sessions and webhooks will fail.");
            String::default()
        }));
        let api_version = env_or_default("CASHFREE_API_VERSION", DEFAULT_API_VERSION.to_string());
        let return_url = optional_env("CASHFREE_RETURN_URL");
        let notify_url = optional_env("CASHFREE_NOTIFY_URL");
        let timeout = Duration::from_secs(env_or_default("CASHFREE_TIMEOUT", DEFAULT_TIMEOUT_SECS));
        Self { base_url, app_id, secret_key, api_version, return_url, notify_url, timeout }
    }

    /// Sandbox credentials only work against a sandbox host, so the URL is a reliable tell.
    pub fn is_sandbox(&self) -> bool {
        self.base_url.to_ascii_lowercase().contains("sandbox")
    }
}
