//! Server configuration, read from `STORE_*` and `CASHFREE_*` environment variables. Every value has a default, and
//! every default that is used gets logged.
use std::time::Duration as StdDuration;

use cashfree_tools::CashfreeConfig;
use chrono::Duration;
use log::*;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use store_common::{
    helpers::{env_or_default, optional_env, parse_boolean_flag},
    Secret,
};
use store_engine::{CheckoutOptions, DEFAULT_LOW_STOCK_THRESHOLD};

const DEFAULT_STORE_HOST: &str = "127.0.0.1";
const DEFAULT_STORE_PORT: u16 = 8360;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/store.db";
const DEFAULT_PENDING_ORDER_TIMEOUT_MINS: i64 = 60;
const DEFAULT_EXPIRY_CHECK_INTERVAL_SECS: u64 = 60;
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::hours(24);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address.
    pub use_forwarded: bool,
    /// How long an order may wait in `Pending` before its reservation is released.
    pub pending_order_timeout: Duration,
    pub expiry_check_interval: StdDuration,
    pub low_stock_threshold: i64,
    pub cashfree: CashfreeConfig,
    pub checkout: CheckoutOptions,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_STORE_HOST.to_string(),
            port: DEFAULT_STORE_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            auth: AuthConfig::default(),
            use_x_forwarded_for: false,
            use_forwarded: false,
            pending_order_timeout: Duration::minutes(DEFAULT_PENDING_ORDER_TIMEOUT_MINS),
            expiry_check_interval: StdDuration::from_secs(DEFAULT_EXPIRY_CHECK_INTERVAL_SECS),
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            cashfree: CashfreeConfig::default(),
            checkout: CheckoutOptions::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env_or_default("STORE_HOST", DEFAULT_STORE_HOST.to_string());
        let port = env_or_default("STORE_PORT", DEFAULT_STORE_PORT);
        let database_url = optional_env("STORE_DATABASE_URL").unwrap_or_else(|| {
            warn!("🪛️ STORE_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}");
            DEFAULT_DATABASE_URL.to_string()
        });
        let auth = AuthConfig::from_env_or_default();
        let use_x_forwarded_for = parse_boolean_flag(optional_env("STORE_USE_X_FORWARDED_FOR"), false);
        let use_forwarded = parse_boolean_flag(optional_env("STORE_USE_FORWARDED"), false);
        let timeout = env_or_default("STORE_PENDING_ORDER_TIMEOUT", DEFAULT_PENDING_ORDER_TIMEOUT_MINS);
        let pending_order_timeout = if timeout > 0 {
            Duration::minutes(timeout)
        } else {
            warn!("🪛️ STORE_PENDING_ORDER_TIMEOUT must be positive. Using {DEFAULT_PENDING_ORDER_TIMEOUT_MINS} minutes");
            Duration::minutes(DEFAULT_PENDING_ORDER_TIMEOUT_MINS)
        };
        let interval = env_or_default("STORE_EXPIRY_CHECK_INTERVAL", DEFAULT_EXPIRY_CHECK_INTERVAL_SECS).max(1);
        let expiry_check_interval = StdDuration::from_secs(interval);
        let low_stock_threshold = env_or_default("STORE_LOW_STOCK_THRESHOLD", DEFAULT_LOW_STOCK_THRESHOLD);
        let cashfree = CashfreeConfig::new_from_env_or_default();
        let merchant_vpa = optional_env("STORE_MERCHANT_VPA");
        if merchant_vpa.is_none() {
            info!("🪛️ STORE_MERCHANT_VPA is not set. The local UPI QR fallback is disabled.");
        }
        let merchant_name = env_or_default("STORE_MERCHANT_NAME", CheckoutOptions::default().merchant_name);
        let checkout = CheckoutOptions { merchant_vpa, merchant_name };
        Self {
            host,
            port,
            database_url,
            auth,
            use_x_forwarded_for,
            use_forwarded,
            pending_order_timeout,
            expiry_check_interval,
            low_stock_threshold,
            cashfree,
            checkout,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: Secret<String>,
    pub token_lifetime: Duration,
}

impl Default for AuthConfig {
    /// A random secret. Tokens signed with it die with the process.
    fn default() -> Self {
        let secret = thread_rng().sample_iter(&Alphanumeric).take(48).map(char::from).collect::<String>();
        Self { jwt_secret: Secret::new(secret), token_lifetime: DEFAULT_TOKEN_LIFETIME }
    }
}

impl AuthConfig {
    pub fn from_env_or_default() -> Self {
        match optional_env("STORE_JWT_SECRET") {
            Some(secret) => {
                if secret.len() < 32 {
                    warn!("🪛️ STORE_JWT_SECRET is shorter than 32 characters. Consider using a longer secret.");
                }
                Self { jwt_secret: Secret::new(secret), token_lifetime: DEFAULT_TOKEN_LIFETIME }
            },
            None => {
                warn!(
                    "🪛️ STORE_JWT_SECRET is not set. Using a random secret, so access tokens will not survive a \
                     restart."
                );
                Self::default()
            },
        }
    }
}

#[cfg(test)]
mod test {
    use std::env;

    use super::*;

    #[test]
    fn configuration_from_env() {
        env::set_var("STORE_PORT", "9100");
        env::set_var("STORE_PENDING_ORDER_TIMEOUT", "-3");
        env::set_var("STORE_USE_X_FORWARDED_FOR", "true");
        env::set_var("STORE_MERCHANT_VPA", "shop@upi");
        env::set_var("STORE_JWT_SECRET", "0123456789abcdef0123456789abcdef");
        let config = ServerConfig::from_env_or_default();
        assert_eq!(config.port, 9100);
        assert_eq!(config.pending_order_timeout, Duration::minutes(60));
        assert!(config.use_x_forwarded_for);
        assert!(!config.use_forwarded);
        assert_eq!(config.checkout.merchant_vpa.as_deref(), Some("shop@upi"));
        assert_eq!(config.auth.jwt_secret.reveal(), "0123456789abcdef0123456789abcdef");
        assert!(!format!("{config:?}").contains("0123456789abcdef"));
    }

    #[test]
    fn random_secrets_differ() {
        assert_ne!(AuthConfig::default().jwt_secret, AuthConfig::default().jwt_secret);
    }
}
