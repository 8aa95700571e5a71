//! # Webhook signatures
//!
//! The payment gateway signs every webhook delivery with its shared secret. The signed message is
//!
//! ```text
//!    {timestamp}.{raw body}
//! ```
//!
//! where `timestamp` is the value of the `x-webhook-timestamp` header, verbatim. The signature is the Base64 encoding
//! of `HMAC-SHA256(secret, message)` and arrives in the `x-webhook-signature` header.
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Error)]
#[error("Cannot sign webhook payload: {0}")]
pub struct WebhookSignatureError(String);

fn keyed_mac(secret: &str, timestamp: &str, payload: &[u8]) -> Result<HmacSha256, WebhookSignatureError> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|e| WebhookSignatureError(e.to_string()))?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac)
}

/// Produces the signature the gateway would send for this payload.
pub fn sign_webhook_payload(secret: &str, timestamp: &str, payload: &[u8]) -> Result<String, WebhookSignatureError> {
    let mac = keyed_mac(secret, timestamp, payload)?;
    Ok(base64::encode(mac.finalize().into_bytes()))
}

/// Checks `signature` against the payload in constant time. Anything that is not valid Base64 fails verification.
pub fn verify_webhook_signature(secret: &str, timestamp: &str, payload: &[u8], signature: &str) -> bool {
    let Ok(expected) = base64::decode(signature.trim()) else {
        return false;
    };
    match keyed_mac(secret, timestamp, payload) {
        Ok(mac) => mac.verify_slice(&expected).is_ok(),
        Err(_) => false,
    }
}
