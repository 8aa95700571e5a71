mod images;
mod upi;
mod webhook_signature;

pub use images::{resolve_image, PLACEHOLDER_IMAGE};
pub use upi::{upi_deep_link, upi_qr_data_uri};
pub use webhook_signature::{sign_webhook_payload, verify_webhook_signature, WebhookSignatureError};
