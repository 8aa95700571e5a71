use serde::{Deserialize, Serialize};

use crate::db_types::Money;

/// The thing a customer uses to pay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PayableArtifact {
    /// A QR code (image URL or data URI) supplied by the gateway.
    QrArtifact(String),
    PaymentLink(String),
    /// The gateway session id, for clients that drive the gateway's own checkout widget.
    SessionId(String),
    /// Generated locally from the merchant's virtual payment address.
    #[serde(rename_all = "camelCase")]
    UpiQr { upi_link: String, qr_artifact: String },
}

impl PayableArtifact {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::QrArtifact(_) => "gateway QR code",
            Self::PaymentLink(_) => "payment link",
            Self::SessionId(_) => "session id",
            Self::UpiQr { .. } => "local UPI QR code",
        }
    }
}

/// Response to a payment session request. The artifact is flattened into the object, e.g.
/// `{"orderId": "ORD_12", "amount": "450.00", "paymentLink": "https://..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSessionResponse {
    /// The order id as the gateway knows it.
    pub order_id: String,
    pub amount: Money,
    #[serde(flatten)]
    pub artifact: PayableArtifact,
}
