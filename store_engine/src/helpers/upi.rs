//! Local UPI fallback. When the gateway hands back nothing payable, the customer can still pay by scanning a
//! `upi://pay` link addressed to the merchant's virtual payment address.
use qrcode::{render::svg, types::QrError, QrCode};
use store_common::CURRENCY_CODE;

use crate::db_types::{Money, OrderId};

pub fn upi_deep_link(vpa: &str, merchant_name: &str, amount: Money, order_id: OrderId) -> String {
    let note = format!("Order {}", order_id.value());
    format!(
        "upi://pay?pa={}&pn={}&am={amount}&cu={CURRENCY_CODE}&tr=ORD{}&tn={}",
        urlencoding::encode(vpa.trim()),
        urlencoding::encode(merchant_name),
        order_id.value(),
        urlencoding::encode(&note)
    )
}

/// Renders `link` as an SVG QR code, wrapped in a `data:` URI that a browser can use as an image source.
pub fn upi_qr_data_uri(link: &str) -> Result<String, QrError> {
    let code = QrCode::new(link.as_bytes())?;
    let image = code.render::<svg::Color>().min_dimensions(320, 320).quiet_zone(true).build();
    Ok(format!("data:image/svg+xml;base64,{}", base64::encode(image)))
}
