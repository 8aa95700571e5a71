/// Served for products that have no image on record.
pub const PLACEHOLDER_IMAGE: &str = "/images/placeholder.png";

/// Picks the image reference to show for a product line.
pub fn resolve_image(image_url: Option<String>) -> String {
    image_url.filter(|url| !url.trim().is_empty()).unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string())
}
