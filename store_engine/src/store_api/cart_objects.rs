use serde::{Deserialize, Serialize};

use crate::{db_types::Money, helpers::resolve_image, traits::CartLine};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineView {
    pub product_id: i64,
    pub product_name: String,
    /// The product's current price. This is not frozen until checkout.
    pub price: Money,
    pub quantity: i64,
    pub line_total: Money,
    pub image: String,
}

impl From<CartLine> for CartLineView {
    fn from(line: CartLine) -> Self {
        let line_total = line.line_total();
        Self {
            product_id: line.product_id,
            product_name: line.product_name,
            price: line.price,
            quantity: line.quantity,
            line_total,
            image: resolve_image(line.image_url),
        }
    }
}

/// A customer's cart, priced at current product prices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSnapshot {
    pub user_id: i64,
    pub items: Vec<CartLineView>,
    pub total: Money,
}

impl CartSnapshot {
    pub fn new(user_id: i64, lines: Vec<CartLine>) -> Self {
        let items = lines.into_iter().map(CartLineView::from).collect::<Vec<_>>();
        let total = items.iter().map(|i| i.line_total).sum();
        Self { user_id, items, total }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}
