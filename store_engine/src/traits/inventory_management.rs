use thiserror::Error;

use crate::db_types::{Money, NewProduct, Product};

/// The inventory ledger. It owns the per-product stock count.
///
/// Implementations must guarantee that `stock` never drops below zero, and that two concurrent reservations of the
/// same product can never both succeed against a stale stock value.
#[allow(async_fn_in_trait)]
pub trait InventoryManagement: Clone {
    /// Adds a product (and its images) to the catalog. Catalog management lives outside the engine; this exists so
    /// that deployments and tests can seed products.
    async fn insert_product(&self, product: NewProduct) -> Result<Product, InventoryError>;

    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, InventoryError>;

    /// Takes `quantity` units out of stock and returns the new stock level.
    ///
    /// Fails with [`InventoryError::InsufficientStock`] if fewer than `quantity` units are available. In that case the
    /// stock level is untouched.
    async fn reserve(&self, product_id: i64, quantity: i64) -> Result<i64, InventoryError>;

    /// Returns `quantity` units to stock and returns the new stock level.
    async fn release(&self, product_id: i64, quantity: i64) -> Result<i64, InventoryError>;
}

#[derive(Debug, Clone, Error)]
pub enum InventoryError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("Product {0} does not exist")]
    ProductNotFound(i64),
    #[error("Quantity must be positive, but was {0}")]
    InvalidQuantity(i64),
    #[error("Insufficient stock for product {product_id}. Requested {requested}, but only {available} available")]
    InsufficientStock { product_id: i64, requested: i64, available: i64 },
    #[error("{stock} units at {price} each cannot be represented as a currency amount")]
    ValueOverflow { price: Money, stock: i64 },
}

impl From<sqlx::Error> for InventoryError {
    fn from(e: sqlx::Error) -> Self {
        InventoryError::DatabaseError(e.to_string())
    }
}
