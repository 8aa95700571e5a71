use log::*;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewProduct, Product},
    traits::InventoryError,
};

/// SQL fragment resolving a product's representative image: the main image, else the first one added.
pub(crate) const IMAGE_URL_SUBQUERY: &str = "(SELECT pi.url FROM product_images pi WHERE pi.product_id = p.id \
                                             ORDER BY pi.is_main DESC, pi.id ASC LIMIT 1)";

pub async fn insert_product(product: NewProduct, conn: &mut SqliteConnection) -> Result<Product, InventoryError> {
    if product.stock < 0 {
        return Err(InventoryError::InvalidQuantity(product.stock));
    }
    // Bounds every cart line total, since a line can never hold more than the stock
    if product.price.checked_mul(product.stock).is_none() {
        return Err(InventoryError::ValueOverflow { price: product.price, stock: product.stock });
    }
    let NewProduct { name, price, stock, images } = product;
    let product: Product =
        sqlx::query_as("INSERT INTO products (name, price, stock) VALUES ($1, $2, $3) RETURNING *")
            .bind(name)
            .bind(price)
            .bind(stock)
            .fetch_one(&mut *conn)
            .await?;
    for image in images {
        sqlx::query("INSERT INTO product_images (product_id, url, is_main) VALUES ($1, $2, $3)")
            .bind(product.id)
            .bind(image.url)
            .bind(image.is_main)
            .execute(&mut *conn)
            .await?;
    }
    trace!("🗃️ Product {} ({}) inserted with {} units", product.id, product.name, product.stock);
    Ok(product)
}

pub async fn fetch_product(product_id: i64, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    let product = sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(product_id).fetch_optional(conn).await?;
    Ok(product)
}

pub async fn fetch_stock(product_id: i64, conn: &mut SqliteConnection) -> Result<Option<i64>, sqlx::Error> {
    let stock = sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_optional(conn)
        .await?;
    Ok(stock)
}

/// Decrements the product's stock by `quantity` in a single conditional statement, so the check and the decrement
/// cannot be separated by another writer. Returns the new stock level.
pub async fn reserve(product_id: i64, quantity: i64, conn: &mut SqliteConnection) -> Result<i64, InventoryError> {
    if quantity <= 0 {
        return Err(InventoryError::InvalidQuantity(quantity));
    }
    let stock: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE products SET stock = stock - $1, updated_at = CURRENT_TIMESTAMP
        WHERE id = $2 AND stock >= $1
        RETURNING stock
        "#,
    )
    .bind(quantity)
    .bind(product_id)
    .fetch_optional(&mut *conn)
    .await?;
    match stock {
        Some(stock) => {
            trace!("🗃️ Reserved {quantity} units of product {product_id}. {stock} left");
            Ok(stock)
        },
        None => match fetch_stock(product_id, conn).await? {
            Some(available) => {
                debug!("🗃️ Cannot reserve {quantity} units of product {product_id}. Only {available} in stock");
                Err(InventoryError::InsufficientStock { product_id, requested: quantity, available })
            },
            None => Err(InventoryError::ProductNotFound(product_id)),
        },
    }
}

/// Increments the product's stock by `quantity`. Returns the new stock level.
pub async fn release(product_id: i64, quantity: i64, conn: &mut SqliteConnection) -> Result<i64, InventoryError> {
    if quantity <= 0 {
        return Err(InventoryError::InvalidQuantity(quantity));
    }
    let stock: Option<i64> = sqlx::query_scalar(
        "UPDATE products SET stock = stock + $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING stock",
    )
    .bind(quantity)
    .bind(product_id)
    .fetch_optional(conn)
    .await?;
    let stock = stock.ok_or(InventoryError::ProductNotFound(product_id))?;
    trace!("🗃️ Released {quantity} units of product {product_id}. {stock} in stock");
    Ok(stock)
}
