use log::*;
use sqlx::SqliteConnection;

use super::products::IMAGE_URL_SUBQUERY;
use crate::{
    db_types::{Cart, CartItem},
    traits::CartLine,
};

/// Touches the customer's cart row and returns its id.
///
/// This is a write, so when it is the first statement of a transaction it takes the database write lock and
/// serialises the transaction against every other cart or order mutation.
pub async fn lock_cart(user_id: i64, conn: &mut SqliteConnection) -> Result<Option<i64>, sqlx::Error> {
    let id = sqlx::query_scalar("UPDATE carts SET updated_at = CURRENT_TIMESTAMP WHERE user_id = $1 RETURNING id")
        .bind(user_id)
        .fetch_optional(conn)
        .await?;
    Ok(id)
}

pub async fn create_cart(user_id: i64, conn: &mut SqliteConnection) -> Result<Cart, sqlx::Error> {
    let cart: Cart =
        sqlx::query_as("INSERT INTO carts (user_id) VALUES ($1) RETURNING *").bind(user_id).fetch_one(conn).await?;
    trace!("🗃️ Cart {} created for customer {user_id}", cart.id);
    Ok(cart)
}

pub async fn fetch_item(
    cart_id: i64,
    product_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<CartItem>, sqlx::Error> {
    let item = sqlx::query_as("SELECT * FROM cart_items WHERE cart_id = $1 AND product_id = $2")
        .bind(cart_id)
        .bind(product_id)
        .fetch_optional(conn)
        .await?;
    Ok(item)
}

/// Adds `quantity` to the cart line for the product, creating the line if necessary.
pub async fn upsert_item(
    cart_id: i64,
    product_id: i64,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<CartItem, sqlx::Error> {
    let item = sqlx::query_as(
        r#"
        INSERT INTO cart_items (cart_id, product_id, quantity) VALUES ($1, $2, $3)
        ON CONFLICT (cart_id, product_id) DO UPDATE SET quantity = quantity + excluded.quantity
        RETURNING *
        "#,
    )
    .bind(cart_id)
    .bind(product_id)
    .bind(quantity)
    .fetch_one(conn)
    .await?;
    Ok(item)
}

pub async fn set_item_quantity(
    item_id: i64,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<CartItem, sqlx::Error> {
    let item = sqlx::query_as("UPDATE cart_items SET quantity = $1 WHERE id = $2 RETURNING *")
        .bind(quantity)
        .bind(item_id)
        .fetch_one(conn)
        .await?;
    Ok(item)
}

pub async fn delete_item(item_id: i64, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM cart_items WHERE id = $1").bind(item_id).execute(conn).await?;
    Ok(())
}

/// Deletes every line in the customer's cart. Stock is NOT touched.
pub async fn clear_cart(user_id: i64, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM cart_items WHERE cart_id IN (SELECT id FROM carts WHERE user_id = $1)")
        .bind(user_id)
        .execute(conn)
        .await?;
    trace!("🗃️ Cleared {} lines from the cart of customer {user_id}", result.rows_affected());
    Ok(result.rows_affected())
}

pub async fn fetch_cart_lines(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<CartLine>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT ci.product_id, p.name AS product_name, p.price, ci.quantity, {IMAGE_URL_SUBQUERY} AS image_url
        FROM cart_items ci
        JOIN carts c ON c.id = ci.cart_id
        JOIN products p ON p.id = ci.product_id
        WHERE c.user_id = $1
        ORDER BY ci.id ASC
        "#
    );
    let lines = sqlx::query_as(&sql).bind(user_id).fetch_all(conn).await?;
    Ok(lines)
}
