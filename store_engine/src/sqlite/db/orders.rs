use log::*;
use sqlx::{QueryBuilder, SqliteConnection};

use super::products::IMAGE_URL_SUBQUERY;
use crate::{
    db_types::{Money, Order, OrderId, OrderItem, OrderStatusType, StockHolder},
    order_objects::OrderQueryFilter,
    traits::OrderItemDetail,
};

pub async fn insert_order(
    user_id: i64,
    total: Money,
    shipping_address: Option<String>,
    conn: &mut SqliteConnection,
) -> Result<Order, sqlx::Error> {
    let order: Order =
        sqlx::query_as("INSERT INTO orders (user_id, total, shipping_address) VALUES ($1, $2, $3) RETURNING *")
            .bind(user_id)
            .bind(total)
            .bind(shipping_address)
            .fetch_one(conn)
            .await?;
    trace!("🗃️ Order {} inserted for customer {user_id}. Total: {total}", order.id);
    Ok(order)
}

pub async fn insert_order_item(
    order_id: OrderId,
    product_id: i64,
    quantity: i64,
    price_at_purchase: Money,
    conn: &mut SqliteConnection,
) -> Result<OrderItem, sqlx::Error> {
    let item = sqlx::query_as(
        r#"
        INSERT INTO order_items (order_id, product_id, quantity, price_at_purchase)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(order_id)
    .bind(product_id)
    .bind(quantity)
    .bind(price_at_purchase)
    .fetch_one(conn)
    .await?;
    Ok(item)
}

pub async fn fetch_order(order_id: OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(order_id).fetch_optional(conn).await?;
    Ok(order)
}

/// Touches the order row and returns the order as it currently stands.
///
/// Run it as the first statement of a transaction to hold the write lock for the rest of the transaction. This is the
/// per-order lock that guards status transitions.
pub async fn lock_order(order_id: OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("UPDATE orders SET updated_at = CURRENT_TIMESTAMP WHERE id = $1 RETURNING *")
        .bind(order_id)
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

pub async fn fetch_order_items(order_id: OrderId, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    let items = sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(items)
}

pub async fn fetch_order_item_details(
    order_id: OrderId,
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderItemDetail>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT oi.product_id, p.name AS product_name, oi.quantity, oi.price_at_purchase,
            {IMAGE_URL_SUBQUERY} AS image_url
        FROM order_items oi
        JOIN products p ON p.id = oi.product_id
        WHERE oi.order_id = $1
        ORDER BY oi.id ASC
        "#
    );
    let items = sqlx::query_as(&sql).bind(order_id).fetch_all(conn).await?;
    Ok(items)
}

pub async fn fetch_orders_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as("SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

pub async fn search_orders(query: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM orders ");
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(user_id) = query.user_id {
        where_clause.push("user_id = ");
        where_clause.push_bind_unseparated(user_id);
    }
    if let Some(statuses) = query.status.filter(|s| !s.is_empty()) {
        // Statuses come from a closed enum, so they are safe to inline
        let list = statuses.iter().map(|s| format!("'{s}'")).collect::<Vec<String>>().join(",");
        where_clause.push(format!("status IN ({list})"));
    }
    if let Some(since) = query.since {
        where_clause.push("unixepoch(created_at) >= ");
        where_clause.push_bind_unseparated(since.timestamp());
    }
    if let Some(until) = query.until {
        where_clause.push("unixepoch(created_at) <= ");
        where_clause.push_bind_unseparated(until.timestamp());
    }
    builder.push(" ORDER BY created_at DESC, id DESC");
    trace!("🗃️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("🗃️ Result of search_orders: {} orders", orders.len());
    Ok(orders)
}

/// Sets the status of the order, without any guard. Callers must hold the order lock and have validated the
/// transition.
pub async fn update_status(
    order_id: OrderId,
    status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Order, sqlx::Error> {
    let order = sqlx::query_as("UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *")
        .bind(status)
        .bind(order_id)
        .fetch_one(conn)
        .await?;
    Ok(order)
}

/// `Pending` -> `Paid`, recording the transaction reference. Returns `None` (and changes nothing) unless the order is
/// currently `Pending`.
pub async fn mark_paid(
    order_id: OrderId,
    transaction_ref: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        r#"
        UPDATE orders SET status = 'PAID', transaction_id = $1, updated_at = CURRENT_TIMESTAMP
        WHERE id = $2 AND status = 'PENDING'
        RETURNING *
        "#,
    )
    .bind(transaction_ref)
    .bind(order_id)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

pub async fn set_stock_holder(
    order_id: OrderId,
    holder: StockHolder,
    conn: &mut SqliteConnection,
) -> Result<Order, sqlx::Error> {
    let order = sqlx::query_as("UPDATE orders SET stock_holder = $1 WHERE id = $2 RETURNING *")
        .bind(holder)
        .bind(order_id)
        .fetch_one(conn)
        .await?;
    trace!("🗃️ Stock for order {order_id} is now held by {holder}");
    Ok(order)
}

/// Hands the cart's reservation back to the cart alone. Orders that still claim it (failed orders, typically) no
/// longer hold any stock afterwards.
pub async fn drop_cart_claims(user_id: i64, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE orders SET stock_holder = 'RELEASED' WHERE user_id = $1 AND stock_holder = 'CART'")
        .bind(user_id)
        .execute(conn)
        .await?;
    let count = result.rows_affected();
    if count > 0 {
        debug!("🗃️ {count} orders of customer {user_id} no longer claim the cart's stock");
    }
    Ok(count)
}

/// Cancels every `Pending` order of the customer, without touching stock. The cart keeps the reservation.
pub async fn supersede_pending_orders(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders: Vec<Order> = sqlx::query_as(
        r#"
        UPDATE orders SET status = 'CANCELLED', stock_holder = 'RELEASED', updated_at = CURRENT_TIMESTAMP
        WHERE user_id = $1 AND status = 'PENDING'
        RETURNING *
        "#,
    )
    .bind(user_id)
    .fetch_all(conn)
    .await?;
    if !orders.is_empty() {
        debug!("🗃️ {} pending orders of customer {user_id} were superseded", orders.len());
    }
    Ok(orders)
}

pub async fn fetch_stale_pending_orders(
    older_than_secs: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as(
        r#"
        SELECT * FROM orders
        WHERE status = 'PENDING' AND unixepoch(created_at) <= unixepoch('now') - $1
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(older_than_secs)
    .fetch_all(conn)
    .await?;
    Ok(orders)
}
