use sqlx::SqliteConnection;
use store_common::CURRENCY_CODE;

use crate::db_types::{NewPayment, OrderId, Payment};

pub async fn insert_payment(payment: NewPayment, conn: &mut SqliteConnection) -> Result<Payment, sqlx::Error> {
    let NewPayment { order_id, gateway_payment_id, amount, status } = payment;
    let payment = sqlx::query_as(
        r#"
        INSERT INTO payments (order_id, gateway_payment_id, amount, currency, status)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(order_id)
    .bind(gateway_payment_id)
    .bind(amount)
    .bind(CURRENCY_CODE)
    .bind(status)
    .fetch_one(conn)
    .await?;
    Ok(payment)
}

pub async fn fetch_payments_for_order(
    order_id: OrderId,
    conn: &mut SqliteConnection,
) -> Result<Vec<Payment>, sqlx::Error> {
    let payments = sqlx::query_as("SELECT * FROM payments WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(payments)
}

/// The paid record carrying `gateway_payment_id` for the order, if there is one.
pub async fn fetch_paid_payment(
    order_id: OrderId,
    gateway_payment_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    let payment = sqlx::query_as(
        "SELECT * FROM payments WHERE order_id = $1 AND gateway_payment_id = $2 AND status = 'PAID' LIMIT 1",
    )
    .bind(order_id)
    .bind(gateway_payment_id)
    .fetch_optional(conn)
    .await?;
    Ok(payment)
}
