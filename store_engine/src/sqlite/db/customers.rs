use sqlx::SqliteConnection;

use crate::{
    db_types::{Customer, NewCustomer},
    traits::CustomerError,
};

pub async fn insert_customer(customer: NewCustomer, conn: &mut SqliteConnection) -> Result<Customer, CustomerError> {
    let NewCustomer { name, email, phone, role } = customer;
    sqlx::query_as("INSERT INTO customers (name, email, phone, role) VALUES ($1, $2, $3, $4) RETURNING *")
        .bind(name)
        .bind(email.clone())
        .bind(phone)
        .bind(role)
        .fetch_one(conn)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(de) if de.is_unique_violation() => CustomerError::EmailAlreadyRegistered(email),
            e => CustomerError::from(e),
        })
}

pub async fn fetch_customer(customer_id: i64, conn: &mut SqliteConnection) -> Result<Option<Customer>, sqlx::Error> {
    let customer =
        sqlx::query_as("SELECT * FROM customers WHERE id = $1").bind(customer_id).fetch_optional(conn).await?;
    Ok(customer)
}
