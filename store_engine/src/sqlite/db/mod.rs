//! # SQLite Database methods
//!
//! This module contains "low-level" SQLite database interactions.
//!
//! All these interaction are maintained by simple functions (rather than stateful structs) that accept a
//! `&mut SqliteConnection` argument. Callers can obtain a connection from a pool,
//! or create an atomic transaction as the need arises and call through to the functions without any other changes.
//!
//! SQLite has a single writer. Every mutating transaction in this crate therefore starts with a write against the
//! row it guards (see [`carts::lock_cart`] and [`orders::lock_order`]). That acquires the write lock up front and
//! avoids read-to-write lock upgrades, which SQLite cannot wait on.
use std::{env, str::FromStr};

use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Error as SqlxError,
    SqlitePool,
};

pub mod carts;
pub mod customers;
pub mod orders;
pub mod payments;
pub mod products;

const SQLITE_DB_URL: &str = "sqlite://data/store.db";

pub fn db_url() -> String {
    let result = env::var("STORE_DATABASE_URL").unwrap_or_else(|_| {
        info!("🗃️ STORE_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("🗃️ Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(std::time::Duration::from_secs(10));
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}
