#![allow(dead_code)]
use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};
use store_engine::{
    db_types::{Customer, Money, NewCustomer, NewProduct, Product},
    events::EventProducers,
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    traits::{CustomerManagement, InventoryManagement},
    CartApi,
    OrderFlowApi,
    SqliteDatabase,
};

pub struct TestStore {
    pub db: SqliteDatabase,
    pub carts: CartApi<SqliteDatabase>,
    pub orders: OrderFlowApi<SqliteDatabase>,
}

pub async fn setup() -> TestStore {
    setup_with_producers(EventProducers::default()).await
}

pub async fn setup_with_producers(producers: EventProducers) -> TestStore {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    let carts = CartApi::new(db.clone(), producers.clone());
    let orders = OrderFlowApi::new(db.clone(), producers);
    TestStore { db, carts, orders }
}

pub async fn tear_down(mut store: TestStore) {
    let url = store.db.url().to_string();
    drop(store.carts);
    drop(store.orders);
    if let Err(e) = store.db.close().await {
        error!("🚀️ Failed to close database: {e}");
    }
    Sqlite::drop_database(&url).await.expect("Could not remove the test database");
}

pub async fn customer(db: &SqliteDatabase, name: &str) -> Customer {
    let email = format!("{}@example.com", name.to_lowercase());
    let customer = NewCustomer::new(name.to_string(), email).with_phone("9876543210");
    db.register_customer(customer).await.expect("Error registering customer")
}

/// A product priced in minor units.
pub async fn product(db: &SqliteDatabase, name: &str, price: i64, stock: i64) -> Product {
    let product = NewProduct::new(name, Money::from_minor_units(price), stock);
    db.insert_product(product).await.expect("Error inserting product")
}

pub async fn stock_of(db: &SqliteDatabase, product_id: i64) -> i64 {
    db.fetch_product(product_id).await.expect("Error fetching product").expect("No such product").stock
}

pub async fn set_price(db: &SqliteDatabase, product_id: i64, price: i64) {
    sqlx::query("UPDATE products SET price = $1 WHERE id = $2")
        .bind(price)
        .bind(product_id)
        .execute(db.pool())
        .await
        .expect("Error changing price");
}

/// Backdates an order so that it looks abandoned.
pub async fn age_order(db: &SqliteDatabase, order_id: i64, minutes: i64) {
    sqlx::query("UPDATE orders SET created_at = datetime('now', $1) WHERE id = $2")
        .bind(format!("-{minutes} minutes"))
        .bind(order_id)
        .execute(db.pool())
        .await
        .expect("Error backdating order");
}
