use std::{collections::HashMap, fmt::Debug};

use cucumber::World;
use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};
use store_engine::{
    db_types::OrderId,
    events::EventProducers,
    test_utils::{
        fake_gateway::FakeGateway,
        prepare_env::{create_database, random_db_path, run_migrations},
    },
    CartApi,
    OrderFlowApi,
    SqliteDatabase,
    WebhookOutcome,
    WebhookReconciler,
};

pub const WEBHOOK_SECRET: &str = "whsec_cucumber";

#[derive(Default, Debug, World)]
pub struct StoreWorld {
    pub system: Option<StoreSystem>,
}

pub struct StoreSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub carts: CartApi<SqliteDatabase>,
    pub orders: OrderFlowApi<SqliteDatabase>,
    pub webhooks: WebhookReconciler<SqliteDatabase, FakeGateway>,
    pub gateway: FakeGateway,
    /// Customer ids by name
    pub customers: HashMap<String, i64>,
    /// Product ids by name
    pub products: HashMap<String, i64>,
    /// The most recent checkout of each customer
    pub last_orders: HashMap<String, OrderId>,
    /// The last webhook body that was delivered, with its signature
    pub last_webhook: Option<(Vec<u8>, String)>,
    pub last_outcome: Option<WebhookOutcome>,
}

impl Debug for StoreSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StoreSystem ({})", self.db_path)
    }
}

impl StoreWorld {
    pub fn sys(&self) -> &StoreSystem {
        self.system.as_ref().expect("The store has not been set up")
    }

    pub fn sys_mut(&mut self) -> &mut StoreSystem {
        self.system.as_mut().expect("The store has not been set up")
    }
}

impl StoreSystem {
    /// Closes the pool and deletes the scenario's database file.
    pub async fn dispose(self) {
        let StoreSystem { mut db, db_path, .. } = self;
        if let Err(e) = db.close().await {
            error!("🚀️ Failed to close database {db_path}: {e}");
        }
        match Sqlite::drop_database(&db_path).await {
            Ok(()) => debug!("🚀️ Removed scenario database {db_path}"),
            Err(e) => error!("🚀️ Failed to remove database {db_path}: {e}"),
        }
    }

    pub async fn new() -> Self {
        let url = prepare_test_env().await;
        let db = SqliteDatabase::new_with_url(&url, 1).await.expect("Error creating connection to database");
        debug!("Created database: {url}");
        let gateway = FakeGateway::new(WEBHOOK_SECRET);
        let carts = CartApi::new(db.clone(), EventProducers::default());
        let orders = OrderFlowApi::new(db.clone(), EventProducers::default());
        let webhooks = WebhookReconciler::new(orders.clone(), gateway.clone());
        Self {
            db_path: url,
            db,
            carts,
            orders,
            webhooks,
            gateway,
            customers: HashMap::new(),
            products: HashMap::new(),
            last_orders: HashMap::new(),
            last_webhook: None,
            last_outcome: None,
        }
    }

    pub fn customer(&self, name: &str) -> i64 {
        *self.customers.get(name).unwrap_or_else(|| panic!("No customer called {name}"))
    }

    pub fn product(&self, name: &str) -> i64 {
        *self.products.get(name).unwrap_or_else(|| panic!("No product called {name}"))
    }

    pub fn last_order(&self, name: &str) -> OrderId {
        *self.last_orders.get(name).unwrap_or_else(|| panic!("{name} has not checked out"))
    }
}

pub async fn prepare_test_env() -> String {
    let path = random_db_path();
    create_database(&path).await;
    run_migrations(&path).await;
    path
}
