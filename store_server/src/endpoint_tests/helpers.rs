use actix_web::{
    body::MessageBody,
    http::StatusCode,
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use log::debug;
use store_common::{Money, Secret};
use store_engine::{
    db_types::{Customer, NewCustomer, NewProduct, Product, Role},
    events::EventProducers,
    test_utils::prepare_env::{drop_database, new_test_database},
    traits::{CustomerManagement, InventoryManagement},
    CartApi,
    OrderFlowApi,
    SqliteDatabase,
};

use crate::{
    auth::{TokenIssuer, TokenValidator},
    config::AuthConfig,
    middleware::JwtMiddlewareFactory,
};

// Test-only secret. DO NOT re-use it anywhere.
pub fn get_auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: Secret::new("endpoint-tests-secret-0123456789abcdef".to_string()),
        token_lifetime: chrono::Duration::hours(1),
    }
}

pub fn issue_token(user_id: i64, role: Role) -> String {
    TokenIssuer::new(&get_auth_config()).issue_token(user_id, role).expect("Failed to sign token")
}

/// A fresh database with the store APIs that don't need a gateway.
pub struct TestBackend {
    pub db: SqliteDatabase,
    pub carts: CartApi<SqliteDatabase>,
    pub orders: OrderFlowApi<SqliteDatabase>,
}

impl TestBackend {
    pub async fn new() -> Self {
        let db = new_test_database().await;
        let carts = CartApi::new(db.clone(), EventProducers::default());
        let orders = OrderFlowApi::new(db.clone(), EventProducers::default());
        Self { db, carts, orders }
    }

    pub async fn customer(&self, name: &str) -> Customer {
        let email = format!("{}@example.com", name.to_lowercase());
        let customer = NewCustomer::new(name.to_string(), email).with_phone("9876543210");
        self.db.register_customer(customer).await.expect("Error registering customer")
    }

    pub async fn product(&self, name: &str, price: i64, stock: i64) -> Product {
        let product = NewProduct::new(name, Money::from_minor_units(price), stock);
        self.db.insert_product(product).await.expect("Error inserting product")
    }

    pub async fn stock_of(&self, product_id: i64) -> i64 {
        self.db.fetch_product(product_id).await.expect("Error fetching product").expect("No such product").stock
    }

    pub async fn tear_down(mut self) {
        let url = self.db.url().to_string();
        drop(self.carts);
        drop(self.orders);
        let _ = self.db.close().await;
        drop_database(&url).await;
    }
}

/// Sends `req` to an app whose `/api` scope sits behind the JWT middleware, as it does in the server. Errors raised
/// by middleware are rendered the way the server would render them.
pub async fn send_request<F>(req: TestRequest, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) + 'static {
    let validator = TokenValidator::new(&get_auth_config());
    let app = App::new().service(web::scope("/api").wrap(JwtMiddlewareFactory::new(validator)).configure(configure));
    let service = test::init_service(app).await;
    debug!("Making request");
    match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => {
            let status = res.status();
            let body = test::read_body(res).await;
            (status, String::from_utf8_lossy(&body).into_owned())
        },
        Err(e) => {
            let res = e.error_response();
            let status = res.status();
            let body = res.into_body().try_into_bytes().unwrap_or_default();
            (status, String::from_utf8_lossy(&body).into_owned())
        },
    }
}

pub fn authorized(req: TestRequest, token: &str) -> TestRequest {
    req.insert_header(("Authorization", format!("Bearer {token}")))
}

pub fn json(body: &str) -> serde_json::Value {
    serde_json::from_str(body).unwrap_or_else(|e| panic!("Response is not JSON ({e}): {body}"))
}
