use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use store_engine::{
    events::EventProducers,
    traits::PaymentGateway,
    CartApi,
    CheckoutApi,
    OrderFlowApi,
    SqliteDatabase,
    WebhookReconciler,
};

use crate::{
    auth::TokenValidator,
    config::ServerConfig,
    errors::ServerError,
    expiry_worker::start_expiry_worker,
    integrations::cashfree::CashfreeGateway,
    middleware::JwtMiddlewareFactory,
    notifications::create_notification_handlers,
    routes::{
        health,
        AddToCartRoute,
        AllOrdersRoute,
        CancelOrderRoute,
        CashfreeWebhookRoute,
        CheckoutRoute,
        MyCartRoute,
        MyOrdersRoute,
        OrderByIdRoute,
        OrderStatusRoute,
        OrdersForUserRoute,
        PaymentSessionRoute,
        PaymentsForOrderRoute,
        RemoveFromCartRoute,
        UpdateCartItemRoute,
        UpdateOrderStatusRoute,
    },
};

const MAX_DB_CONNECTIONS: u32 = 25;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, MAX_DB_CONNECTIONS)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let gateway = CashfreeGateway::new(config.cashfree.clone())?;
    if config.cashfree.is_sandbox() {
        info!("🚀️ Using the Cashfree sandbox at {}", config.cashfree.base_url);
    }
    let handlers = create_notification_handlers();
    let producers = handlers.producers();
    // The hook workers and the expiry worker run for the lifetime of the process
    let _hooks = handlers.start_handlers();
    let _expiry =
        start_expiry_worker(db.clone(), producers.clone(), config.pending_order_timeout, config.expiry_check_interval);
    let srv = create_server_instance(config, db, gateway, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance<G>(
    config: ServerConfig,
    db: SqliteDatabase,
    gateway: G,
    producers: EventProducers,
) -> Result<Server, ServerError>
where
    G: PaymentGateway + Send + 'static,
{
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let cart_api =
            CartApi::new(db.clone(), producers.clone()).with_low_stock_threshold(config.low_stock_threshold);
        let orders_api = OrderFlowApi::new(db.clone(), producers.clone());
        let checkout_api = CheckoutApi::new(db.clone(), gateway.clone(), config.checkout.clone());
        let webhook_api = WebhookReconciler::new(orders_api.clone(), gateway.clone());
        let validator = TokenValidator::new(&config.auth);
        let user_scope = web::scope("/user")
            .service(MyCartRoute::<SqliteDatabase>::new())
            .service(AddToCartRoute::<SqliteDatabase>::new())
            .service(UpdateCartItemRoute::<SqliteDatabase>::new())
            .service(RemoveFromCartRoute::<SqliteDatabase>::new())
            .service(CheckoutRoute::<SqliteDatabase>::new())
            .service(PaymentSessionRoute::<SqliteDatabase, G>::new())
            .service(OrderStatusRoute::<SqliteDatabase>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(CancelOrderRoute::<SqliteDatabase>::new());
        let admin_scope = web::scope("/admin")
            .service(AllOrdersRoute::<SqliteDatabase>::new())
            .service(OrdersForUserRoute::<SqliteDatabase>::new())
            .service(UpdateOrderStatusRoute::<SqliteDatabase>::new())
            .service(PaymentsForOrderRoute::<SqliteDatabase>::new());
        // Routes that require authentication
        let api_scope =
            web::scope("/api").wrap(JwtMiddlewareFactory::new(validator)).service(user_scope).service(admin_scope);
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("store::access_log"))
            .app_data(web::Data::new(config.clone()))
            .app_data(web::Data::new(cart_api))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(checkout_api))
            .app_data(web::Data::new(webhook_api))
            .service(health)
            .service(CashfreeWebhookRoute::<SqliteDatabase, G>::new())
            .service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    info!("🚀️ Listening on {host}:{port}");
    Ok(srv)
}
