use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use store_common::Money;
use store_engine::{
    db_types::{OrderStatusType, Role},
    traits::{GatewayError, PaymentSession},
    CheckoutApi,
    CheckoutOptions,
    SqliteDatabase,
};

use super::{
    helpers::{authorized, issue_token, json, send_request, TestBackend},
    mocks::MockGateway,
};
use crate::routes::{
    AllOrdersRoute,
    CancelOrderRoute,
    CheckoutRoute,
    MyOrdersRoute,
    OrderByIdRoute,
    OrderStatusRoute,
    OrdersForUserRoute,
    PaymentSessionRoute,
    PaymentsForOrderRoute,
    UpdateOrderStatusRoute,
};

fn order_routes(backend: &TestBackend, gateway: MockGateway) -> impl FnOnce(&mut ServiceConfig) + 'static {
    let orders = web::Data::new(backend.orders.clone());
    let checkout = web::Data::new(CheckoutApi::new(backend.db.clone(), gateway, CheckoutOptions::default()));
    move |cfg: &mut ServiceConfig| {
        cfg.app_data(orders)
            .app_data(checkout)
            .service(
                web::scope("/user")
                    .service(CheckoutRoute::<SqliteDatabase>::new())
                    .service(PaymentSessionRoute::<SqliteDatabase, MockGateway>::new())
                    .service(OrderStatusRoute::<SqliteDatabase>::new())
                    .service(MyOrdersRoute::<SqliteDatabase>::new())
                    .service(OrderByIdRoute::<SqliteDatabase>::new())
                    .service(CancelOrderRoute::<SqliteDatabase>::new()),
            )
            .service(
                web::scope("/admin")
                    .service(AllOrdersRoute::<SqliteDatabase>::new())
                    .service(OrdersForUserRoute::<SqliteDatabase>::new())
                    .service(UpdateOrderStatusRoute::<SqliteDatabase>::new())
                    .service(PaymentsForOrderRoute::<SqliteDatabase>::new()),
            );
    }
}

fn idle_gateway() -> MockGateway {
    let mut gateway = MockGateway::new();
    gateway.expect_create_session().never();
    gateway
}

#[actix_web::test]
async fn checkout_returns_the_order_and_its_amount() {
    let backend = TestBackend::new().await;
    let asha = backend.customer("Asha").await;
    let tea = backend.product("Tea", 250, 10).await;
    let token = issue_token(asha.id, Role::User);

    let req = authorized(TestRequest::post().uri("/api/user/checkout"), &token);
    let (status, body) = send_request(req, order_routes(&backend, idle_gateway())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "An empty cart cannot be checked out. {body}");

    backend.carts.add_item(asha.id, tea.id, 3).await.unwrap();
    let req = authorized(TestRequest::post().uri("/api/user/checkout"), &token)
        .set_json(serde_json::json!({"shippingAddress": "12 MG Road, Pune"}));
    let (status, body) = send_request(req, order_routes(&backend, idle_gateway())).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let summary = json(&body);
    assert_eq!(summary["amount"], "7.50");
    let order_id = summary["orderId"].as_i64().expect("orderId is a number");

    let req = authorized(TestRequest::get().uri(&format!("/api/user/order_status/{order_id}")), &token);
    let (status, body) = send_request(req, order_routes(&backend, idle_gateway())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body), serde_json::json!({"status": "PENDING", "transactionId": ""}));

    let req = authorized(TestRequest::get().uri(&format!("/api/user/orders/{order_id}")), &token);
    let (status, body) = send_request(req, order_routes(&backend, idle_gateway())).await;
    assert_eq!(status, StatusCode::OK);
    let order = json(&body);
    assert_eq!(order["shippingAddress"], "12 MG Road, Pune");
    assert_eq!(order["items"][0]["quantity"], 3);
    assert_eq!(order["items"][0]["priceAtPurchase"], "2.50");
    backend.tear_down().await;
}

#[actix_web::test]
async fn payment_sessions_come_from_the_gateway() {
    let backend = TestBackend::new().await;
    let asha = backend.customer("Asha").await;
    let tea = backend.product("Tea", 250, 10).await;
    backend.carts.add_item(asha.id, tea.id, 2).await.unwrap();
    let summary = backend.orders.create_pending_order(asha.id, None).await.unwrap();
    let token = issue_token(asha.id, Role::User);

    let mut gateway = MockGateway::new();
    let order_id = summary.order_id;
    gateway
        .expect_create_session()
        .withf(move |req| req.order_id == order_id && req.amount == Money::from_minor_units(500))
        .times(1)
        .returning(|_| {
            Ok(PaymentSession {
                session_id: Some("session_123".into()),
                qr_artifact: None,
                payment_link: Some("https://pay.example/ORD".into()),
            })
        });
    let req = authorized(TestRequest::post().uri("/api/user/payment_session"), &token)
        .set_json(serde_json::json!({"orderId": order_id.value()}));
    let (status, body) = send_request(req, order_routes(&backend, gateway)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let session = json(&body);
    assert_eq!(session["orderId"], order_id.gateway_order_id());
    assert_eq!(session["amount"], "5.00");
    assert_eq!(session["paymentLink"], "https://pay.example/ORD");
    assert!(session.get("sessionId").is_none());
    backend.tear_down().await;
}

#[actix_web::test]
async fn payment_session_failures() {
    let backend = TestBackend::new().await;
    let asha = backend.customer("Asha").await;
    let ravi = backend.customer("Ravi").await;
    let tea = backend.product("Tea", 250, 10).await;
    backend.carts.add_item(asha.id, tea.id, 2).await.unwrap();
    let summary = backend.orders.create_pending_order(asha.id, None).await.unwrap();
    let body = serde_json::json!({"orderId": summary.order_id.value()});

    // Someone else's order
    let token = issue_token(ravi.id, Role::User);
    let req = authorized(TestRequest::post().uri("/api/user/payment_session"), &token).set_json(&body);
    let (status, _) = send_request(req, order_routes(&backend, idle_gateway())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The gateway is slow
    let token = issue_token(asha.id, Role::User);
    let mut gateway = MockGateway::new();
    gateway.expect_create_session().times(1).returning(|_| Err(GatewayError::Timeout));
    let req = authorized(TestRequest::post().uri("/api/user/payment_session"), &token).set_json(&body);
    let (status, _) = send_request(req, order_routes(&backend, gateway)).await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    let order = backend.orders.order_by_id(summary.order_id).await.unwrap();
    assert_eq!(order.status, OrderStatusType::Pending);

    // The order is no longer payable
    backend.orders.cancel_order(summary.order_id, asha.id).await.unwrap();
    let req = authorized(TestRequest::post().uri("/api/user/payment_session"), &token).set_json(&body);
    let (status, _) = send_request(req, order_routes(&backend, idle_gateway())).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let req = authorized(TestRequest::post().uri("/api/user/payment_session"), &token)
        .set_json(serde_json::json!({"orderId": 4242}));
    let (status, _) = send_request(req, order_routes(&backend, idle_gateway())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    backend.tear_down().await;
}

#[actix_web::test]
async fn customers_only_see_their_own_orders() {
    let backend = TestBackend::new().await;
    let asha = backend.customer("Asha").await;
    let ravi = backend.customer("Ravi").await;
    let tea = backend.product("Tea", 250, 10).await;
    backend.carts.add_item(asha.id, tea.id, 1).await.unwrap();
    let summary = backend.orders.create_pending_order(asha.id, None).await.unwrap();
    let path = format!("/api/user/orders/{}", summary.order_id.value());

    let token = issue_token(ravi.id, Role::User);
    let (status, _) = send_request(authorized(TestRequest::get().uri(&path), &token), order_routes(&backend, idle_gateway())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let req = authorized(TestRequest::get().uri(&format!("/api/user/order_status/{}", summary.order_id.value())), &token);
    let (status, _) = send_request(req, order_routes(&backend, idle_gateway())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) =
        send_request(authorized(TestRequest::get().uri("/api/user/orders"), &token), order_routes(&backend, idle_gateway())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body), serde_json::json!([]));

    let admin = issue_token(999, Role::Admin);
    let (status, body) = send_request(authorized(TestRequest::get().uri(&path), &admin), order_routes(&backend, idle_gateway())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["userId"], asha.id);
    backend.tear_down().await;
}

#[actix_web::test]
async fn cancelling_returns_stock() {
    let backend = TestBackend::new().await;
    let asha = backend.customer("Asha").await;
    let tea = backend.product("Tea", 250, 10).await;
    backend.carts.add_item(asha.id, tea.id, 4).await.unwrap();
    let summary = backend.orders.create_pending_order(asha.id, None).await.unwrap();
    assert_eq!(backend.stock_of(tea.id).await, 6);
    let token = issue_token(asha.id, Role::User);
    let path = format!("/api/user/orders/{}/cancel", summary.order_id.value());

    for _ in 0..2 {
        let (status, body) =
            send_request(authorized(TestRequest::post().uri(&path), &token), order_routes(&backend, idle_gateway())).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(json(&body)["status"], "CANCELLED");
        assert_eq!(backend.stock_of(tea.id).await, 10);
    }
    backend.tear_down().await;
}

#[actix_web::test]
async fn admin_routes_need_the_admin_role() {
    let backend = TestBackend::new().await;
    let asha = backend.customer("Asha").await;
    let tea = backend.product("Tea", 250, 10).await;
    backend.carts.add_item(asha.id, tea.id, 2).await.unwrap();
    let summary = backend.orders.create_pending_order(asha.id, None).await.unwrap();
    let order_path = format!("/api/admin/orders/{}/status", summary.order_id.value());

    let user = issue_token(asha.id, Role::User);
    let (status, body) =
        send_request(authorized(TestRequest::get().uri("/api/admin/orders"), &user), order_routes(&backend, idle_gateway())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(json(&body)["error"].as_str().unwrap_or_default().starts_with("Insufficient Permissions"));

    let admin = issue_token(1, Role::Admin);
    let (status, body) =
        send_request(authorized(TestRequest::get().uri("/api/admin/orders"), &admin), order_routes(&backend, idle_gateway())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body).as_array().map(Vec::len), Some(1));
    let uri = format!("/api/admin/users/{}/orders", asha.id);
    let (status, body) = send_request(authorized(TestRequest::get().uri(&uri), &admin), order_routes(&backend, idle_gateway())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)[0]["id"], summary.order_id.value());

    let req = authorized(TestRequest::put().uri(&order_path), &admin).set_json(serde_json::json!({"status": "PAID"}));
    let (status, body) = send_request(req, order_routes(&backend, idle_gateway())).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body)["status"], "PAID");
    let (status, body) =
        send_request(authorized(TestRequest::get().uri("/api/admin/orders?status=PAID"), &admin), order_routes(&backend, idle_gateway()))
            .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body).as_array().map(Vec::len), Some(1));

    let req = authorized(TestRequest::put().uri(&order_path), &admin).set_json(serde_json::json!({"status": "CANCELLED"}));
    let (status, _) = send_request(req, order_routes(&backend, idle_gateway())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(backend.stock_of(tea.id).await, 10);
    let req = authorized(TestRequest::put().uri(&order_path), &admin).set_json(serde_json::json!({"status": "SHIPPED"}));
    let (status, _) = send_request(req, order_routes(&backend, idle_gateway())).await;
    assert_eq!(status, StatusCode::CONFLICT, "Cancelled orders stay cancelled");

    let uri = format!("/api/admin/orders/{}/payments", summary.order_id.value());
    let (status, body) = send_request(authorized(TestRequest::get().uri(&uri), &admin), order_routes(&backend, idle_gateway())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["payments"], serde_json::json!([]));
    backend.tear_down().await;
}

