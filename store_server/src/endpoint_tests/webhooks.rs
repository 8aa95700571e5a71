use actix_web::{http::StatusCode, test, test::TestRequest, web, App};
use store_engine::{
    db_types::{OrderStatusType, Role},
    SqliteDatabase,
    WebhookReconciler,
};

use super::{
    helpers::{authorized, issue_token, TestBackend},
    mocks::{signature_checking_gateway, MockGateway},
};
use crate::{
    config::ServerConfig,
    routes::{CashfreeWebhookRoute, WEBHOOK_SIGNATURE_HEADER, WEBHOOK_TIMESTAMP_HEADER},
};

async fn deliver(backend: &TestBackend, body: &str, signature: &str) -> (StatusCode, String) {
    let reconciler = WebhookReconciler::new(backend.orders.clone(), signature_checking_gateway());
    let app = App::new()
        .app_data(web::Data::new(ServerConfig::default()))
        .app_data(web::Data::new(reconciler))
        .service(CashfreeWebhookRoute::<SqliteDatabase, MockGateway>::new());
    let service = test::init_service(app).await;
    let req = TestRequest::post()
        .uri("/webhook/cashfree")
        .insert_header((WEBHOOK_SIGNATURE_HEADER, signature))
        .insert_header((WEBHOOK_TIMESTAMP_HEADER, "1718000000"))
        .set_payload(body.to_string())
        .to_request();
    let res = test::call_service(&service, req).await;
    let status = res.status();
    let body = test::read_body(res).await;
    (status, String::from_utf8_lossy(&body).into_owned())
}

fn paid_event(order_id: &str, payment_id: &str) -> String {
    format!(
        r#"{{"type":"PAYMENT_SUCCESS_WEBHOOK","order_id":"{order_id}","order":{{"order_status":"PAID"}},"payment":{{"cf_payment_id":"{payment_id}"}}}}"#
    )
}

#[actix_web::test]
async fn unsigned_webhooks_are_rejected() {
    let backend = TestBackend::new().await;
    let asha = backend.customer("Asha").await;
    let tea = backend.product("Tea", 250, 10).await;
    backend.carts.add_item(asha.id, tea.id, 1).await.unwrap();
    let summary = backend.orders.create_pending_order(asha.id, None).await.unwrap();

    let body = paid_event(&summary.order_id.gateway_order_id(), "cf_1");
    let (status, text) = deliver(&backend, &body, "forged").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(text, "Invalid signature");
    let order = backend.orders.order_by_id(summary.order_id).await.unwrap();
    assert_eq!(order.status, OrderStatusType::Pending);
    backend.tear_down().await;
}

#[actix_web::test]
async fn paid_webhooks_are_applied_once() {
    let backend = TestBackend::new().await;
    let asha = backend.customer("Asha").await;
    let tea = backend.product("Tea", 250, 10).await;
    backend.carts.add_item(asha.id, tea.id, 2).await.unwrap();
    let summary = backend.orders.create_pending_order(asha.id, None).await.unwrap();
    let body = paid_event(&summary.order_id.gateway_order_id(), "cf_778");

    let (status, text) = deliver(&backend, &body, "valid").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(text, "OK");
    let (status, text) = deliver(&backend, &body, "valid").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(text, "IGNORED");

    let order = backend.orders.order_by_id(summary.order_id).await.unwrap();
    assert_eq!(order.status, OrderStatusType::Paid);
    assert_eq!(order.transaction_id.as_deref(), Some("cf_778"));
    assert_eq!(backend.orders.payments_for_order(summary.order_id).await.unwrap().len(), 1);
    assert_eq!(backend.stock_of(tea.id).await, 8);
    assert!(backend.carts.snapshot(asha.id).await.unwrap().is_empty());
    backend.tear_down().await;
}

#[actix_web::test]
async fn late_payment_for_a_cancelled_order_is_recorded() {
    let backend = TestBackend::new().await;
    let asha = backend.customer("Asha").await;
    let tea = backend.product("Tea", 250, 10).await;
    backend.carts.add_item(asha.id, tea.id, 2).await.unwrap();
    let summary = backend.orders.create_pending_order(asha.id, None).await.unwrap();
    backend.orders.cancel_order(summary.order_id, asha.id).await.unwrap();
    let body = paid_event(&summary.order_id.gateway_order_id(), "cf_901");

    let (status, text) = deliver(&backend, &body, "valid").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(text, "OK");
    let (status, text) = deliver(&backend, &body, "valid").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(text, "IGNORED");

    let order = backend.orders.order_by_id(summary.order_id).await.unwrap();
    assert_eq!(order.status, OrderStatusType::Cancelled);
    let payments = backend.orders.payments_for_order(summary.order_id).await.unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].status, OrderStatusType::Paid);
    assert_eq!(backend.stock_of(tea.id).await, 10);
    backend.tear_down().await;
}

#[actix_web::test]
async fn unusable_webhooks() {
    let backend = TestBackend::new().await;
    let (status, text) = deliver(&backend, &paid_event("ORD_4242", "cf_1"), "valid").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(text, "IGNORED");
    let (status, text) = deliver(&backend, &paid_event("legacy-99", "cf_1"), "valid").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(text, "IGNORED");
    let (status, text) = deliver(&backend, r#"{"order_id": "ORD_1""#, "valid").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(text, "ERROR");
    backend.tear_down().await;
}

#[actix_web::test]
async fn webhooks_need_no_access_token() {
    // The webhook sits outside `/api`, so a bearer token is neither needed nor checked
    let backend = TestBackend::new().await;
    let token = issue_token(1, Role::Admin);
    let reconciler = WebhookReconciler::new(backend.orders.clone(), signature_checking_gateway());
    let app = App::new()
        .app_data(web::Data::new(ServerConfig::default()))
        .app_data(web::Data::new(reconciler))
        .service(CashfreeWebhookRoute::<SqliteDatabase, MockGateway>::new());
    let service = test::init_service(app).await;
    let req = authorized(TestRequest::post().uri("/webhook/cashfree"), &token).set_payload("{}").to_request();
    let res = test::call_service(&service, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST, "No signature headers were sent");
    backend.tear_down().await;
}
