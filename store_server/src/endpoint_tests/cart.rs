use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use store_engine::{db_types::Role, SqliteDatabase};

use super::helpers::{authorized, issue_token, json, send_request, TestBackend};
use crate::routes::{AddToCartRoute, MyCartRoute, RemoveFromCartRoute, UpdateCartItemRoute};

fn cart_routes(backend: &TestBackend) -> impl FnOnce(&mut ServiceConfig) + 'static {
    let carts = web::Data::new(backend.carts.clone());
    move |cfg: &mut ServiceConfig| {
        cfg.app_data(carts).service(
            web::scope("/user")
                .service(MyCartRoute::<SqliteDatabase>::new())
                .service(AddToCartRoute::<SqliteDatabase>::new())
                .service(UpdateCartItemRoute::<SqliteDatabase>::new())
                .service(RemoveFromCartRoute::<SqliteDatabase>::new()),
        );
    }
}

#[actix_web::test]
async fn cart_requires_a_token() {
    let backend = TestBackend::new().await;
    let (status, body) = send_request(TestRequest::get().uri("/api/user/cart"), cart_routes(&backend)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json(&body)["error"], "Authentication Error. No access token was provided.");

    let req = authorized(TestRequest::get().uri("/api/user/cart"), "not-a-token");
    let (status, _) = send_request(req, cart_routes(&backend)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let mut token = issue_token(1, Role::User);
    token.replace_range(token.len() - 10..token.len() - 5, "00000");
    let (status, _) = send_request(authorized(TestRequest::get().uri("/api/user/cart"), &token), cart_routes(&backend)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    backend.tear_down().await;
}

#[actix_web::test]
async fn adding_to_the_cart_reserves_stock() {
    let backend = TestBackend::new().await;
    let asha = backend.customer("Asha").await;
    let kettle = backend.product("Kettle", 1250, 4).await;
    let token = issue_token(asha.id, Role::User);

    let req = authorized(TestRequest::post().uri(&format!("/api/user/cart/{}", kettle.id)), &token);
    let (status, body) = send_request(req, cart_routes(&backend)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let cart = json(&body);
    assert_eq!(cart["items"][0]["quantity"], 1);
    assert_eq!(cart["items"][0]["productName"], "Kettle");
    assert_eq!(cart["total"], "12.50");
    assert_eq!(backend.stock_of(kettle.id).await, 3);

    let req = authorized(TestRequest::post().uri(&format!("/api/user/cart/{}?quantity=2", kettle.id)), &token);
    let (status, body) = send_request(req, cart_routes(&backend)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["items"][0]["quantity"], 3);
    assert_eq!(backend.stock_of(kettle.id).await, 1);

    let (status, body) = send_request(authorized(TestRequest::get().uri("/api/user/cart"), &token), cart_routes(&backend)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["total"], "37.50");
    backend.tear_down().await;
}

#[actix_web::test]
async fn running_out_of_stock_is_a_conflict() {
    let backend = TestBackend::new().await;
    let asha = backend.customer("Asha").await;
    let lamp = backend.product("Lamp", 4000, 2).await;
    let token = issue_token(asha.id, Role::User);

    let req = authorized(TestRequest::post().uri(&format!("/api/user/cart/{}?quantity=3", lamp.id)), &token);
    let (status, body) = send_request(req, cart_routes(&backend)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let body = json(&body);
    assert_eq!(body["available"], 2);
    assert_eq!(body["productId"], lamp.id);
    assert_eq!(backend.stock_of(lamp.id).await, 2);

    let req = authorized(TestRequest::post().uri("/api/user/cart/9999"), &token);
    let (status, _) = send_request(req, cart_routes(&backend)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let req = authorized(TestRequest::post().uri(&format!("/api/user/cart/{}?quantity=0", lamp.id)), &token);
    let (status, _) = send_request(req, cart_routes(&backend)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    backend.tear_down().await;
}

#[actix_web::test]
async fn changing_and_removing_cart_lines() {
    let backend = TestBackend::new().await;
    let asha = backend.customer("Asha").await;
    let mug = backend.product("Mug", 300, 10).await;
    let token = issue_token(asha.id, Role::User);
    backend.carts.add_item(asha.id, mug.id, 2).await.unwrap();

    let req = authorized(TestRequest::put().uri(&format!("/api/user/cart/{}", mug.id)), &token);
    let (status, _) = send_request(req, cart_routes(&backend)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "PUT needs a quantity");

    let req = authorized(TestRequest::put().uri(&format!("/api/user/cart/{}?quantity=6", mug.id)), &token);
    let (status, body) = send_request(req, cart_routes(&backend)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["items"][0]["quantity"], 6);
    assert_eq!(backend.stock_of(mug.id).await, 4);

    let req = authorized(TestRequest::delete().uri(&format!("/api/user/cart/{}", mug.id)), &token);
    let (status, body) = send_request(req, cart_routes(&backend)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["items"].as_array().map(Vec::len), Some(0));
    assert_eq!(backend.stock_of(mug.id).await, 10);

    let req = authorized(TestRequest::delete().uri(&format!("/api/user/cart/{}", mug.id)), &token);
    let (status, _) = send_request(req, cart_routes(&backend)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    backend.tear_down().await;
}
