//! Request handler definitions
//!
//! Define each route and its handler here. Handlers stay thin: they pull the caller out of the JWT claims, call one
//! engine API method and serialize the result. Engine errors become HTTP errors through the `From` impls in
//! [`crate::errors`].
//!
//! Every handler is async and every engine call awaits on the database, so no handler blocks its worker thread.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use log::*;
use serde_json::json;
use store_engine::{
    db_types::{OrderId, Role},
    order_objects::OrderQueryFilter,
    traits::{CartManagement, OrderManagement, PaymentGateway, StoreDatabase},
    CartApi,
    CheckoutApi,
    OrderFlowApi,
    WebhookError,
    WebhookOutcome,
    WebhookReconciler,
};

use crate::{
    auth::JwtClaims,
    config::ServerConfig,
    data_objects::{CheckoutRequest, OrderSearchParams, PaymentSessionRequest, QuantityParams, StatusUpdateRequest},
    errors::ServerError,
    helpers::get_remote_ip,
};

pub const WEBHOOK_SIGNATURE_HEADER: &str = "x-webhook-signature";
pub const WEBHOOK_TIMESTAMP_HEADER: &str = "x-webhook-timestamp";

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro.
// Every bound gets its own type parameter, in the order given, and the handler must declare its generics in that
// same order.
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+ where requires [$($roles:expr),+]) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Webhook  ----------------------------------------------------
route!(cashfree_webhook => Post "/webhook/cashfree" impl OrderManagement, PaymentGateway);
/// Route handler for gateway notifications.
///
/// The body is taken as raw bytes, since the signature in `x-webhook-signature` covers the exact bytes sent along with
/// `x-webhook-timestamp`. The gateway only reads the status code, so the bodies are short plain strings:
/// * `200 OK`: the notification changed an order, or was a payment for a cancelled order that is now on record for a
///   refund.
/// * `200 IGNORED`: the notification was valid but changed nothing (duplicates, unknown orders, other statuses).
/// * `400 Invalid signature`
/// * `500 ERROR`: anything else. The gateway will retry.
pub async fn cashfree_webhook<B, G>(
    req: HttpRequest,
    body: web::Bytes,
    config: web::Data<ServerConfig>,
    api: web::Data<WebhookReconciler<B, G>>,
) -> HttpResponse
where
    B: OrderManagement,
    G: PaymentGateway,
{
    let header = |name: &str| req.headers().get(name).and_then(|v| v.to_str().ok()).unwrap_or_default().to_string();
    let signature = header(WEBHOOK_SIGNATURE_HEADER);
    let timestamp = header(WEBHOOK_TIMESTAMP_HEADER);
    let remote_ip = get_remote_ip(&req, config.use_x_forwarded_for, config.use_forwarded);
    debug!("💻️ Received webhook ({} bytes) from {remote_ip:?}", body.len());
    match api.process_webhook(body.as_ref(), &signature, &timestamp).await {
        Ok(WebhookOutcome::Applied { .. } | WebhookOutcome::PaidAfterCancellation { .. }) => HttpResponse::Ok().body("OK"),
        Ok(WebhookOutcome::Ignored(_)) => HttpResponse::Ok().body("IGNORED"),
        Err(WebhookError::InvalidSignature) => {
            warn!("💻️ Webhook from {remote_ip:?} failed signature verification");
            HttpResponse::BadRequest().body("Invalid signature")
        },
        Err(e) => {
            error!("💻️ Could not process webhook. {e}");
            HttpResponse::InternalServerError().body("ERROR")
        },
    }
}

//----------------------------------------------   Cart  ----------------------------------------------------
route!(my_cart => Get "/cart" impl CartManagement where requires [Role::User, Role::Admin]);
pub async fn my_cart<B: CartManagement>(
    claims: JwtClaims,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET cart for customer {}", claims.sub);
    let cart = api.snapshot(claims.user_id()).await?;
    Ok(HttpResponse::Ok().json(cart))
}

route!(add_to_cart => Post "/cart/{product_id}" impl CartManagement where requires [Role::User, Role::Admin]);
/// Adds `?quantity=n` units (default 1) of a product to the caller's cart, reserving them. Responds with the updated
/// cart.
pub async fn add_to_cart<B: CartManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    params: web::Query<QuantityParams>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product_id = path.into_inner();
    let quantity = params.quantity.unwrap_or(1);
    debug!("💻️ POST cart: customer {} adds {quantity} of product {product_id}", claims.sub);
    api.add_item(claims.user_id(), product_id, quantity).await?;
    let cart = api.snapshot(claims.user_id()).await?;
    Ok(HttpResponse::Ok().json(cart))
}

route!(update_cart_item => Put "/cart/{product_id}" impl CartManagement where requires [Role::User, Role::Admin]);
/// Sets the quantity of a cart line to `?quantity=n`. Zero removes the line.
pub async fn update_cart_item<B: CartManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    params: web::Query<QuantityParams>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product_id = path.into_inner();
    let quantity =
        params.quantity.ok_or_else(|| ServerError::InvalidRequestBody("The quantity parameter is required".into()))?;
    debug!("💻️ PUT cart: customer {} sets product {product_id} to {quantity}", claims.sub);
    api.update_quantity(claims.user_id(), product_id, quantity).await?;
    let cart = api.snapshot(claims.user_id()).await?;
    Ok(HttpResponse::Ok().json(cart))
}

route!(remove_from_cart => Delete "/cart/{product_id}" impl CartManagement where requires [Role::User, Role::Admin]);
pub async fn remove_from_cart<B: CartManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product_id = path.into_inner();
    debug!("💻️ DELETE cart: customer {} removes product {product_id}", claims.sub);
    api.remove_item(claims.user_id(), product_id).await?;
    let cart = api.snapshot(claims.user_id()).await?;
    Ok(HttpResponse::Ok().json(cart))
}

//----------------------------------------------   Checkout  ----------------------------------------------------
route!(checkout => Post "/checkout" impl OrderManagement where requires [Role::User, Role::Admin]);
/// Freezes the caller's cart into a `Pending` order and responds with `{orderId, amount}`.
pub async fn checkout<B: OrderManagement>(
    claims: JwtClaims,
    body: Option<web::Json<CheckoutRequest>>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let shipping_address = body.and_then(|b| b.into_inner().shipping_address).filter(|s| !s.trim().is_empty());
    debug!("💻️ POST checkout for customer {}", claims.sub);
    let summary = api.create_pending_order(claims.user_id(), shipping_address).await?;
    Ok(HttpResponse::Ok().json(summary))
}

route!(payment_session => Post "/payment_session" impl StoreDatabase, PaymentGateway where requires [Role::User, Role::Admin]);
/// Opens a gateway payment session for one of the caller's pending orders.
///
/// The response carries the order id as the gateway knows it, the amount and exactly one of `qrArtifact`,
/// `paymentLink` or `sessionId` (or `upiLink` plus `qrArtifact` for the local UPI fallback).
pub async fn payment_session<B, G>(
    claims: JwtClaims,
    body: web::Json<PaymentSessionRequest>,
    api: web::Data<CheckoutApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: StoreDatabase,
    G: PaymentGateway,
{
    let order_id = body.into_inner().order_id;
    debug!("💻️ POST payment_session for order {order_id} by customer {}", claims.sub);
    let session = api.create_payment_session(order_id, claims.user_id()).await?;
    Ok(HttpResponse::Ok().json(session))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(order_status => Get "/order_status/{order_id}" impl OrderManagement where requires [Role::User, Role::Admin]);
/// The endpoint clients poll while the customer pays. Responds with `{status, transactionId}`.
pub async fn order_status<B: OrderManagement>(
    claims: JwtClaims,
    path: web::Path<OrderId>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    trace!("💻️ GET order_status({order_id}) for customer {}", claims.sub);
    let status = api.order_status(order_id, claims.user_id()).await?;
    Ok(HttpResponse::Ok().json(status))
}

route!(my_orders => Get "/orders" impl OrderManagement where requires [Role::User, Role::Admin]);
pub async fn my_orders<B: OrderManagement>(
    claims: JwtClaims,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET orders for customer {}", claims.sub);
    let orders = api.user_orders(claims.user_id()).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_by_id => Get "/orders/{order_id}" impl OrderManagement where requires [Role::User, Role::Admin]);
/// Customers can fetch their own orders. Administrators can fetch any order. Other customers' orders are reported as
/// missing, so that order ids cannot be probed.
pub async fn order_by_id<B: OrderManagement>(
    claims: JwtClaims,
    path: web::Path<OrderId>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ GET order_by_id({order_id}) for customer {}", claims.sub);
    let order = api.order_by_id(order_id).await?;
    if order.user_id != claims.user_id() && !claims.is_admin() {
        info!("💻️ Customer {} asked for order {order_id}, which is not theirs", claims.sub);
        return Err(ServerError::NoRecordFound(format!("Order {order_id} does not exist")));
    }
    Ok(HttpResponse::Ok().json(order))
}

route!(cancel_order => Post "/orders/{order_id}/cancel" impl OrderManagement where requires [Role::User, Role::Admin]);
/// Cancels one of the caller's orders and returns its stock. Cancelling twice is harmless.
pub async fn cancel_order<B: OrderManagement>(
    claims: JwtClaims,
    path: web::Path<OrderId>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ POST cancel order {order_id} for customer {}", claims.sub);
    api.cancel_order(order_id, claims.user_id()).await?;
    let order = api.order_by_id(order_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Admin  ----------------------------------------------------
route!(all_orders => Get "/orders" impl OrderManagement where requires [Role::Admin]);
pub async fn all_orders<B: OrderManagement>(
    params: web::Query<OrderSearchParams>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let filter: OrderQueryFilter = params.into_inner().into();
    debug!("💻️ GET all orders. {filter}");
    let orders = api.search_orders(filter).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(orders_for_user => Get "/users/{user_id}/orders" impl OrderManagement where requires [Role::Admin]);
pub async fn orders_for_user<B: OrderManagement>(
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = path.into_inner();
    debug!("💻️ GET orders for customer {user_id}");
    let orders = api.user_orders(user_id).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(update_order_status => Put "/orders/{order_id}/status" impl OrderManagement where requires [Role::Admin]);
/// Moves an order to any status. Cancelling releases the order's stock. Cancelled orders cannot be revived.
pub async fn update_order_status<B: OrderManagement>(
    claims: JwtClaims,
    path: web::Path<OrderId>,
    body: web::Json<StatusUpdateRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    let status = body.into_inner().status;
    info!("💻️ Administrator {} sets order {order_id} to {status}", claims.sub);
    api.update_status(order_id, status).await?;
    let order = api.order_by_id(order_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(payments_for_order => Get "/orders/{order_id}/payments" impl OrderManagement where requires [Role::Admin]);
/// The gateway outcomes recorded against an order.
pub async fn payments_for_order<B: OrderManagement>(
    path: web::Path<OrderId>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ GET payments for order {order_id}");
    let payments = api.payments_for_order(order_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "orderId": order_id, "payments": payments })))
}
