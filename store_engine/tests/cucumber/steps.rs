use cucumber::{then, when};
use log::*;
use store_engine::{
    db_types::{Money, OrderStatusType},
    traits::{InventoryManagement, OrderManagement},
    WebhookOutcome,
};

use crate::cucumber::StoreWorld;

const TIMESTAMP: &str = "1717171717";

#[when(expr = "{word} adds {int} {string} to the cart")]
async fn add_to_cart(world: &mut StoreWorld, name: String, quantity: i64, product: String) {
    let sys = world.sys();
    let (user_id, product_id) = (sys.customer(&name), sys.product(&product));
    sys.carts.add_item(user_id, product_id, quantity).await.expect("Error adding to cart");
}

#[when(expr = "{word} changes the quantity of {string} to {int}")]
async fn change_quantity(world: &mut StoreWorld, name: String, product: String, quantity: i64) {
    let sys = world.sys();
    let (user_id, product_id) = (sys.customer(&name), sys.product(&product));
    sys.carts.update_quantity(user_id, product_id, quantity).await.expect("Error updating cart");
}

#[when(expr = "{word} checks out")]
async fn check_out(world: &mut StoreWorld, name: String) {
    let sys = world.sys_mut();
    let user_id = sys.customer(&name);
    let summary = sys.orders.create_pending_order(user_id, None).await.expect("Error checking out");
    debug!("🚀️ {name} checked out order {} for {}", summary.order_id, summary.amount);
    sys.last_orders.insert(name, summary.order_id);
}

#[when(expr = "the gateway reports the order of {word} as {word} with payment reference {word}")]
async fn gateway_reports(world: &mut StoreWorld, name: String, status: String, reference: String) {
    let sys = world.sys_mut();
    let order_id = sys.last_order(&name).gateway_order_id();
    let body = format!(
        r#"{{"order_id":"{order_id}","order":{{"order_status":"{status}"}},"payment":{{"cf_payment_id":"{reference}"}}}}"#
    )
    .into_bytes();
    let signature = sys.gateway.sign(TIMESTAMP, &body);
    sys.last_webhook = Some((body, signature));
    deliver(world).await;
}

#[when("the same webhook is delivered again")]
async fn redeliver(world: &mut StoreWorld) {
    deliver(world).await;
}

async fn deliver(world: &mut StoreWorld) {
    let sys = world.sys_mut();
    let (body, signature) = sys.last_webhook.clone().expect("No webhook has been delivered yet");
    let outcome = sys.webhooks.process_webhook(&body, &signature, TIMESTAMP).await.expect("Webhook was rejected");
    sys.last_outcome = Some(outcome);
}

#[when(expr = "{word} cancels the order")]
async fn cancel_order(world: &mut StoreWorld, name: String) {
    let sys = world.sys();
    let order_id = sys.last_order(&name);
    sys.orders.cancel_order(order_id, sys.customer(&name)).await.expect("Error cancelling order");
}

#[then(expr = "the stock of {string} is {int}")]
async fn check_stock(world: &mut StoreWorld, product: String, stock: i64) {
    let sys = world.sys();
    let product = sys.db.fetch_product(sys.product(&product)).await.expect("Error fetching product");
    assert_eq!(product.expect("Product does not exist").stock, stock);
}

#[then(expr = "the cart of {word} totals {word}")]
async fn check_cart_total(world: &mut StoreWorld, name: String, total: String) {
    let sys = world.sys();
    let cart = sys.carts.snapshot(sys.customer(&name)).await.expect("Error fetching cart");
    assert_eq!(cart.total, total.parse::<Money>().expect("Not a valid amount"));
}

#[then(expr = "the cart of {word} is empty")]
async fn check_cart_empty(world: &mut StoreWorld, name: String) {
    let sys = world.sys();
    let cart = sys.carts.snapshot(sys.customer(&name)).await.expect("Error fetching cart");
    assert!(cart.is_empty(), "Cart still holds {} items", cart.item_count());
}

#[then(expr = "the order of {word} is {word}")]
async fn check_order_status(world: &mut StoreWorld, name: String, status: String) {
    let sys = world.sys();
    let order = sys.db.fetch_order(sys.last_order(&name)).await.expect("Error fetching order").expect("No order");
    assert_eq!(order.status, status.parse::<OrderStatusType>().expect("Not a valid status"));
}

#[then(expr = "the order of {word} totals {word}")]
async fn check_order_total(world: &mut StoreWorld, name: String, total: String) {
    let sys = world.sys();
    let order = sys.db.fetch_order(sys.last_order(&name)).await.expect("Error fetching order").expect("No order");
    assert_eq!(order.total, total.parse::<Money>().expect("Not a valid amount"));
}

#[then(expr = "the order of {word} has transaction id {word}")]
async fn check_transaction_id(world: &mut StoreWorld, name: String, reference: String) {
    let sys = world.sys();
    let order = sys.db.fetch_order(sys.last_order(&name)).await.expect("Error fetching order").expect("No order");
    assert_eq!(order.transaction_id.as_deref(), Some(reference.as_str()));
}

#[then(expr = "the order of {word} has {int} payment(s)")]
async fn check_payment_count(world: &mut StoreWorld, name: String, count: usize) {
    let sys = world.sys();
    let payments = sys.orders.payments_for_order(sys.last_order(&name)).await.expect("Error fetching payments");
    assert_eq!(payments.len(), count);
}

#[then(expr = "the webhook is {word}")]
async fn check_webhook_outcome(world: &mut StoreWorld, outcome: String) {
    let last = world.sys().last_outcome.clone().expect("No webhook has been delivered yet");
    match (outcome.as_str(), last) {
        ("applied", WebhookOutcome::Applied { .. }) => {},
        ("ignored", WebhookOutcome::Ignored(reason)) => debug!("🚀️ Webhook ignored: {reason}"),
        (expected, actual) => panic!("Expected the webhook to be {expected}, but got {actual:?}"),
    }
}
