//! The store's notification sink.
//!
//! Cart, stock and order events are logged under the `store::notifications` target. Hooks run on their own workers,
//! so nothing here can slow down or fail the request that raised the event.
use futures::future::BoxFuture;
use log::*;
use store_engine::events::{CartUpdatedEvent, EventHandlers, EventHooks, LowStockEvent, OrderUpdatedEvent};

pub const NOTIFICATION_BUFFER_SIZE: usize = 50;
const TARGET: &str = "store::notifications";

pub fn create_notification_handlers() -> EventHandlers {
    let mut hooks = EventHooks::default();
    hooks
        .on_cart_updated(|ev: CartUpdatedEvent| {
            let CartUpdatedEvent { user_id, product_id, quantity } = ev;
            debug!(target: TARGET, "📬️ Cart of customer {user_id} now holds {quantity} of product {product_id}");
            no_op()
        })
        .on_low_stock(|ev: LowStockEvent| {
            warn!(target: TARGET, "📬️ Low stock: product {} is down to {} units", ev.product_id, ev.stock);
            no_op()
        })
        .on_order_updated(|ev: OrderUpdatedEvent| {
            let OrderUpdatedEvent { order, previous_status } = ev;
            match previous_status {
                None => {
                    info!(target: TARGET, "📬️ Order {} created for customer {} ({})", order.id, order.user_id, order.total)
                },
                Some(previous) => info!(
                    target: TARGET,
                    "📬️ Order {} of customer {} moved from {previous} to {}",
                    order.id,
                    order.user_id,
                    order.status
                ),
            }
            no_op()
        });
    EventHandlers::new(NOTIFICATION_BUFFER_SIZE, hooks)
}

fn no_op() -> BoxFuture<'static, ()> {
    Box::pin(async {})
}
