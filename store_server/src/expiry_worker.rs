use std::time::Duration as StdDuration;

use chrono::Duration;
use log::*;
use store_engine::{events::EventProducers, traits::CancelledOrder, OrderFlowApi, SqliteDatabase};
use tokio::task::JoinHandle;

/// Starts the reservation expiry worker. Every `interval`, `Pending` orders older than `timeout` are cancelled and
/// their stock is released. Do not await the returned JoinHandle, as it runs indefinitely.
pub fn start_expiry_worker(
    db: SqliteDatabase,
    producers: EventProducers,
    timeout: Duration,
    interval: StdDuration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        let api = OrderFlowApi::new(db, producers);
        info!("🕰️ Pending order expiry worker started. Orders expire after {} minutes", timeout.num_minutes());
        loop {
            timer.tick().await;
            trace!("🕰️ Running pending order expiry job");
            match api.expire_pending_orders(timeout).await {
                Ok(expired) if expired.is_empty() => trace!("🕰️ No pending orders expired"),
                Ok(expired) => info!("🕰️ {} pending orders expired: {}", expired.len(), order_list(&expired)),
                Err(e) => error!("🕰️ Error running pending order expiry job: {e}"),
            }
        }
    })
}

fn order_list(orders: &[CancelledOrder]) -> String {
    orders
        .iter()
        .map(|o| format!("[{}] customer {} ({} lines restocked)", o.order.id, o.order.user_id, o.restocked.len()))
        .collect::<Vec<String>>()
        .join(", ")
}
