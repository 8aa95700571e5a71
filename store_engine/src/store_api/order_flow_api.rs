use std::fmt::Debug;

use chrono::Duration;
use log::*;

use crate::{
    db_types::{Order, OrderId, OrderStatusType, Payment},
    events::{EventProducers, OrderUpdatedEvent},
    store_api::order_objects::{CheckoutSummary, OrderQueryFilter, OrderStatusView, OrderView},
    traits::{CancelledOrder, OrderError, OrderManagement, OrderTransition},
};

/// `OrderFlowApi` is the order lifecycle. It turns carts into pending orders, applies payment outcomes and
/// cancellations, and serves the order read paths. Every status change it makes is announced on the order-updated
/// hook.
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B: Clone> Clone for OrderFlowApi<B> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone(), producers: self.producers.clone() }
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> OrderFlowApi<B>
where B: OrderManagement
{
    /// Freezes the customer's cart into a new `Pending` order.
    pub async fn create_pending_order(
        &self,
        user_id: i64,
        shipping_address: Option<String>,
    ) -> Result<CheckoutSummary, OrderError> {
        let result = self.db.create_pending_order(user_id, shipping_address).await?;
        for old in result.superseded {
            debug!("📦️ Order {} was superseded by a new checkout", old.id);
            self.publish(OrderUpdatedEvent::changed(old, OrderStatusType::Pending)).await;
        }
        let summary = CheckoutSummary { order_id: result.order.id, amount: result.order.total };
        info!("📦️ Customer {user_id} checked out order {} for {}", summary.order_id, summary.amount);
        self.publish(OrderUpdatedEvent::created(result.order)).await;
        Ok(summary)
    }

    /// Marks a `Pending` order as paid.
    pub async fn confirm_order(&self, order_id: OrderId, transaction_ref: &str) -> Result<Order, OrderError> {
        let order = self.db.confirm_order(order_id, transaction_ref).await?;
        info!("📦️ Order {order_id} has been paid. Reference: {transaction_ref}");
        self.publish(OrderUpdatedEvent::changed(order.clone(), OrderStatusType::Pending)).await;
        Ok(order)
    }

    /// Keeps a record of a payment that arrived after the order was cancelled, so that it can be refunded. `None` means
    /// there was nothing new to record.
    pub async fn record_payment_after_cancellation(
        &self,
        order_id: OrderId,
        transaction_ref: &str,
    ) -> Result<Option<Payment>, OrderError> {
        let payment = self.db.record_payment_after_cancellation(order_id, transaction_ref).await?;
        if let Some(p) = &payment {
            warn!(
                "📦️ Order {order_id} was paid after it had been cancelled. Payment {transaction_ref} of {} must be \
                 refunded",
                p.amount
            );
        }
        Ok(payment)
    }

    /// Records a failed payment. `None` means the order was cancelled or had already failed, and nothing changed.
    pub async fn fail_order(
        &self,
        order_id: OrderId,
        gateway_payment_id: Option<&str>,
    ) -> Result<Option<Order>, OrderError> {
        let transition = self.db.fail_order(order_id, gateway_payment_id).await?;
        Ok(match transition {
            Some(OrderTransition { order, previous_status }) => {
                info!("📦️ Payment for order {order_id} failed (order was {previous_status})");
                self.publish(OrderUpdatedEvent::changed(order.clone(), previous_status)).await;
                Some(order)
            },
            None => {
                debug!("📦️ Ignoring payment failure for order {order_id}. It is already closed");
                None
            },
        })
    }

    /// Cancels the customer's own order and returns its stock. Repeating the cancellation is harmless.
    pub async fn cancel_order(&self, order_id: OrderId, user_id: i64) -> Result<CancelledOrder, OrderError> {
        let order = self.db.fetch_order(order_id).await?.ok_or(OrderError::OrderNotFound(order_id))?;
        if order.user_id != user_id {
            warn!("📦️ Customer {user_id} tried to cancel order {order_id}, which belongs to customer {}", order.user_id);
            return Err(OrderError::AccessDenied { order_id, user_id });
        }
        self.cancel(order_id).await
    }

    /// Administrative status change. Cancellations return stock exactly as a customer cancellation would.
    pub async fn update_status(&self, order_id: OrderId, status: OrderStatusType) -> Result<Order, OrderError> {
        if status == OrderStatusType::Cancelled {
            return self.cancel(order_id).await.map(|c| c.order);
        }
        let transition = self.db.set_order_status(order_id, status).await?;
        if transition.is_change() {
            self.publish(OrderUpdatedEvent::changed(transition.order.clone(), transition.previous_status)).await;
        }
        Ok(transition.order)
    }

    async fn cancel(&self, order_id: OrderId) -> Result<CancelledOrder, OrderError> {
        let cancelled = self.db.cancel_order(order_id).await?;
        if cancelled.was_already_cancelled() {
            debug!("📦️ Order {order_id} was already cancelled. Nothing was restocked");
        } else {
            let units = cancelled.restocked.iter().map(|r| r.quantity).sum::<i64>();
            info!("📦️ Order {order_id} cancelled. {units} units returned to stock");
            self.publish(OrderUpdatedEvent::changed(cancelled.order.clone(), cancelled.previous_status)).await;
        }
        Ok(cancelled)
    }

    /// Cancels every order that has sat in `Pending` for longer than `timeout`, releasing its reservation.
    pub async fn expire_pending_orders(&self, timeout: Duration) -> Result<Vec<CancelledOrder>, OrderError> {
        let stale = self.db.fetch_stale_pending_orders(timeout).await?;
        let mut expired = Vec::with_capacity(stale.len());
        for order in stale {
            match self.db.expire_order(order.id).await {
                Ok(Some(cancelled)) => {
                    info!("📦️ Order {} expired after waiting {} minutes for payment", order.id, timeout.num_minutes());
                    self.publish(OrderUpdatedEvent::changed(cancelled.order.clone(), cancelled.previous_status)).await;
                    expired.push(cancelled);
                },
                Ok(None) => trace!("📦️ Order {} moved on before it could expire", order.id),
                Err(e) => error!("📦️ Could not expire order {}. {e}", order.id),
            }
        }
        Ok(expired)
    }

    pub async fn order_status(&self, order_id: OrderId, user_id: i64) -> Result<OrderStatusView, OrderError> {
        let order = self.db.fetch_order(order_id).await?.ok_or(OrderError::OrderNotFound(order_id))?;
        if order.user_id != user_id {
            return Err(OrderError::AccessDenied { order_id, user_id });
        }
        Ok(OrderStatusView { status: order.status, transaction_id: order.transaction_id.unwrap_or_default() })
    }

    pub async fn order_by_id(&self, order_id: OrderId) -> Result<OrderView, OrderError> {
        let order = self.db.fetch_order(order_id).await?.ok_or(OrderError::OrderNotFound(order_id))?;
        self.view(order).await
    }

    pub async fn user_orders(&self, user_id: i64) -> Result<Vec<OrderView>, OrderError> {
        let orders = self.db.fetch_orders_for_user(user_id).await?;
        self.views(orders).await
    }

    pub async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<OrderView>, OrderError> {
        trace!("📦️ Searching orders. {query}");
        let orders = self.db.search_orders(query).await?;
        self.views(orders).await
    }

    pub async fn payments_for_order(&self, order_id: OrderId) -> Result<Vec<Payment>, OrderError> {
        self.db.fetch_payments_for_order(order_id).await
    }

    async fn view(&self, order: Order) -> Result<OrderView, OrderError> {
        let items = self.db.fetch_order_items(order.id).await?;
        Ok(OrderView::new(order, items))
    }

    async fn views(&self, orders: Vec<Order>) -> Result<Vec<OrderView>, OrderError> {
        let mut result = Vec::with_capacity(orders.len());
        for order in orders {
            result.push(self.view(order).await?);
        }
        Ok(result)
    }

    async fn publish(&self, event: OrderUpdatedEvent) {
        self.producers.publish_order_updated(event).await;
    }
}
