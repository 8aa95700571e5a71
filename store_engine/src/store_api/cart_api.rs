use std::fmt::Debug;

use log::*;

use crate::{
    db_types::OrderStatusType,
    events::{CartUpdatedEvent, EventProducers, LowStockEvent, OrderUpdatedEvent},
    store_api::cart_objects::CartSnapshot,
    traits::{CartError, CartManagement, CartMutation},
};

/// Stock levels strictly below this trigger a low-stock event.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 5;

/// `CartApi` is the cart manager. Every mutation moves stock through the inventory ledger in the same transaction,
/// then publishes a cart-updated event (and a low-stock event when the reservation left the product running low).
pub struct CartApi<B> {
    db: B,
    producers: EventProducers,
    low_stock_threshold: i64,
}

impl<B> Debug for CartApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CartApi (low stock below {})", self.low_stock_threshold)
    }
}

impl<B: Clone> Clone for CartApi<B> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone(), producers: self.producers.clone(), low_stock_threshold: self.low_stock_threshold }
    }
}

impl<B> CartApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers, low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD }
    }

    pub fn with_low_stock_threshold(mut self, threshold: i64) -> Self {
        self.low_stock_threshold = threshold;
        self
    }

    pub fn low_stock_threshold(&self) -> i64 {
        self.low_stock_threshold
    }
}

impl<B> CartApi<B>
where B: CartManagement
{
    /// Reserves `quantity` more units of the product and adds them to the customer's cart.
    pub async fn add_item(&self, user_id: i64, product_id: i64, quantity: i64) -> Result<CartMutation, CartError> {
        let mutation = self.db.add_item(user_id, product_id, quantity).await.map_err(|e| {
            debug!("🛒️ Could not add {quantity} of product {product_id} to the cart of customer {user_id}. {e}");
            e
        })?;
        info!("🛒️ Customer {user_id} added {quantity} of product {product_id}. Stock is now {}", mutation.stock);
        self.notify(user_id, &mutation).await;
        Ok(mutation)
    }

    /// Sets the cart line to exactly `quantity` units. Zero removes the line.
    pub async fn update_quantity(
        &self,
        user_id: i64,
        product_id: i64,
        quantity: i64,
    ) -> Result<CartMutation, CartError> {
        let mutation = self.db.update_quantity(user_id, product_id, quantity).await.map_err(|e| {
            debug!("🛒️ Could not set product {product_id} to {quantity} in the cart of customer {user_id}. {e}");
            e
        })?;
        info!("🛒️ Customer {user_id} now has {quantity} of product {product_id}. Stock is now {}", mutation.stock);
        self.notify(user_id, &mutation).await;
        Ok(mutation)
    }

    pub async fn remove_item(&self, user_id: i64, product_id: i64) -> Result<CartMutation, CartError> {
        self.update_quantity(user_id, product_id, 0).await
    }

    /// Empties the cart WITHOUT returning anything to stock. Only call this once the reservation has been consumed
    /// by an order.
    pub async fn clear_cart(&self, user_id: i64) -> Result<u64, CartError> {
        let count = self.db.clear_cart(user_id).await?;
        debug!("🛒️ Cleared {count} lines from the cart of customer {user_id}");
        Ok(count)
    }

    pub async fn snapshot(&self, user_id: i64) -> Result<CartSnapshot, CartError> {
        let lines = self.db.fetch_cart_lines(user_id).await?;
        Ok(CartSnapshot::new(user_id, lines))
    }

    async fn notify(&self, user_id: i64, mutation: &CartMutation) {
        let event = CartUpdatedEvent { user_id, product_id: mutation.product_id, quantity: mutation.quantity };
        self.producers.publish_cart_updated(event).await;
        if mutation.stock < self.low_stock_threshold {
            warn!("🛒️ Product {} is running low. {} left in stock", mutation.product_id, mutation.stock);
            let event = LowStockEvent { product_id: mutation.product_id, stock: mutation.stock };
            self.producers.publish_low_stock(event).await;
        }
        for order in &mutation.superseded {
            info!("🛒️ Pending order {} of customer {user_id} was superseded by a cart change", order.id);
            let event = OrderUpdatedEvent::changed(order.clone(), OrderStatusType::Pending);
            self.producers.publish_order_updated(event).await;
        }
    }
}
