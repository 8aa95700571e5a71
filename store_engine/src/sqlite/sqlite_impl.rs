//! `SqliteDatabase` is a concrete implementation of a store engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the storage traits defined in the [`traits`]
//! module.
//!
//! [`traits`]: crate::traits
use std::fmt::Debug;

use chrono::Duration;
use log::*;
use sqlx::{migrate, SqliteConnection, SqlitePool};

use super::db::{carts, customers, db_url, new_pool, orders, payments, products};
use crate::{
    db_types::{
        Customer,
        Money,
        NewCustomer,
        NewPayment,
        NewProduct,
        Order,
        OrderId,
        OrderStatusType,
        Payment,
        Product,
        StockHolder,
    },
    order_objects::OrderQueryFilter,
    traits::{
        CancelledOrder,
        CartError,
        CartLine,
        CartManagement,
        CartMutation,
        CustomerError,
        CustomerManagement,
        InventoryError,
        InventoryManagement,
        NewOrderResult,
        OrderError,
        OrderItemDetail,
        OrderManagement,
        OrderTransition,
        Restock,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object, using the `STORE_DATABASE_URL` environment variable.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date.
    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    pub async fn close(&mut self) -> Result<(), sqlx::Error> {
        self.pool.close().await;
        Ok(())
    }
}

impl InventoryManagement for SqliteDatabase {
    async fn insert_product(&self, product: NewProduct) -> Result<Product, InventoryError> {
        let mut tx = self.pool.begin().await?;
        let product = products::insert_product(product, &mut tx).await?;
        tx.commit().await?;
        Ok(product)
    }

    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, InventoryError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::fetch_product(product_id, &mut conn).await?;
        Ok(product)
    }

    async fn reserve(&self, product_id: i64, quantity: i64) -> Result<i64, InventoryError> {
        let mut conn = self.pool.acquire().await?;
        products::reserve(product_id, quantity, &mut conn).await
    }

    async fn release(&self, product_id: i64, quantity: i64) -> Result<i64, InventoryError> {
        let mut conn = self.pool.acquire().await?;
        products::release(product_id, quantity, &mut conn).await
    }
}

impl CustomerManagement for SqliteDatabase {
    async fn register_customer(&self, customer: NewCustomer) -> Result<Customer, CustomerError> {
        let mut tx = self.pool.begin().await?;
        let customer = customers::insert_customer(customer, &mut tx).await?;
        carts::create_cart(customer.id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Customer {} registered with an empty cart", customer.id);
        Ok(customer)
    }

    async fn fetch_customer(&self, customer_id: i64) -> Result<Option<Customer>, CustomerError> {
        let mut conn = self.pool.acquire().await?;
        let customer = customers::fetch_customer(customer_id, &mut conn).await?;
        Ok(customer)
    }
}

impl CartManagement for SqliteDatabase {
    /// Reserves stock and adds it to the cart in one transaction.
    ///
    /// Any pending order of the customer is superseded, since it no longer matches the cart contents.
    async fn add_item(&self, user_id: i64, product_id: i64, quantity: i64) -> Result<CartMutation, CartError> {
        if quantity <= 0 {
            return Err(CartError::InvalidQuantity(quantity));
        }
        let mut tx = self.pool.begin().await?;
        let cart_id = match carts::lock_cart(user_id, &mut tx).await? {
            Some(id) => id,
            None => {
                customers::fetch_customer(user_id, &mut tx).await?.ok_or(CartError::CustomerNotFound(user_id))?;
                carts::create_cart(user_id, &mut tx).await?.id
            },
        };
        let stock = products::reserve(product_id, quantity, &mut tx).await?;
        let item = carts::upsert_item(cart_id, product_id, quantity, &mut tx).await?;
        let superseded = orders::supersede_pending_orders(user_id, &mut tx).await?;
        orders::drop_cart_claims(user_id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Cart {cart_id} now holds {} of product {product_id}. Stock: {stock}", item.quantity);
        Ok(CartMutation { cart_id, product_id, quantity: item.quantity, stock, superseded })
    }

    /// Release-then-reserve in one transaction. If the reservation fails the transaction is rolled back, which puts the
    /// original reservation back in place.
    async fn update_quantity(&self, user_id: i64, product_id: i64, quantity: i64) -> Result<CartMutation, CartError> {
        if quantity < 0 {
            return Err(CartError::InvalidQuantity(quantity));
        }
        let mut tx = self.pool.begin().await?;
        let cart_id = carts::lock_cart(user_id, &mut tx).await?.ok_or(CartError::CartNotFound { user_id })?;
        let item = carts::fetch_item(cart_id, product_id, &mut tx)
            .await?
            .ok_or(CartError::ItemNotInCart { user_id, product_id })?;
        let released = products::release(product_id, item.quantity, &mut tx).await?;
        let stock = if quantity == 0 {
            carts::delete_item(item.id, &mut tx).await?;
            released
        } else {
            match products::reserve(product_id, quantity, &mut tx).await {
                Ok(stock) => {
                    carts::set_item_quantity(item.id, quantity, &mut tx).await?;
                    stock
                },
                Err(e) => {
                    debug!("🗃️ Could not change cart {cart_id} to {quantity} of product {product_id}. Rolling back");
                    tx.rollback().await?;
                    return Err(e.into());
                },
            }
        };
        let superseded = orders::supersede_pending_orders(user_id, &mut tx).await?;
        orders::drop_cart_claims(user_id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Cart {cart_id} now holds {quantity} of product {product_id}. Stock: {stock}");
        Ok(CartMutation { cart_id, product_id, quantity, stock, superseded })
    }

    async fn clear_cart(&self, user_id: i64) -> Result<u64, CartError> {
        let mut conn = self.pool.acquire().await?;
        let count = carts::clear_cart(user_id, &mut conn).await?;
        Ok(count)
    }

    async fn fetch_cart_lines(&self, user_id: i64) -> Result<Vec<CartLine>, CartError> {
        let mut conn = self.pool.acquire().await?;
        let lines = carts::fetch_cart_lines(user_id, &mut conn).await?;
        Ok(lines)
    }
}

impl OrderManagement for SqliteDatabase {
    async fn create_pending_order(
        &self,
        user_id: i64,
        shipping_address: Option<String>,
    ) -> Result<NewOrderResult, OrderError> {
        let mut tx = self.pool.begin().await?;
        carts::lock_cart(user_id, &mut tx).await?.ok_or(OrderError::EmptyCart(user_id))?;
        let lines = carts::fetch_cart_lines(user_id, &mut tx).await?;
        if lines.is_empty() {
            return Err(OrderError::EmptyCart(user_id));
        }
        let superseded = orders::supersede_pending_orders(user_id, &mut tx).await?;
        // The new order takes over the cart's reservation from any failed predecessor
        orders::drop_cart_claims(user_id, &mut tx).await?;
        let total = lines.iter().map(CartLine::line_total).sum::<Money>();
        let order = orders::insert_order(user_id, total, shipping_address, &mut tx).await?;
        let mut items = Vec::with_capacity(lines.len());
        for line in &lines {
            let item = orders::insert_order_item(order.id, line.product_id, line.quantity, line.price, &mut tx).await?;
            items.push(item);
        }
        tx.commit().await?;
        debug!("🗃️ Order {} created for customer {user_id} with {} lines. Total {total}", order.id, items.len());
        Ok(NewOrderResult { order, items, superseded })
    }

    async fn fetch_order(&self, order_id: OrderId) -> Result<Option<Order>, OrderError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItemDetail>, OrderError> {
        let mut conn = self.pool.acquire().await?;
        let items = orders::fetch_order_item_details(order_id, &mut conn).await?;
        Ok(items)
    }

    async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, OrderError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_for_user(user_id, &mut conn).await?;
        Ok(orders)
    }

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::search_orders(query, &mut conn).await?;
        Ok(orders)
    }

    async fn confirm_order(&self, order_id: OrderId, transaction_ref: &str) -> Result<Order, OrderError> {
        let mut tx = self.pool.begin().await?;
        let current = orders::lock_order(order_id, &mut tx).await?.ok_or(OrderError::OrderNotFound(order_id))?;
        let invalid = || OrderError::InvalidTransition { order_id, from: current.status, to: OrderStatusType::Paid };
        if current.status != OrderStatusType::Pending {
            tx.rollback().await?;
            return Err(invalid());
        }
        let mut order = orders::mark_paid(order_id, transaction_ref, &mut tx).await?.ok_or_else(invalid)?;
        if current.stock_holder == StockHolder::Cart {
            carts::clear_cart(order.user_id, &mut tx).await?;
            order = orders::set_stock_holder(order_id, StockHolder::Order, &mut tx).await?;
        }
        let payment = NewPayment {
            order_id,
            gateway_payment_id: Some(transaction_ref.to_string()),
            amount: order.total,
            status: OrderStatusType::Paid,
        };
        payments::insert_payment(payment, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order {order_id} is paid. Transaction reference: {transaction_ref}");
        Ok(order)
    }

    async fn record_payment_after_cancellation(
        &self,
        order_id: OrderId,
        transaction_ref: &str,
    ) -> Result<Option<Payment>, OrderError> {
        let mut tx = self.pool.begin().await?;
        let current = orders::lock_order(order_id, &mut tx).await?.ok_or(OrderError::OrderNotFound(order_id))?;
        if current.status != OrderStatusType::Cancelled {
            trace!("🗃️ Order {order_id} is {}, not cancelled. No refund record needed", current.status);
            tx.rollback().await?;
            return Ok(None);
        }
        if payments::fetch_paid_payment(order_id, transaction_ref, &mut tx).await?.is_some() {
            trace!("🗃️ Payment {transaction_ref} for order {order_id} is already on record");
            tx.rollback().await?;
            return Ok(None);
        }
        let payment = NewPayment {
            order_id,
            gateway_payment_id: Some(transaction_ref.to_string()),
            amount: current.total,
            status: OrderStatusType::Paid,
        };
        let payment = payments::insert_payment(payment, &mut tx).await?;
        tx.commit().await?;
        Ok(Some(payment))
    }

    async fn cancel_order(&self, order_id: OrderId) -> Result<CancelledOrder, OrderError> {
        let mut tx = self.pool.begin().await?;
        let current = orders::lock_order(order_id, &mut tx).await?.ok_or(OrderError::OrderNotFound(order_id))?;
        match current.status {
            OrderStatusType::Cancelled => {
                trace!("🗃️ Order {order_id} is already cancelled. Nothing to do");
                tx.rollback().await?;
                Ok(CancelledOrder { previous_status: current.status, order: current, restocked: Vec::new() })
            },
            OrderStatusType::Pending | OrderStatusType::Paid => {
                let cancelled = cancel_and_restock(current, &mut tx).await?;
                tx.commit().await?;
                Ok(cancelled)
            },
            from => Err(OrderError::InvalidTransition { order_id, from, to: OrderStatusType::Cancelled }),
        }
    }

    async fn expire_order(&self, order_id: OrderId) -> Result<Option<CancelledOrder>, OrderError> {
        let mut tx = self.pool.begin().await?;
        let current = orders::lock_order(order_id, &mut tx).await?.ok_or(OrderError::OrderNotFound(order_id))?;
        if current.status != OrderStatusType::Pending {
            trace!("🗃️ Order {order_id} is {} and will not expire", current.status);
            tx.rollback().await?;
            return Ok(None);
        }
        let cancelled = cancel_and_restock(current, &mut tx).await?;
        tx.commit().await?;
        Ok(Some(cancelled))
    }

    async fn fail_order(
        &self,
        order_id: OrderId,
        gateway_payment_id: Option<&str>,
    ) -> Result<Option<OrderTransition>, OrderError> {
        let mut tx = self.pool.begin().await?;
        let current = orders::lock_order(order_id, &mut tx).await?.ok_or(OrderError::OrderNotFound(order_id))?;
        if matches!(current.status, OrderStatusType::Cancelled | OrderStatusType::Failed) {
            trace!("🗃️ Order {order_id} is {}. Leaving it untouched", current.status);
            tx.rollback().await?;
            return Ok(None);
        }
        let order = orders::update_status(order_id, OrderStatusType::Failed, &mut tx).await?;
        let payment = NewPayment {
            order_id,
            gateway_payment_id: gateway_payment_id.map(String::from),
            amount: order.total,
            status: OrderStatusType::Failed,
        };
        payments::insert_payment(payment, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order {order_id} marked as failed (was {})", current.status);
        Ok(Some(OrderTransition { order, previous_status: current.status }))
    }

    async fn set_order_status(
        &self,
        order_id: OrderId,
        status: OrderStatusType,
    ) -> Result<OrderTransition, OrderError> {
        let mut tx = self.pool.begin().await?;
        let current = orders::lock_order(order_id, &mut tx).await?.ok_or(OrderError::OrderNotFound(order_id))?;
        let previous_status = current.status;
        if previous_status == status {
            tx.rollback().await?;
            return Ok(OrderTransition { order: current, previous_status });
        }
        if previous_status == OrderStatusType::Cancelled || status == OrderStatusType::Cancelled {
            return Err(OrderError::InvalidTransition { order_id, from: previous_status, to: status });
        }
        let mut order = orders::update_status(order_id, status, &mut tx).await?;
        let consumes_stock = matches!(status, OrderStatusType::Paid | OrderStatusType::Shipped | OrderStatusType::Delivered);
        if consumes_stock {
            match current.stock_holder {
                StockHolder::Cart => {
                    carts::clear_cart(order.user_id, &mut tx).await?;
                    order = orders::set_stock_holder(order_id, StockHolder::Order, &mut tx).await?;
                },
                StockHolder::Order => {},
                StockHolder::Released => {
                    warn!("🗃️ Order {order_id} is now {status}, but no stock is held for it");
                },
            }
        }
        tx.commit().await?;
        info!("🗃️ Order {order_id} status changed from {previous_status} to {status} by an administrator");
        Ok(OrderTransition { order, previous_status })
    }

    async fn fetch_payments_for_order(&self, order_id: OrderId) -> Result<Vec<Payment>, OrderError> {
        let mut conn = self.pool.acquire().await?;
        let payments = payments::fetch_payments_for_order(order_id, &mut conn).await?;
        Ok(payments)
    }

    async fn fetch_stale_pending_orders(&self, older_than: Duration) -> Result<Vec<Order>, OrderError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_stale_pending_orders(older_than.num_seconds(), &mut conn).await?;
        Ok(orders)
    }
}

/// Marks a locked order as cancelled and returns the stock it holds. Units still reserved by the cart are released
/// once, through the order lines, and the cart is emptied without a second release. An order that holds no stock
/// restocks nothing.
async fn cancel_and_restock(current: Order, conn: &mut SqliteConnection) -> Result<CancelledOrder, OrderError> {
    let order_id = current.id;
    let previous_status = current.status;
    orders::update_status(order_id, OrderStatusType::Cancelled, conn).await?;
    let order = orders::set_stock_holder(order_id, StockHolder::Released, conn).await?;
    let mut restocked = Vec::new();
    if current.stock_holder.holds_stock() {
        for item in orders::fetch_order_items(order_id, conn).await? {
            let stock = products::release(item.product_id, item.quantity, conn).await?;
            restocked.push(Restock { product_id: item.product_id, quantity: item.quantity, stock });
        }
    } else {
        debug!("🗃️ Order {order_id} holds no stock. Nothing to restock");
    }
    if current.stock_holder == StockHolder::Cart {
        carts::clear_cart(order.user_id, conn).await?;
    }
    debug!("🗃️ Order {order_id} cancelled (was {previous_status}). {} lines returned to stock", restocked.len());
    Ok(CancelledOrder { order, previous_status, restocked })
}
