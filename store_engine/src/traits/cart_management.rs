use thiserror::Error;

use crate::traits::{
    data_objects::{CartLine, CartMutation},
    InventoryError,
};

/// One cart per customer. Every mutation moves stock through the inventory ledger in the same atomic unit of work
/// as the cart change itself, so a unit sitting in a cart is always a unit missing from stock.
#[allow(async_fn_in_trait)]
pub trait CartManagement: Clone {
    /// Reserves `quantity` more units of the product and adds them to the customer's cart, creating the cart or the
    /// cart line as required.
    async fn add_item(&self, user_id: i64, product_id: i64, quantity: i64) -> Result<CartMutation, CartError>;

    /// Sets the cart line for the product to exactly `quantity` units.
    ///
    /// The current quantity is released first and `quantity` fresh units are reserved afterwards. If the reservation
    /// fails, the whole operation is rolled back and the original quantity stays reserved. A quantity of zero removes
    /// the line.
    async fn update_quantity(&self, user_id: i64, product_id: i64, quantity: i64) -> Result<CartMutation, CartError>;

    /// Deletes every line in the cart **without** returning stock. Only use this once the reservation has been handed
    /// over to a paid order.
    async fn clear_cart(&self, user_id: i64) -> Result<u64, CartError>;

    /// The live cart contents, with current product details. The order of lines is the order they were first added.
    async fn fetch_cart_lines(&self, user_id: i64) -> Result<Vec<CartLine>, CartError>;
}

#[derive(Debug, Clone, Error)]
pub enum CartError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i64),
    #[error("Customer {0} does not exist")]
    CustomerNotFound(i64),
    #[error("Customer {user_id} has no cart")]
    CartNotFound { user_id: i64 },
    #[error("Product {product_id} is not in the cart of customer {user_id}")]
    ItemNotInCart { user_id: i64, product_id: i64 },
    #[error("{0}")]
    Inventory(#[from] InventoryError),
}

impl From<sqlx::Error> for CartError {
    fn from(e: sqlx::Error) -> Self {
        CartError::DatabaseError(e.to_string())
    }
}
