use thiserror::Error;

use crate::db_types::{Customer, NewCustomer};

/// Identity records the engine needs to read. Authentication itself happens elsewhere; the engine only needs to know
/// who owns a cart or an order, and the contact details the payment gateway asks for.
#[allow(async_fn_in_trait)]
pub trait CustomerManagement: Clone {
    /// Creates the customer record together with their (empty) cart.
    async fn register_customer(&self, customer: NewCustomer) -> Result<Customer, CustomerError>;

    async fn fetch_customer(&self, customer_id: i64) -> Result<Option<Customer>, CustomerError>;
}

#[derive(Debug, Clone, Error)]
pub enum CustomerError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("A customer with email {0} is already registered")]
    EmailAlreadyRegistered(String),
}

impl From<sqlx::Error> for CustomerError {
    fn from(e: sqlx::Error) -> Self {
        CustomerError::DatabaseError(e.to_string())
    }
}
