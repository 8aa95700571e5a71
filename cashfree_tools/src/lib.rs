//! Client for the parts of the Cashfree PG API that the store uses: creating an order and reading back the payment
//! session it opens.
mod api;
mod config;
mod error;

mod data_objects;
pub mod helpers;

pub use api::CashfreeApi;
pub use config::{CashfreeConfig, SANDBOX_MINIMUM_AMOUNT};
pub use data_objects::{CreateOrderRequest, CreateOrderResponse, CustomerDetails, OrderMeta, PaymentUrls};
pub use error::CashfreeApiError;
