use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use serde_json::json;
use store_engine::{
    traits::{CartError, CustomerError, GatewayError, InventoryError, OrderError},
    CheckoutError,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("Invalid quantity. {0}")]
    InvalidQuantity(String),
    #[error("The cart is empty. {0}")]
    EmptyCart(String),
    #[error("The order cannot make that change. {0}")]
    InvalidTransition(String),
    #[error("Only {available} units of product {product_id} are available, but {requested} were requested")]
    InsufficientStock { product_id: i64, requested: i64, available: i64 },
    #[error("The payment gateway could not be used. {0}")]
    PaymentGatewayError(String),
    #[error("The payment gateway did not respond in time")]
    PaymentGatewayTimeout,
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidQuantity(_) => StatusCode::BAD_REQUEST,
            Self::EmptyCart(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
                AuthError::CouldNotIssueToken(_) => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::UNAUTHORIZED,
            },
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::InvalidTransition(_) => StatusCode::CONFLICT,
            Self::InsufficientStock { .. } => StatusCode::CONFLICT,
            Self::PaymentGatewayError(_) => StatusCode::BAD_GATEWAY,
            Self::PaymentGatewayTimeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            Self::InsufficientStock { product_id, available, .. } => {
                json!({ "error": self.to_string(), "productId": product_id, "available": available })
            },
            _ => json!({ "error": self.to_string() }),
        };
        HttpResponse::build(self.status_code()).insert_header(ContentType::json()).body(body.to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No access token was provided.")]
    MissingToken,
    #[error("Access token is not in the correct format. {0}")]
    PoorlyFormattedToken(String),
    #[error("Access token is invalid. {0}")]
    ValidationError(String),
    #[error("Access token has expired.")]
    ExpiredToken,
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("Could not issue an access token. {0}")]
    CouldNotIssueToken(String),
}

impl From<InventoryError> for ServerError {
    fn from(e: InventoryError) -> Self {
        match e {
            InventoryError::ProductNotFound(_) => Self::NoRecordFound(e.to_string()),
            InventoryError::InvalidQuantity(_) | InventoryError::ValueOverflow { .. } => {
                Self::InvalidQuantity(e.to_string())
            },
            InventoryError::InsufficientStock { product_id, requested, available } => {
                Self::InsufficientStock { product_id, requested, available }
            },
            InventoryError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}

impl From<CartError> for ServerError {
    fn from(e: CartError) -> Self {
        match e {
            CartError::Inventory(e) => e.into(),
            CartError::InvalidQuantity(_) => Self::InvalidQuantity(e.to_string()),
            CartError::CustomerNotFound(_) | CartError::CartNotFound { .. } | CartError::ItemNotInCart { .. } => {
                Self::NoRecordFound(e.to_string())
            },
            CartError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}

impl From<OrderError> for ServerError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::OrderNotFound(_) | OrderError::CustomerNotFound(_) => Self::NoRecordFound(e.to_string()),
            OrderError::EmptyCart(_) => Self::EmptyCart(e.to_string()),
            OrderError::InvalidTransition { .. } => Self::InvalidTransition(e.to_string()),
            OrderError::AccessDenied { .. } => Self::InsufficientPermissions(e.to_string()),
            OrderError::Inventory(e) => e.into(),
            OrderError::Cart(e) => e.into(),
            OrderError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}

impl From<CustomerError> for ServerError {
    fn from(e: CustomerError) -> Self {
        match e {
            CustomerError::EmailAlreadyRegistered(_) => Self::InvalidRequestBody(e.to_string()),
            CustomerError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}

impl From<GatewayError> for ServerError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::InvalidRequest(_) => Self::InvalidRequestBody(e.to_string()),
            GatewayError::Timeout => Self::PaymentGatewayTimeout,
            GatewayError::RequestFailed { .. }
            | GatewayError::Unavailable(_)
            | GatewayError::InvalidResponse(_)
            | GatewayError::NoPayableArtifact(_) => {
                error!("💳️ {e}");
                Self::PaymentGatewayError(e.to_string())
            },
        }
    }
}

impl From<CheckoutError> for ServerError {
    fn from(e: CheckoutError) -> Self {
        match e {
            CheckoutError::Order(e) => e.into(),
            CheckoutError::Customer(e) => e.into(),
            CheckoutError::Gateway(e) => e.into(),
        }
    }
}
