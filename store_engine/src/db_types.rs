//! Data types that are stored in, or read from, the store database.
//!
//! Relations between records are expressed with foreign ids only. An `OrderItem` knows its `OrderId` and its product
//! id; resolving either into a full record is a separate lookup.
use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
pub use store_common::Money;
use thiserror::Error;

/// Prefix the payment gateway sees in front of every local order id.
pub const GATEWAY_ORDER_PREFIX: &str = "ORD_";

#[derive(Debug, Clone, Error)]
#[error("Conversion error: {0}")]
pub struct ConversionError(pub String);

//--------------------------------------          Role         ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Admin,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "USER"),
            Role::Admin => write!(f, "ADMIN"),
        }
    }
}

impl FromStr for Role {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "USER" => Ok(Self::User),
            "ADMIN" => Ok(Self::Admin),
            _ => Err(ConversionError(format!("Invalid role: {s}"))),
        }
    }
}

/// Returns true if a principal holding `role` may access a resource guarded by `required`.
///
/// An empty requirement set only asks for an authenticated principal.
pub fn authorize(role: Role, required: &[Role]) -> bool {
    required.is_empty() || required.contains(&role)
}

//--------------------------------------       Customer        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
}

impl NewCustomer {
    pub fn new<S: Into<String>>(name: S, email: S) -> Self {
        Self { name: name.into(), email: email.into(), phone: None, role: Role::User }
    }

    pub fn with_phone<S: Into<String>>(mut self, phone: S) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }
}

//--------------------------------------        Product        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price: Money,
    pub stock: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub price: Money,
    pub stock: i64,
    #[serde(default)]
    pub images: Vec<NewProductImage>,
}

impl NewProduct {
    pub fn new<S: Into<String>>(name: S, price: Money, stock: i64) -> Self {
        Self { name: name.into(), price, stock, images: Vec::new() }
    }

    pub fn with_image<S: Into<String>>(mut self, url: S, is_main: bool) -> Self {
        self.images.push(NewProductImage { url: url.into(), is_main });
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProductImage {
    pub url: String,
    pub is_main: bool,
}

//--------------------------------------       Cart            ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Cart {
    pub id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct CartItem {
    pub id: i64,
    pub cart_id: i64,
    pub product_id: i64,
    pub quantity: i64,
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatusType {
    /// The order has been created from the cart and is waiting for payment. The cart still holds the stock.
    Pending,
    /// The gateway confirmed payment. The reservation now belongs to the order.
    Paid,
    /// The gateway reported a failed or abandoned payment.
    Failed,
    /// Cancelled by the customer, an administrator, or the reservation expiry job.
    Cancelled,
    Shipped,
    Delivered,
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatusType::Pending => "PENDING",
            OrderStatusType::Paid => "PAID",
            OrderStatusType::Failed => "FAILED",
            OrderStatusType::Cancelled => "CANCELLED",
            OrderStatusType::Shipped => "SHIPPED",
            OrderStatusType::Delivered => "DELIVERED",
        };
        f.write_str(s)
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "PAID" => Ok(Self::Paid),
            "FAILED" => Ok(Self::Failed),
            "CANCELLED" => Ok(Self::Cancelled),
            "SHIPPED" => Ok(Self::Shipped),
            "DELIVERED" => Ok(Self::Delivered),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------        OrderId        ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub i64);

impl FromStr for OrderId {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(Self).map_err(|e| ConversionError(format!("Invalid order id {s}. {e}")))
    }
}

impl From<i64> for OrderId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn value(&self) -> i64 {
        self.0
    }

    /// The order reference the payment gateway knows this order by.
    pub fn gateway_order_id(&self) -> String {
        format!("{GATEWAY_ORDER_PREFIX}{}", self.0)
    }

    /// Strips the gateway prefix from `gateway_id` and parses the remainder. Returns `None` for anything that does not
    /// refer to a local order id.
    pub fn from_gateway_order_id(gateway_id: &str) -> Option<Self> {
        let local = gateway_id.trim();
        let local = local.strip_prefix(GATEWAY_ORDER_PREFIX).unwrap_or(local);
        local.parse::<i64>().ok().filter(|id| *id > 0).map(Self)
    }
}

//--------------------------------------      StockHolder      ---------------------------------------------------------
/// Who holds the stock behind an order's lines. Every unit leaves the ledger exactly once, so at most one of the
/// customer's cart and the order may count it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum StockHolder {
    /// The customer's cart still reserves the units. Cancelling releases them and empties the cart.
    #[default]
    Cart,
    /// The order consumed the units when it was paid, shipped or delivered.
    Order,
    /// Nothing backs the order any more: it was cancelled, or the cart moved on after a failed payment.
    Released,
}

impl StockHolder {
    /// Whether cancelling the order must return its lines to stock.
    pub fn holds_stock(&self) -> bool {
        !matches!(self, StockHolder::Released)
    }
}

impl Display for StockHolder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StockHolder::Cart => "CART",
            StockHolder::Order => "ORDER",
            StockHolder::Released => "RELEASED",
        };
        f.write_str(s)
    }
}

//--------------------------------------         Order         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: i64,
    /// Fixed when the order is created. Never recomputed from product prices.
    pub total: Money,
    pub status: OrderStatusType,
    pub shipping_address: Option<String>,
    pub transaction_id: Option<String>,
    #[serde(skip)]
    pub stock_holder: StockHolder,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: OrderId,
    pub product_id: i64,
    pub quantity: i64,
    pub price_at_purchase: Money,
}

//--------------------------------------        Payment        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Payment {
    pub id: i64,
    pub order_id: OrderId,
    pub gateway_payment_id: Option<String>,
    pub amount: Money,
    pub currency: String,
    pub status: OrderStatusType,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub order_id: OrderId,
    pub gateway_payment_id: Option<String>,
    pub amount: Money,
    pub status: OrderStatusType,
}
