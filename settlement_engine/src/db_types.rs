use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use serde::{Deserialize, Serialize};
pub use shop_common::Clp;
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid conversion: {0}")]
pub struct ConversionError(String);

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
/// The life cycle of an order. Settlement only ever moves an order from `Pending` to `Processing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum OrderStatusType {
    /// The order was placed at checkout and is waiting for payment.
    Pending,
    /// Payment has been confirmed and the order is being prepared.
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatusType {
    /// The states whose orders count towards a client's spend and order count.
    pub const SETTLED: [OrderStatusType; 3] = [Self::Processing, Self::Shipped, Self::Delivered];

    pub fn is_settled(&self) -> bool {
        Self::SETTLED.contains(self)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "Pending"),
            OrderStatusType::Processing => write!(f, "Processing"),
            OrderStatusType::Shipped => write!(f, "Shipped"),
            OrderStatusType::Delivered => write!(f, "Delivered"),
            OrderStatusType::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Processing" => Ok(Self::Processing),
            "Shipped" => Ok(Self::Shipped),
            "Delivered" => Ok(Self::Delivered),
            "Cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------    ClientSegment      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum ClientSegment {
    #[default]
    New,
    Frequent,
    Inactive,
    HighTicket,
}

impl Display for ClientSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientSegment::New => write!(f, "New"),
            ClientSegment::Frequent => write!(f, "Frequent"),
            ClientSegment::Inactive => write!(f, "Inactive"),
            ClientSegment::HighTicket => write!(f, "HighTicket"),
        }
    }
}

impl FromStr for ClientSegment {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "New" => Ok(Self::New),
            "Frequent" => Ok(Self::Frequent),
            "Inactive" => Ok(Self::Inactive),
            "HighTicket" => Ok(Self::HighTicket),
            s => Err(ConversionError(format!("Invalid client segment: {s}"))),
        }
    }
}

impl From<String> for ClientSegment {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid client segment: {value}. But this conversion cannot fail. Defaulting to New");
            ClientSegment::New
        })
    }
}

//--------------------------------------     SegmentRules      ---------------------------------------------------------
pub const DEFAULT_HIGH_TICKET_THRESHOLD: i64 = 100_000;
pub const DEFAULT_FREQUENT_ORDER_COUNT: i64 = 3;

/// Thresholds used to classify a client after each settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentRules {
    pub high_ticket_threshold: Clp,
    pub frequent_order_count: i64,
}

impl Default for SegmentRules {
    fn default() -> Self {
        Self {
            high_ticket_threshold: Clp::from(DEFAULT_HIGH_TICKET_THRESHOLD),
            frequent_order_count: DEFAULT_FREQUENT_ORDER_COUNT,
        }
    }
}

impl SegmentRules {
    /// `HighTicket` wins over `Frequent`. A client that qualifies for neither keeps the segment they already had.
    pub fn evaluate(&self, total_spent: Clp, order_count: i64, prior: ClientSegment) -> ClientSegment {
        if total_spent >= self.high_ticket_threshold {
            ClientSegment::HighTicket
        } else if order_count >= self.frequent_order_count {
            ClientSegment::Frequent
        } else {
            prior
        }
    }
}

/// Orders of at least this much ship for free.
pub const FREE_SHIPPING_THRESHOLD: i64 = 50_000;
pub const FLAT_SHIPPING_FEE: i64 = 5_990;

/// The shipping fee charged on top of an order subtotal.
pub fn shipping_fee(subtotal: Clp) -> Clp {
    if subtotal >= Clp::from(FREE_SHIPPING_THRESHOLD) {
        Clp::default()
    } else {
        Clp::from(FLAT_SHIPPING_FEE)
    }
}

/// Stock left after selling `quantity` units. Stock never goes negative; overselling simply empties it.
pub fn stock_after_sale(stock: i64, quantity: i64) -> i64 {
    stock.saturating_sub(quantity).max(0)
}

//--------------------------------------        OrderId        ---------------------------------------------------------
/// The commerce order id. This is the id handed to the payment gateway, and the one it hands back.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The short, human-friendly reference used in customer communications: the last 8 characters, upper-cased.
    pub fn short_ref(&self) -> String {
        let chars = self.0.chars().collect::<Vec<char>>();
        let start = chars.len().saturating_sub(8);
        chars[start..].iter().collect::<String>().to_uppercase()
    }
}

//--------------------------------------        Order          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_id: OrderId,
    pub client_id: i64,
    pub total: Clp,
    pub status: OrderStatusType,
    pub shipping_address: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line of an order. `unit_price` is a snapshot of the product price when the order was placed.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: i64,
    pub order_id: OrderId,
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: Clp,
}

impl OrderLine {
    pub fn line_total(&self) -> Clp {
        self.unit_price * self.quantity
    }
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_id: OrderId,
    pub client_id: i64,
    pub total: Clp,
    pub shipping_address: Option<String>,
    pub notes: Option<String>,
    pub lines: Vec<NewOrderLine>,
}

impl NewOrder {
    /// Creates a new order whose total is the sum of its lines.
    pub fn new(order_id: OrderId, client_id: i64, lines: Vec<NewOrderLine>) -> Self {
        let total = lines.iter().map(|l| l.unit_price * l.quantity).sum();
        Self { order_id, client_id, total, shipping_address: None, notes: None, lines }
    }

    pub fn with_total(mut self, total: Clp) -> Self {
        self.total = total;
        self
    }

    pub fn with_shipping_address<S: Into<String>>(mut self, address: S) -> Self {
        self.shipping_address = Some(address.into());
        self
    }

    pub fn with_notes<S: Into<String>>(mut self, notes: S) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewOrderLine {
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: Clp,
}

impl NewOrderLine {
    pub fn new(product_id: i64, quantity: i64, unit_price: Clp) -> Self {
        Self { product_id, quantity, unit_price }
    }
}

//--------------------------------------       Product         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price: Clp,
    pub stock: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub price: Clp,
    pub stock: i64,
}

impl NewProduct {
    pub fn new<S: Into<String>>(name: S, price: Clp, stock: i64) -> Self {
        Self { name: name.into(), price, stock }
    }
}

/// The change made to a product's stock while settling an order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAdjustment {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub old_stock: i64,
    pub new_stock: i64,
}

//--------------------------------------        Client         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Client {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub total_spent: Clp,
    pub segment: ClientSegment,
    pub order_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewClient {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

impl NewClient {
    pub fn new<S: Into<String>>(name: S, email: S) -> Self {
        Self { name: name.into(), email: email.into(), phone: None }
    }

    pub fn with_phone<S: Into<String>>(mut self, phone: S) -> Self {
        self.phone = Some(phone.into());
        self
    }
}
