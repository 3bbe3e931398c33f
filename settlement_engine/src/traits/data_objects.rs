use serde::{Deserialize, Serialize};
use serde_json::Value;
use shop_common::PaymentStatusCode;

use crate::db_types::{Client, ClientSegment, Clp, Order, OrderId, OrderLine, OrderStatusType, StockAdjustment};

/// What the payment gateway reports for a payment token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayPayment {
    /// The commerce order id the payment was created for.
    pub order_id: OrderId,
    pub status: PaymentStatusCode,
    pub amount: Clp,
    pub payer: Option<String>,
    pub payment_data: Option<Value>,
}

impl GatewayPayment {
    pub fn new<O: Into<OrderId>>(order_id: O, status: PaymentStatusCode, amount: Clp) -> Self {
        Self { order_id: order_id.into(), status, amount, payer: None, payment_data: None }
    }

    pub fn with_payer<S: Into<String>>(mut self, payer: S) -> Self {
        self.payer = Some(payer.into());
        self
    }
}

/// Everything that changed when an order was settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettledOrder {
    /// The order, in its new `Processing` state.
    pub order: Order,
    pub lines: Vec<OrderLine>,
    pub stock_adjustments: Vec<StockAdjustment>,
    /// The client, with recomputed spend, order count and segment.
    pub client: Client,
    pub previous_segment: ClientSegment,
}

impl SettledOrder {
    pub fn product_name(&self, product_id: i64) -> Option<&str> {
        self.stock_adjustments.iter().find(|a| a.product_id == product_id).map(|a| a.product_name.as_str())
    }

    pub fn segment_changed(&self) -> bool {
        self.previous_segment != self.client.segment
    }
}

/// A line of an order, with the product name resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Clp,
}

impl OrderItem {
    pub fn line_total(&self) -> Clp {
        self.unit_price * self.quantity
    }
}

/// What a buyer paying by bank transfer needs to know: the order, what is in it, and how much to transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferInstructions {
    pub order: Order,
    pub client: Client,
    pub items: Vec<OrderItem>,
    pub shipping: Clp,
}

impl TransferInstructions {
    /// The order total plus shipping.
    pub fn amount_due(&self) -> Clp {
        self.order.total + self.shipping
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettleOrderResult {
    /// The order moved from `Pending` to `Processing` and all side effects were committed.
    Settled(SettledOrder),
    /// Somebody else got there first. The order is not `Pending` and nothing was changed.
    AlreadySettled(OrderStatusType),
    NotFound,
}

/// The result of a best-effort notification. Senders report failure here instead of returning an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationResult {
    pub success: bool,
    pub error: Option<String>,
}

impl NotificationResult {
    pub fn sent() -> Self {
        Self { success: true, error: None }
    }

    pub fn failed<S: Into<String>>(error: S) -> Self {
        Self { success: false, error: Some(error.into()) }
    }
}
