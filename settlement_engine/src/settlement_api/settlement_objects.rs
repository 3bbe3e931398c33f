use std::fmt::Display;

use serde::{Deserialize, Serialize};
use shop_common::PaymentStatusCode;

use crate::{
    db_types::OrderStatusType,
    traits::{GatewayPayment, NotificationResult, SettledOrder},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SettlementOutcome {
    /// The order moved to `Processing`. The notification result is informational only.
    Settled(SettledOrder, NotificationResult),
    /// The gateway does not report the payment as paid. Nothing was changed.
    NotPaid(PaymentStatusCode),
    /// The payment refers to an order we do not know about. Nothing was changed.
    OrderNotFound,
    /// The order had already left `Pending`. Nothing was changed.
    AlreadySettled(OrderStatusType),
    /// The store failed while settling and the transaction was rolled back. The order is still `Pending`.
    StoreFailure(String),
}

impl SettlementOutcome {
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Settled(..))
    }
}

impl Display for SettlementOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Settled(s, _) => write!(f, "Settled (order {})", s.order.order_id),
            Self::NotPaid(status) => write!(f, "Not paid: {status}"),
            Self::OrderNotFound => write!(f, "Order not found"),
            Self::AlreadySettled(status) => write!(f, "Already settled ({status})"),
            Self::StoreFailure(e) => write!(f, "Store failure: {e}"),
        }
    }
}

/// The gateway's report of the payment, together with what settlement did about it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    pub payment: GatewayPayment,
    pub outcome: SettlementOutcome,
}
