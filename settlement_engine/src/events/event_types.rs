use serde::{Deserialize, Serialize};

use crate::traits::{GatewayPayment, SettledOrder};

/// Published after an order has been settled and the settlement committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSettledEvent {
    pub settled: SettledOrder,
    pub payment: GatewayPayment,
}

impl OrderSettledEvent {
    pub fn new(settled: SettledOrder, payment: GatewayPayment) -> Self {
        Self { settled, payment }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventType {
    OrderSettled(OrderSettledEvent),
}
