use thiserror::Error;

use crate::db_types::{OrderId, OrderStatusType};

#[derive(Debug, Clone, Error)]
pub enum SettlementError {
    /// The payment gateway could not tell us the status of the payment. Nothing was changed, and the settlement can be
    /// retried later.
    #[error("The payment status could not be determined: {0}")]
    Indeterminate(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Order {0} is {1}. Only pending orders can be paid by transfer")]
    OrderNotPending(OrderId, OrderStatusType),
    #[error("Could not read from the store: {0}")]
    StoreError(String),
}
