//! # Backend and collaborator contracts
//!
//! The settlement engine is agnostic of the storage backend and of the services it talks to. Each dependency is
//! described by a trait here, and [`crate::SettlementApi`] is generic over them.
//!
//! * [`SettlementDatabase`] performs the atomic settlement of an order in the persistent store.
//! * [`OrderManagement`] provides read-only access to orders, clients and products.
//! * [`PaymentStatusLookup`] resolves a payment token into the gateway's view of the payment.
//! * [`OrderNotifier`] sends the buyer their order confirmation, or the instructions for paying by bank transfer.
mod order_management;
mod order_notifier;
mod payment_status_lookup;
mod settlement_database;

mod data_objects;

pub use data_objects::{
    GatewayPayment,
    NotificationResult,
    OrderItem,
    SettleOrderResult,
    SettledOrder,
    TransferInstructions,
};
pub use order_management::OrderManagement;
pub use order_notifier::OrderNotifier;
pub use payment_status_lookup::{GatewayError, PaymentStatusLookup};
pub use settlement_database::SettlementDatabase;
