//! Order Settlement Engine
//!
//! The settlement engine moves paid shop orders from `Pending` to `Processing`. It takes the stock out of inventory
//! and brings the buyer's spend, order count and segment up to date. It is provider-agnostic.
//!
//! The library is divided into three main sections:
//! 1. Database management and control (`db`). SQLite is the supported backend. The data types used in the
//!    database are defined in the [`db_types`] module and are public.
//! 2. The contracts for the backend and for the outside services the engine depends on ([`traits`]). Backends, payment
//!    gateways and notifiers implement these traits to plug into the engine.
//! 3. The public API ([`SettlementApi`]). It is the single settlement procedure shared by the gateway's webhook and
//!    the buyer-facing verification flow.
//!
//! The engine also publishes events when an order is settled. A simple hook system ([`events`]) lets you subscribe to
//! these events and perform custom actions, such as sending a WhatsApp message to the buyer.
mod db;

pub mod db_types;
pub mod events;
mod settlement_api;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use db::sqlite::{SqliteDatabase, SqliteDatabaseError};
pub use settlement_api::{Settlement, SettlementApi, SettlementError, SettlementOutcome};
pub use traits::{
    GatewayError,
    GatewayPayment,
    NotificationResult,
    OrderItem,
    OrderManagement,
    OrderNotifier,
    PaymentStatusLookup,
    SettleOrderResult,
    SettledOrder,
    SettlementDatabase,
    TransferInstructions,
};
