//! # Settlement API
//!
//! [`SettlementApi`] is the single procedure shared by every entry point that can settle an order: the gateway's
//! server-to-server confirmation and the buyer's browser verification. Both call [`SettlementApi::settle`] with the
//! payment token they received, and both are safe to call any number of times, concurrently or not.
//!
//! The API is created by supplying a database backend, a gateway client and a notifier:
//!
//! ```rust,ignore
//! use settlement_engine::{SettlementApi, SqliteDatabase, events::EventProducers, db_types::SegmentRules};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! let api = SettlementApi::new(db, gateway, mailer, SegmentRules::default(), EventProducers::default());
//! let settlement = api.settle(&token).await?;
//! ```
mod errors;
mod order_settlement_api;
mod settlement_objects;

pub use errors::SettlementError;
pub use order_settlement_api::SettlementApi;
pub use settlement_objects::{Settlement, SettlementOutcome};
