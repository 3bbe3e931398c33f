//! A small client for the Flow payment gateway.
//!
//! Every call to the gateway is a form-encoded POST whose parameters are signed with [`FlowSigner`]. Only the two
//! operations the shop needs are implemented: creating a payment and looking up the status of a payment token.
mod api;
mod config;
mod error;
mod signature;

mod data_objects;

pub use api::FlowApi;
pub use config::{FlowConfig, DEFAULT_FLOW_API_URL};
pub use data_objects::{NewPaymentRequest, PaymentCreated, PaymentStatus};
pub use error::FlowApiError;
pub use signature::{FlowSigner, SIGNATURE_PARAM};
