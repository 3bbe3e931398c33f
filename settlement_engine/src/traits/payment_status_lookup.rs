use thiserror::Error;

use crate::traits::GatewayPayment;

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("The payment gateway could not be reached: {0}")]
    Unreachable(String),
    #[error("The payment gateway rejected the request. Error {status}. {message}")]
    Rejected { status: u16, message: String },
    #[error("The payment gateway sent a response we do not understand: {0}")]
    InvalidResponse(String),
}

/// Resolves an opaque payment token into the gateway's view of the payment.
///
/// Implementations must not mutate anything. A failed lookup tells the caller nothing about the payment, so the
/// caller must treat the outcome as unknown and leave its own state untouched.
#[allow(async_fn_in_trait)]
pub trait PaymentStatusLookup {
    async fn payment_status(&self, token: &str) -> Result<GatewayPayment, GatewayError>;
}
