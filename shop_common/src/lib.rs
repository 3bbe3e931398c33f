mod clp;
mod helpers;
mod payment_status;
mod secret;

pub mod op;

pub use clp::{Clp, ClpConversionError, CLP_CURRENCY_CODE};
pub use helpers::parse_boolean_flag;
pub use payment_status::PaymentStatusCode;
pub use secret::Secret;
