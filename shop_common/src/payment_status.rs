use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// The status codes reported by the payment gateway for a payment token.
///
/// The gateway uses plain integers on the wire, so this type (de)serializes to and from its numeric code. Codes that
/// this version does not know about are preserved in `Unknown` rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum PaymentStatusCode {
    /// The buyer has not completed the payment yet.
    Pending,
    /// The payment was approved.
    Paid,
    /// The payment was rejected by the gateway or the issuer.
    Rejected,
    /// The payment was annulled.
    Voided,
    Unknown(i32),
}

impl PaymentStatusCode {
    pub fn code(&self) -> i32 {
        match self {
            Self::Pending => 1,
            Self::Paid => 2,
            Self::Rejected => 3,
            Self::Voided => 4,
            Self::Unknown(c) => *c,
        }
    }

    pub fn is_paid(&self) -> bool {
        matches!(self, Self::Paid)
    }
}

impl From<i32> for PaymentStatusCode {
    fn from(value: i32) -> Self {
        match value {
            1 => Self::Pending,
            2 => Self::Paid,
            3 => Self::Rejected,
            4 => Self::Voided,
            c => Self::Unknown(c),
        }
    }
}

impl From<PaymentStatusCode> for i32 {
    fn from(value: PaymentStatusCode) -> Self {
        value.code()
    }
}

impl Display for PaymentStatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending (1)"),
            Self::Paid => write!(f, "Paid (2)"),
            Self::Rejected => write!(f, "Rejected (3)"),
            Self::Voided => write!(f, "Voided (4)"),
            Self::Unknown(c) => write!(f, "Unknown ({c})"),
        }
    }
}
