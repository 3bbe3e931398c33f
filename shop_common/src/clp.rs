use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const CLP_CURRENCY_CODE: &str = "CLP";

//--------------------------------------        Clp          ---------------------------------------------------------
/// An amount of Chilean pesos. The peso has no minor unit in practice, so amounts are whole numbers.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Clp(i64);

op!(binary Clp, Add, add);
op!(binary Clp, Sub, sub);
op!(inplace Clp, SubAssign, sub_assign);
op!(unary Clp, Neg, neg);

impl Mul<i64> for Clp {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Clp {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in pesos: {0}")]
pub struct ClpConversionError(String);

impl From<i64> for Clp {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<u64> for Clp {
    type Error = ClpConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(ClpConversionError(format!("Value {value} is too large to convert to Clp")))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for Clp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(c);
        }
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{sign}${grouped}")
    }
}

impl Clp {
    pub fn value(&self) -> i64 {
        self.0
    }

    /// The gateway reports amounts as JSON numbers, which may carry a fractional part. Round to the nearest peso.
    pub fn from_gateway_amount(amount: f64) -> Result<Self, ClpConversionError> {
        if !amount.is_finite() || amount.abs() >= i64::MAX as f64 {
            return Err(ClpConversionError(format!("{amount} is not a valid amount")));
        }
        #[allow(clippy::cast_possible_truncation)]
        Ok(Self(amount.round() as i64))
    }
}
