use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const NAIRA_CURRENCY_CODE: &str = "NGN";
const KOBO_PER_NAIRA: i64 = 100;

//--------------------------------------       Naira         ---------------------------------------------------------
/// An amount of money in whole naira.
///
/// Catalog and order amounts are always whole naira. The gateway works in kobo, so use [`Naira::to_kobo`] and
/// [`Naira::from_kobo`] at that boundary only.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Naira(i64);

op!(binary Naira, Add, add);
op!(binary Naira, Sub, sub);
op!(inplace Naira, AddAssign, add_assign);
op!(inplace Naira, SubAssign, sub_assign);
op!(unary Naira, Neg, neg);

impl Mul<i64> for Naira {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Naira {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl<'a> Sum<&'a Naira> for Naira {
    fn sum<I: Iterator<Item = &'a Naira>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in naira: {0}")]
pub struct NairaConversionError(String);

impl From<i64> for Naira {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<u64> for Naira {
    type Error = NairaConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        i64::try_from(value)
            .map(Self)
            .map_err(|_| NairaConversionError(format!("Value {value} is too large to convert to Naira")))
    }
}

impl Display for Naira {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(c);
        }
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{sign}₦{grouped}")
    }
}

impl Naira {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64
    }

    /// The amount in kobo, the minor unit the payment gateway expects.
    pub fn to_kobo(&self) -> i64 {
        self.0 * KOBO_PER_NAIRA
    }

    /// Converts a kobo amount reported by the gateway into whole naira. Fractional naira are truncated.
    pub fn from_kobo(kobo: i64) -> Self {
        Self(kobo / KOBO_PER_NAIRA)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// `self * rhs`, or `None` if the result overflows.
    pub fn checked_mul(self, rhs: i64) -> Option<Self> {
        self.0.checked_mul(rhs).map(Self)
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Like [`Naira::to_kobo`], but `None` if the amount is too large to express in kobo.
    pub fn checked_to_kobo(&self) -> Option<i64> {
        self.0.checked_mul(KOBO_PER_NAIRA)
    }
}
