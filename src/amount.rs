//! Monetary amounts expressed in integer cents.
//!
//! ACH records carry amounts as zero-padded cent counts. `rust_decimal` is
//! used at the edges to convert between cents and dollar strings without
//! floating-point error.

use crate::error::{AchError, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

/// A non-negative amount of money held as a count of cents.
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
/// use nacha_ach::Amount;
///
/// let amount = Amount::from_str("10.5").unwrap();
/// assert_eq!(amount.cents(), 1050);
/// assert_eq!(amount.to_string(), "10.50");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(u64);

impl Amount {
    /// Number of decimal places in a dollar rendering.
    pub const SCALE: u32 = 2;

    /// Zero value.
    pub const ZERO: Self = Amount(0);

    /// Creates an amount from a count of cents.
    pub const fn from_cents(cents: u64) -> Self {
        Amount(cents)
    }

    /// Returns the count of cents.
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Returns `true` if this value is zero.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Converts to a dollar-denominated decimal with two places.
    pub fn to_decimal(&self) -> Decimal {
        Decimal::from_i128_with_scale(i128::from(self.0), Self::SCALE)
    }

    /// Converts a dollar-denominated decimal to cents.
    ///
    /// Fails for negative values or values with sub-cent precision.
    pub fn from_decimal(value: Decimal) -> Result<Self> {
        let invalid = || AchError::InvalidAmount(value.to_string());
        if value.is_sign_negative() && !value.is_zero() {
            return Err(invalid());
        }
        let cents = value.checked_mul(Decimal::ONE_HUNDRED).ok_or_else(invalid)?;
        if cents.fract() != Decimal::ZERO {
            return Err(invalid());
        }
        cents.to_u64().map(Amount).ok_or_else(invalid)
    }
}

impl FromStr for Amount {
    type Err = AchError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let decimal =
            Decimal::from_str(trimmed).map_err(|_| AchError::InvalidAmount(trimmed.to_string()))?;
        Amount::from_decimal(decimal)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.to_decimal())
    }
}

impl Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Amount(self.0 + rhs.0)
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, Add::add)
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
