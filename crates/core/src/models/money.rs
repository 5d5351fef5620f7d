use std::fmt;
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// Number of minor units per major unit (cents per dollar).
pub const MINOR_UNITS_PER_MAJOR: i64 = 100;

/// Decimal places kept by [`Money`].
pub const MINOR_UNIT_SCALE: u32 = 2;

/// A monetary amount stored as a signed count of minor units (cents).
///
/// Balances and transaction amounts never touch floating point. Conversion
/// from a decimal major-unit amount rounds half away from zero, so
/// `12.345` becomes `1235` and `-0.005` becomes `-1` on every platform.
///
/// Serializes as the bare integer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_minor(minor_units: i64) -> Self {
        Self(minor_units)
    }

    /// Convert a major-unit decimal amount to minor units, rounding half away from zero.
    pub fn from_major(amount: Decimal) -> Result<Self, CoreError> {
        let scaled = amount
            .checked_mul(Decimal::from(MINOR_UNITS_PER_MAJOR))
            .ok_or_else(|| CoreError::InvalidAmount(format!("{amount} is out of range")))?;
        let rounded = scaled.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        rounded
            .to_i64()
            .map(Self)
            .ok_or_else(|| CoreError::InvalidAmount(format!("{amount} is out of range")))
    }

    /// Parse a decimal string such as `"42.10"` or `"-7"` into minor units.
    pub fn parse_major(input: &str) -> Result<Self, CoreError> {
        let trimmed = input.trim();
        let amount = Decimal::from_str(trimmed)
            .map_err(|e| CoreError::InvalidAmount(format!("{trimmed:?}: {e}")))?;
        Self::from_major(amount)
    }

    pub const fn minor_units(self) -> i64 {
        self.0
    }

    /// The amount in major units, always with two decimal places.
    pub fn to_major(self) -> Decimal {
        Decimal::new(self.0, MINOR_UNIT_SCALE)
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    pub fn checked_neg(self) -> Option<Money> {
        self.0.checked_neg().map(Money)
    }

    pub fn abs(self) -> Money {
        Money(self.0.saturating_abs())
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_major())
    }
}

impl FromStr for Money {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_major(s)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        Money(iter.map(|m| m.0).sum())
    }
}
