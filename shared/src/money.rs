//! Fixed-point money
//!
//! Every monetary value in the engine is an integer count of minor currency
//! units (cents). `rust_decimal` is only used at the boundary, to parse
//! major-unit amounts and to apply percentage fees with explicit rounding.

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Neg;
use thiserror::Error;

/// Fractional digits carried by [`Money`]
pub const MINOR_UNIT_SCALE: u32 = 2;

/// Basis points in 100%
pub const BPS_MAX: u32 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MoneyError {
    #[error("amount has more than {MINOR_UNIT_SCALE} fractional digits")]
    TooPrecise,
    #[error("amount out of range")]
    Overflow,
}

/// Signed amount in minor currency units
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    pub const fn minor(self) -> i64 {
        self.0
    }

    /// Whole major units, e.g. `from_major(80)` is 80.00
    pub fn from_major(units: i64) -> Result<Self, MoneyError> {
        units
            .checked_mul(10i64.pow(MINOR_UNIT_SCALE))
            .map(Self)
            .ok_or(MoneyError::Overflow)
    }

    /// Convert a major-unit decimal ("80.00") without rounding
    pub fn from_decimal(value: Decimal) -> Result<Self, MoneyError> {
        if value.normalize().scale() > MINOR_UNIT_SCALE {
            return Err(MoneyError::TooPrecise);
        }
        let minor = value
            .checked_mul(Decimal::ONE_HUNDRED)
            .ok_or(MoneyError::Overflow)?;
        minor.to_i64().map(Self).ok_or(MoneyError::Overflow)
    }

    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, MINOR_UNIT_SCALE)
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    /// Multiply by a quantity (line totals)
    pub fn checked_mul(self, quantity: i64) -> Option<Money> {
        self.0.checked_mul(quantity).map(Self)
    }

    /// Sum an iterator, `None` on overflow
    pub fn checked_sum<I: IntoIterator<Item = Money>>(iter: I) -> Option<Money> {
        iter.into_iter()
            .try_fold(Money::ZERO, |acc, m| acc.checked_add(m))
    }

    /// Share of this amount in basis points, rounded half away from zero to
    /// the minor unit.
    pub fn basis_points(self, bps: u32) -> Money {
        let share = self.to_decimal() * Decimal::from(bps) / Decimal::from(BPS_MAX);
        let rounded =
            share.round_dp_with_strategy(MINOR_UNIT_SCALE, RoundingStrategy::MidpointAwayFromZero);
        // Rounded to the minor unit and bounded by |self|, so this cannot fail.
        Self::from_decimal(rounded).unwrap_or(Money::ZERO)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

impl Neg for Money {
    type Output = Money;

    /// Saturates at `i64::MAX` for the one unrepresentable input
    fn neg(self) -> Money {
        Money(self.0.saturating_neg())
    }
}
