use std::fmt;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A price in integer minor units (cents) of the base currency.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(into = "Decimal", try_from = "Decimal")]
pub struct Money(i64);

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("amount must not be negative: {0}")]
    Negative(Decimal),
    #[error("amount is out of range: {0}")]
    OutOfRange(Decimal),
}

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_minor_units(minor_units: i64) -> Self {
        Self(minor_units)
    }

    pub const fn minor_units(&self) -> i64 {
        self.0
    }

    /// Rounds to the cent, half away from zero.
    pub fn from_decimal(amount: Decimal) -> Result<Self, MoneyError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(MoneyError::Negative(amount));
        }
        amount
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|cents| cents.to_i64())
            .map(Self)
            .ok_or(MoneyError::OutOfRange(amount))
    }

    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    pub fn saturating_add(self, other: Money) -> Money {
        Money(self.0.saturating_add(other.0))
    }

    pub fn times(self, quantity: u32) -> Money {
        Money(self.0.saturating_mul(i64::from(quantity)))
    }

    /// `rate` is a fraction, e.g. `0.07` for seven percent. Saturates on
    /// overflow; a negative rate yields zero.
    pub fn scaled(self, rate: Decimal) -> Money {
        let Some(scaled) = self.to_decimal().checked_mul(rate) else {
            return Money(i64::MAX);
        };
        match Money::from_decimal(scaled) {
            Ok(money) => money,
            Err(MoneyError::OutOfRange(_)) => Money(i64::MAX),
            Err(MoneyError::Negative(_)) => Money::ZERO,
        }
    }
}

impl From<Money> for Decimal {
    fn from(value: Money) -> Self {
        value.to_decimal()
    }
}

impl TryFrom<Decimal> for Money {
    type Error = MoneyError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Money::from_decimal(value)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

/// Single source of truth for the display exchange rate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyPolicy {
    pub base: String,
    pub display: String,
    pub display_rate: Decimal,
}

impl Default for CurrencyPolicy {
    fn default() -> Self {
        Self { base: "USD".to_string(), display: "INR".to_string(), display_rate: Decimal::from(75) }
    }
}

impl CurrencyPolicy {
    pub fn to_display(&self, amount: Money) -> Decimal {
        amount
            .to_decimal()
            .checked_mul(self.display_rate)
            .unwrap_or(Decimal::MAX)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }
}
