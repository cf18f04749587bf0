//! Exact money amounts.
//!
//! All prices on the platform share one implicit currency and are kept at two
//! fractional digits. Arithmetic goes through [`rust_decimal::Decimal`], never
//! floating point.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Number of fractional digits carried by every amount.
pub const MONEY_SCALE: u32 = 2;

/// A non-currency-tagged money amount with two decimal places.
///
/// Serializes as a decimal string (`"8.50"`) so clients never see binary
/// floating point artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(transparent))]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero, at the standard scale.
    pub const ZERO: Self = Self(Decimal::from_parts(0, 0, 0, false, MONEY_SCALE));

    /// Largest amount a `NUMERIC(10, 2)` column holds: 99,999,999.99.
    pub const MAX: Self = Self(Decimal::from_parts(1_410_065_407, 2, 0, false, MONEY_SCALE));

    /// Create an amount, normalizing it to two decimal places.
    ///
    /// Half-cent ties round away from zero.
    #[must_use]
    pub fn new(amount: Decimal) -> Self {
        let mut amount =
            amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
        amount.rescale(MONEY_SCALE);
        Self(amount)
    }

    /// Wrap a decimal that is already at the standard scale.
    ///
    /// For constants; runtime values go through [`Money::new`].
    #[must_use]
    pub const fn from_decimal_const(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create an amount from minor units (cents).
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, MONEY_SCALE))
    }

    /// The underlying decimal.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is below zero.
    #[must_use]
    pub const fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// This amount multiplied by an item count.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self::new(self.0 * Decimal::from(quantity))
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self::new(amount)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.0 + rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_normalizes_scale() {
        assert_eq!(Money::new(Decimal::from(6)).to_string(), "6.00");
        assert_eq!(Money::new(Decimal::new(12_345, 3)).to_string(), "12.35");
        assert_eq!(Money::new(Decimal::new(12_335, 3)).to_string(), "12.34");
    }

    #[test]
    fn test_half_cent_rounds_away_from_zero() {
        assert_eq!(Money::new(Decimal::new(2_005, 3)), Money::from_cents(201));
        assert_eq!(Money::new(Decimal::new(-2_005, 3)), Money::from_cents(-201));
        assert_eq!(Money::new(Decimal::new(2_004, 3)), Money::from_cents(200));
    }

    #[test]
    fn test_max_matches_column_limit() {
        assert_eq!(Money::MAX, Money::from_cents(9_999_999_999));
        assert_eq!(Money::MAX.to_string(), "99999999.99");
    }

    #[test]
    fn test_times_and_sum() {
        let total: Money = [Money::from_cents(300).times(2), Money::from_cents(250)]
            .into_iter()
            .sum();
        assert_eq!(total, Money::from_cents(850));
    }

    #[test]
    fn test_serializes_as_string() {
        let json = serde_json::to_string(&Money::from_cents(850)).unwrap();
        assert_eq!(json, "\"8.50\"");
    }

    #[test]
    fn test_is_negative() {
        assert!(Money::from_cents(-1).is_negative());
        assert!(!Money::ZERO.is_negative());
    }
}
