//! Decimal money amounts.
//!
//! The boutique sells in a single currency (euros), so an amount is a bare
//! [`Decimal`] in the currency's standard unit. Arithmetic stays exact; only
//! display rounds to two decimal places.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Mul, Sub};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An amount of money in euros.
///
/// Serializes as a decimal string (`"89.99"`) so no precision is lost on the
/// wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero euros.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Currency symbol used for display.
    pub const SYMBOL: &'static str = "€";

    /// Create an amount from a decimal.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create an amount from a whole number of cents.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// Get the underlying decimal.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is strictly below zero.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Subtract, flooring the result at zero.
    #[must_use]
    pub fn saturating_sub(self, other: Self) -> Self {
        let diff = self.0 - other.0;
        if diff.is_sign_negative() {
            Self::ZERO
        } else {
            Self(diff)
        }
    }

    /// Round to cents using banker's rounding.
    #[must_use]
    pub fn round_to_cents(self) -> Self {
        Self(self.0.round_dp(2))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} {}", self.0.round_dp(2), Self::SYMBOL)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl core::str::FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<Decimal>().map(Self)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Mul<u32> for Money {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self {
        Self(self.0 * Decimal::from(rhs))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Self> for Money {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Money {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Money {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value).map(Self)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Money {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn eur(s: &str) -> Money {
        s.parse().unwrap()
    }

    #[test]
    fn test_from_cents() {
        assert_eq!(Money::from_cents(8999), eur("89.99"));
        assert_eq!(Money::from_cents(-150), eur("-1.50"));
    }

    #[test]
    fn test_display_rounds_to_cents() {
        assert_eq!(eur("414.99").to_string(), "414.99 €");
        assert_eq!(eur("5").to_string(), "5.00 €");
    }

    #[test]
    fn test_saturating_sub_floors_at_zero() {
        assert_eq!(eur("80").saturating_sub(eur("79.99")), eur("0.01"));
        assert_eq!(eur("79.99").saturating_sub(eur("80")), Money::ZERO);
    }

    #[test]
    fn test_mul_and_sum() {
        let total: Money = [eur("125.00") * 2, eur("89.99")].iter().sum();
        assert_eq!(total, eur("339.99"));
    }

    #[test]
    fn test_is_negative() {
        assert!(eur("-0.01").is_negative());
        assert!(!Money::ZERO.is_negative());
        assert!(!eur("0.01").is_negative());
    }

    #[test]
    fn test_serializes_as_string() {
        let json = serde_json::to_string(&eur("12.50")).unwrap();
        assert_eq!(json, "\"12.50\"");
    }
}
