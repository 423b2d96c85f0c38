//! Discounts and order totals.
//!
//! [`OrderTotals`] can only be built through [`OrderTotals::compute`] or
//! [`OrderTotals::verify`], so `total == subtotal + shipping - discount` holds
//! for every value of the type.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Money;

/// Pricing rule violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    #[error("discount cannot be negative")]
    NegativeDiscount,

    #[error("discount {discount} exceeds order amount {payable}")]
    DiscountExceedsTotal { discount: Money, payable: Money },

    #[error("percentage discount must be between 0 and 100, got {0}")]
    InvalidPercent(Decimal),

    #[error("{field} cannot be negative")]
    NegativeAmount { field: &'static str },

    #[error("stored total {stored} does not match computed total {computed}")]
    TotalMismatch { stored: Money, computed: Money },

    #[error("invalid discount: {0}")]
    Unparseable(String),
}

/// A reduction applied to an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Discount {
    #[default]
    None,
    /// A fixed amount off.
    Fixed(Money),
    /// A percentage of the subtotal, 0–100.
    Percent(Decimal),
}

impl Discount {
    /// The discount amount for a given subtotal, rounded to cents.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::NegativeDiscount`] or
    /// [`PricingError::InvalidPercent`].
    pub fn resolve(&self, subtotal: Money) -> Result<Money, PricingError> {
        match *self {
            Self::None => Ok(Money::ZERO),
            Self::Fixed(amount) if amount.is_negative() => Err(PricingError::NegativeDiscount),
            Self::Fixed(amount) => Ok(amount),
            Self::Percent(pct) if pct < Decimal::ZERO || pct > Decimal::ONE_HUNDRED => {
                Err(PricingError::InvalidPercent(pct))
            }
            Self::Percent(pct) => {
                Ok(Money::new(subtotal.amount() * pct / Decimal::ONE_HUNDRED).round_to_cents())
            }
        }
    }
}

impl core::str::FromStr for Discount {
    type Err = PricingError;

    /// Parses `"10%"` as a percentage and `"5"` / `"5.50"` as a fixed amount.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let unparseable = || PricingError::Unparseable(s.to_owned());
        if let Some(pct) = s.strip_suffix('%') {
            let pct: Decimal = pct.trim().parse().map_err(|_| unparseable())?;
            if pct < Decimal::ZERO || pct > Decimal::ONE_HUNDRED {
                return Err(PricingError::InvalidPercent(pct));
            }
            return Ok(Self::Percent(pct));
        }
        let amount: Money = s.parse().map_err(|_| unparseable())?;
        if amount.is_negative() {
            return Err(PricingError::NegativeDiscount);
        }
        Ok(Self::Fixed(amount))
    }
}

/// The four monetary components of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderTotals {
    subtotal: Money,
    shipping: Money,
    discount: Money,
    total: Money,
}

impl OrderTotals {
    /// Derive the total from its components.
    ///
    /// Discounts larger than `subtotal + shipping` are rejected, not clamped.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] for negative components or an oversized
    /// discount.
    pub fn compute(
        subtotal: Money,
        shipping: Money,
        discount: Money,
    ) -> Result<Self, PricingError> {
        if subtotal.is_negative() {
            return Err(PricingError::NegativeAmount { field: "subtotal" });
        }
        if shipping.is_negative() {
            return Err(PricingError::NegativeAmount { field: "shipping" });
        }
        if discount.is_negative() {
            return Err(PricingError::NegativeDiscount);
        }
        let payable = subtotal + shipping;
        if discount > payable {
            return Err(PricingError::DiscountExceedsTotal { discount, payable });
        }
        Ok(Self {
            subtotal,
            shipping,
            discount,
            total: payable - discount,
        })
    }

    /// Re-validate totals read back from storage.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::TotalMismatch`] when the stored total disagrees
    /// with its components, or any error from [`Self::compute`].
    pub fn verify(
        subtotal: Money,
        shipping: Money,
        discount: Money,
        stored_total: Money,
    ) -> Result<Self, PricingError> {
        let computed = Self::compute(subtotal, shipping, discount)?;
        if computed.total != stored_total {
            return Err(PricingError::TotalMismatch {
                stored: stored_total,
                computed: computed.total,
            });
        }
        Ok(computed)
    }

    #[must_use]
    pub const fn subtotal(&self) -> Money {
        self.subtotal
    }

    #[must_use]
    pub const fn shipping(&self) -> Money {
        self.shipping
    }

    #[must_use]
    pub const fn discount(&self) -> Money {
        self.discount
    }

    #[must_use]
    pub const fn total(&self) -> Money {
        self.total
    }
}
