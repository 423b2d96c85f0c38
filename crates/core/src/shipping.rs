//! Shipping rule evaluator.

use serde::{Deserialize, Serialize};

use crate::types::Money;

/// How the customer receives the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShippingMode {
    #[default]
    Delivery,
    /// Collected in store; never charged.
    Pickup,
}

impl ShippingMode {
    /// Whether the order has to be shipped to an address.
    #[must_use]
    pub const fn is_shipping(self) -> bool {
        matches!(self, Self::Delivery)
    }
}

/// Store-wide shipping pricing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingRules {
    /// Flat delivery fee below the threshold.
    pub base_cost: Money,
    /// Subtotal at or above which delivery is free.
    pub free_threshold: Money,
}

impl ShippingRules {
    #[must_use]
    pub const fn new(base_cost: Money, free_threshold: Money) -> Self {
        Self {
            base_cost,
            free_threshold,
        }
    }

    /// Shipping cost for a subtotal. The threshold is inclusive.
    #[must_use]
    pub fn shipping_cost(&self, subtotal: Money, mode: ShippingMode) -> Money {
        match mode {
            ShippingMode::Pickup => Money::ZERO,
            ShippingMode::Delivery if subtotal >= self.free_threshold => Money::ZERO,
            ShippingMode::Delivery => self.base_cost,
        }
    }

    /// Amount still needed to reach free delivery. Display only.
    #[must_use]
    pub fn remaining_for_free_shipping(&self, subtotal: Money, mode: ShippingMode) -> Money {
        match mode {
            ShippingMode::Pickup => Money::ZERO,
            ShippingMode::Delivery => self.free_threshold.saturating_sub(subtotal),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn eur(s: &str) -> Money {
        s.parse().unwrap()
    }

    fn rules() -> ShippingRules {
        ShippingRules::new(eur("5.90"), eur("80"))
    }

    #[test]
    fn test_threshold_is_inclusive() {
        assert_eq!(
            rules().shipping_cost(eur("80"), ShippingMode::Delivery),
            Money::ZERO
        );
    }

    #[test]
    fn test_below_threshold_pays_base_cost() {
        assert_eq!(
            rules().shipping_cost(eur("79.99"), ShippingMode::Delivery),
            eur("5.90")
        );
    }

    #[test]
    fn test_pickup_is_always_free() {
        for subtotal in ["0", "10", "79.99", "500"] {
            assert_eq!(
                rules().shipping_cost(eur(subtotal), ShippingMode::Pickup),
                Money::ZERO
            );
        }
    }

    #[test]
    fn test_remaining_for_free_shipping() {
        let rules = rules();
        assert_eq!(
            rules.remaining_for_free_shipping(eur("50"), ShippingMode::Delivery),
            eur("30")
        );
        assert_eq!(
            rules.remaining_for_free_shipping(eur("120"), ShippingMode::Delivery),
            Money::ZERO
        );
        assert_eq!(
            rules.remaining_for_free_shipping(eur("50"), ShippingMode::Pickup),
            Money::ZERO
        );
    }

    #[test]
    fn test_mode_serde() {
        assert_eq!(
            serde_json::from_str::<ShippingMode>("\"pickup\"").unwrap(),
            ShippingMode::Pickup
        );
    }
}
