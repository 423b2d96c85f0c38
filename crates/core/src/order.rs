//! Orders and checkout snapshots.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::cart::{LineItem, summarize};
use crate::error::ValidationError;
use crate::pricing::{Discount, OrderTotals, PricingError};
use crate::shipping::{ShippingMode, ShippingRules};
use crate::types::{AddressId, OrderId, OrderStatus, UserId};

/// A placed order.
///
/// Everything but `status` is fixed at creation. The address is referenced,
/// not copied: editing an address later changes what past orders display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: UserId,
    pub created_at: DateTime<Utc>,
    pub status: OrderStatus,
    pub is_shipping: bool,
    pub address_id: Option<AddressId>,
    pub items: Vec<LineItem>,
    #[serde(flatten)]
    pub totals: OrderTotals,
}

impl Order {
    /// Short human-facing reference, e.g. `#3f2a9c1e`.
    #[must_use]
    pub fn reference(&self) -> String {
        format!("#{}", self.id.short())
    }
}

/// Why a cart could not become an order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// An order ready to be inserted, priced from a cart snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewOrder {
    pub customer_id: UserId,
    pub status: OrderStatus,
    pub is_shipping: bool,
    pub address_id: Option<AddressId>,
    pub items: Vec<LineItem>,
    #[serde(flatten)]
    pub totals: OrderTotals,
}

impl NewOrder {
    /// Price a snapshot of cart lines.
    ///
    /// Delivery orders must carry an address; pickup orders never do.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError`] for an empty cart, an invalid line, a missing
    /// delivery address or a discount the order cannot absorb.
    pub fn price(
        customer_id: UserId,
        items: &[LineItem],
        mode: ShippingMode,
        address_id: Option<AddressId>,
        rules: &ShippingRules,
        discount: &Discount,
    ) -> Result<Self, OrderError> {
        if items.is_empty() {
            return Err(ValidationError::EmptyCart.into());
        }
        for item in items {
            item.validate()?;
        }
        let address_id = match mode {
            ShippingMode::Delivery => Some(address_id.ok_or(ValidationError::AddressRequired)?),
            ShippingMode::Pickup => None,
        };

        let subtotal = summarize(items).subtotal;
        let shipping = rules.shipping_cost(subtotal, mode);
        let discount = discount.resolve(subtotal)?;
        let totals = OrderTotals::compute(subtotal, shipping, discount)?;

        Ok(Self {
            customer_id,
            status: OrderStatus::Pending,
            is_shipping: mode.is_shipping(),
            address_id,
            items: items.to_vec(),
            totals,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{Money, ProductId};

    fn eur(s: &str) -> Money {
        s.parse().unwrap()
    }

    fn line(price: &str, quantity: u32) -> LineItem {
        LineItem::new(ProductId::random(), "Article", eur(price), quantity).unwrap()
    }

    fn rules() -> ShippingRules {
        ShippingRules::new(eur("5.90"), eur("80"))
    }

    #[test]
    fn test_three_items_delivery_above_threshold() {
        let items = vec![line("89.99", 1), line("125.00", 2), line("75.00", 1)];
        let order = NewOrder::price(
            UserId::random(),
            &items,
            ShippingMode::Delivery,
            Some(AddressId::random()),
            &rules(),
            &Discount::None,
        )
        .unwrap();

        assert_eq!(order.totals.subtotal(), eur("414.99"));
        assert_eq!(order.totals.shipping(), Money::ZERO);
        assert_eq!(order.totals.total(), eur("414.99"));
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.is_shipping);
    }

    #[test]
    fn test_small_delivery_pays_shipping() {
        let order = NewOrder::price(
            UserId::random(),
            &[line("30", 1)],
            ShippingMode::Delivery,
            Some(AddressId::random()),
            &rules(),
            &Discount::None,
        )
        .unwrap();
        assert_eq!(order.totals.total(), eur("35.90"));
    }

    #[test]
    fn test_pickup_drops_address() {
        let order = NewOrder::price(
            UserId::random(),
            &[line("30", 1)],
            ShippingMode::Pickup,
            Some(AddressId::random()),
            &rules(),
            &Discount::None,
        )
        .unwrap();
        assert_eq!(order.address_id, None);
        assert!(!order.is_shipping);
        assert_eq!(order.totals.total(), eur("30"));
    }

    #[test]
    fn test_delivery_without_address_is_rejected() {
        let err = NewOrder::price(
            UserId::random(),
            &[line("30", 1)],
            ShippingMode::Delivery,
            None,
            &rules(),
            &Discount::None,
        )
        .unwrap_err();
        assert_eq!(err, OrderError::Validation(ValidationError::AddressRequired));
    }

    #[test]
    fn test_empty_cart_is_rejected() {
        let err = NewOrder::price(
            UserId::random(),
            &[],
            ShippingMode::Pickup,
            None,
            &rules(),
            &Discount::None,
        )
        .unwrap_err();
        assert_eq!(err, OrderError::Validation(ValidationError::EmptyCart));
    }

    #[test]
    fn test_oversized_fixed_discount_is_rejected() {
        let err = NewOrder::price(
            UserId::random(),
            &[line("10", 1)],
            ShippingMode::Pickup,
            None,
            &rules(),
            &Discount::Fixed(eur("15")),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            OrderError::Pricing(PricingError::DiscountExceedsTotal { .. })
        ));
    }

    #[test]
    fn test_reference_uses_id_fragment() {
        let order = NewOrder::price(
            UserId::random(),
            &[line("10", 1)],
            ShippingMode::Pickup,
            None,
            &rules(),
            &Discount::None,
        )
        .unwrap();
        let placed = Order {
            id: "0a1b2c3d-0000-4000-8000-000000000000".parse().unwrap(),
            customer_id: order.customer_id,
            created_at: Utc::now(),
            status: order.status,
            is_shipping: order.is_shipping,
            address_id: order.address_id,
            items: order.items,
            totals: order.totals,
        };
        assert_eq!(placed.reference(), "#0a1b2c3d");
    }
}
