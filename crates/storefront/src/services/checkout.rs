//! Quotes and order placement.
//!
//! Prices always come from the session cart, whose lines were priced from the
//! catalog when added. The client only chooses the shipping mode, the
//! address and the promo code.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument};

use audie_boutique_core::order::OrderError;
use audie_boutique_core::ports::{AddressBook, OrderStore, StoreError};
use audie_boutique_core::{
    AddressId, Cart, Money, NewOrder, Order, OrderTotals, PricingError,
    ShippingMode, ShippingRules, UserId, ValidationError,
};

use super::PromoCodes;

/// Why a quote or checkout failed.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// The delivery address is unknown, inactive or someone else's.
    #[error("address {0} cannot be used for this order")]
    AddressUnavailable(AddressId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<OrderError> for CheckoutError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::Validation(e) => Self::Validation(e),
            OrderError::Pricing(e) => Self::Pricing(e),
        }
    }
}

/// Checkout request body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub mode: ShippingMode,
    pub address_id: Option<AddressId>,
    pub promo: Option<String>,
}

/// Price breakdown for the current cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub mode: ShippingMode,
    pub item_count: u32,
    /// Amount still needed for free delivery (display only).
    pub remaining_for_free_shipping: Money,
    #[serde(flatten)]
    pub totals: OrderTotals,
}

/// Prices carts and turns them into orders.
pub struct CheckoutService {
    orders: Arc<dyn OrderStore>,
    addresses: Arc<dyn AddressBook>,
    shipping: ShippingRules,
    promo_codes: PromoCodes,
}

impl CheckoutService {
    #[must_use]
    pub fn new(
        orders: Arc<dyn OrderStore>,
        addresses: Arc<dyn AddressBook>,
        shipping: ShippingRules,
        promo_codes: PromoCodes,
    ) -> Self {
        Self {
            orders,
            addresses,
            shipping,
            promo_codes,
        }
    }

    #[must_use]
    pub const fn shipping(&self) -> &ShippingRules {
        &self.shipping
    }

    /// Price `cart` for `mode` with an optional promo code.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Validation`] for an unknown promo code and
    /// [`CheckoutError::Pricing`] when the discount exceeds the order.
    pub fn quote(
        &self,
        cart: &Cart,
        mode: ShippingMode,
        promo: Option<&str>,
    ) -> Result<Quote, CheckoutError> {
        let summary = cart.summary();
        let discount = self.promo_codes.resolve(promo)?.resolve(summary.subtotal)?;
        let shipping = self.shipping.shipping_cost(summary.subtotal, mode);
        let totals = OrderTotals::compute(summary.subtotal, shipping, discount)?;

        Ok(Quote {
            mode,
            item_count: summary.item_count,
            remaining_for_free_shipping: self
                .shipping
                .remaining_for_free_shipping(summary.subtotal, mode),
            totals,
        })
    }

    /// Place an order for `customer` from `cart`.
    ///
    /// The cart is cleared only once the order is stored; on any error it is
    /// left as it was.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError`] for an empty cart, a missing or unusable
    /// delivery address, an unknown promo code, an oversized discount or a
    /// backend failure.
    #[instrument(skip(self, cart, request), fields(customer = %customer, mode = ?request.mode))]
    pub async fn place_order(
        &self,
        customer: UserId,
        cart: &mut Cart,
        request: &CheckoutRequest,
    ) -> Result<Order, CheckoutError> {
        if cart.is_empty() {
            return Err(ValidationError::EmptyCart.into());
        }
        let discount = self.promo_codes.resolve(request.promo.as_deref())?;

        let address_id = match request.mode {
            ShippingMode::Delivery => {
                let id = request.address_id.ok_or(ValidationError::AddressRequired)?;
                self.check_address(customer, id).await?;
                Some(id)
            }
            ShippingMode::Pickup => None,
        };

        let new_order = NewOrder::price(
            customer,
            cart.items(),
            request.mode,
            address_id,
            &self.shipping,
            &discount,
        )?;
        let order = self.orders.insert_order(new_order).await?;
        info!(order = %order.id, total = %order.totals.total(), "order placed");

        cart.clear();
        Ok(order)
    }

    async fn check_address(&self, customer: UserId, id: AddressId) -> Result<(), CheckoutError> {
        match self.addresses.fetch_address(id).await {
            Ok(address) if address.usable_by(customer) => Ok(()),
            Ok(_) | Err(StoreError::NotFound(_)) => Err(CheckoutError::AddressUnavailable(id)),
            Err(e) => Err(e.into()),
        }
    }
}

impl std::fmt::Debug for CheckoutService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutService")
            .field("shipping", &self.shipping)
            .finish_non_exhaustive()
    }
}
