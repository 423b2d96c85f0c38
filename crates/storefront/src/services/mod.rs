//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `checkout` - Quotes and order placement from the session cart
//! - `promo` - Configured promo codes

pub mod checkout;
pub mod promo;

pub use checkout::{CheckoutError, CheckoutRequest, CheckoutService, Quote};
pub use promo::PromoCodes;
