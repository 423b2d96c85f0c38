//! Validation errors shared by every entry point.

use thiserror::Error;

use crate::types::EmailError;

/// Input that fails a business rule before any backend call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or blank.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A line item has a quantity of zero.
    #[error("quantity must be at least 1")]
    ZeroQuantity,

    /// A price is below zero.
    #[error("price cannot be negative")]
    NegativePrice,

    /// Checkout was attempted with nothing in the cart.
    #[error("cart is empty")]
    EmptyCart,

    /// A cart line index is out of range.
    #[error("no cart line at position {0}")]
    NoSuchLine(usize),

    /// Delivery was requested without an address.
    #[error("delivery requires a shipping address")]
    AddressRequired,

    /// A date range ends before it starts.
    #[error("date range ends before it starts")]
    InvertedRange,

    /// A date range spans more days than a report may cover.
    #[error("date range cannot exceed {max_days} days")]
    RangeTooLong { max_days: i64 },

    /// The promo code is unknown.
    #[error("unknown promo code: {0}")]
    UnknownPromoCode(String),

    /// An email address is malformed.
    #[error(transparent)]
    Email(#[from] EmailError),
}
