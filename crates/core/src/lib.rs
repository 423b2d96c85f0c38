//! Audie Boutique Core - Shared domain types and business rules.
//!
//! This crate provides the types and pure logic used across all Audie Boutique
//! components:
//! - `storefront` - Customer-facing cart, checkout and address book API
//! - `admin` - Back-office API (orders, dashboard, users)
//! - `supabase` - Data access to the hosted backend
//!
//! # Architecture
//!
//! The core crate contains only types, pure functions and port traits - no I/O,
//! no database access, no HTTP clients. Services receive port implementations
//! explicitly, so everything here can be tested without a backend.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, money, emails, statuses and roles
//! - [`cart`] - Line items, carts and the cart aggregator
//! - [`shipping`] - Shipping rule evaluator
//! - [`pricing`] - Discounts and order totals
//! - [`order`] - Orders and checkout snapshots
//! - [`lifecycle`] - Order status transition rules
//! - [`stats`] - Revenue and order statistics
//! - [`address`] - Customer addresses
//! - [`user`] - Users and display names
//! - [`product`] - Catalog products
//! - [`ports`] - Async traits implemented by the backend

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod address;
pub mod cart;
pub mod error;
pub mod lifecycle;
pub mod order;
pub mod ports;
pub mod pricing;
pub mod product;
pub mod shipping;
pub mod stats;
pub mod types;
pub mod user;

pub use address::{Address, NewAddress};
pub use cart::{Cart, CartSummary, LineItem, PersistedCart};
pub use error::ValidationError;
pub use lifecycle::{StatusChange, TransitionError, TransitionPolicy};
pub use order::{NewOrder, Order};
pub use pricing::{Discount, OrderTotals, PricingError};
pub use product::Product;
pub use shipping::{ShippingMode, ShippingRules};
pub use stats::{DailyRevenue, DateRange, OrderStats, RecentOrder};
pub use types::*;
pub use user::User;
