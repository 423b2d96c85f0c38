//! HTTP middleware and extractors for the storefront.
//!
//! - [`auth`] - Bearer-token customer authentication
//! - [`session`] - Cookie session holding the cart

pub mod auth;
pub mod session;

pub use auth::{CurrentUser, RequireUser};
pub use session::{create_session_layer, load_cart, postgres_store, save_cart};
