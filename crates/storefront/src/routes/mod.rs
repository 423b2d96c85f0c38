//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! # Cart (session, no login needed)
//! GET    /api/cart?mode              - Cart lines and price breakdown
//! POST   /api/cart/items             - Add a product
//! PATCH  /api/cart/items/{index}     - Change a line's quantity (0 removes)
//! DELETE /api/cart/items/{index}     - Remove a line
//! DELETE /api/cart                   - Empty the cart
//! GET    /api/cart/quote?mode&promo  - Price breakdown only
//!
//! # Checkout (login required)
//! POST   /api/checkout               - Place an order from the cart
//!
//! # Address book (login required)
//! GET    /api/addresses              - Active addresses
//! POST   /api/addresses              - Add an address
//! DELETE /api/addresses/{id}         - Soft-delete an address
//! ```

use axum::{
    Router,
    routing::{delete, get, patch, post},
};

use crate::state::AppState;

pub mod addresses;
pub mod cart;
pub mod checkout;

/// Build the API router.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Cart
        .route("/api/cart", get(cart::show).delete(cart::clear))
        .route("/api/cart/items", post(cart::add_item))
        .route(
            "/api/cart/items/{index}",
            patch(cart::update_item).delete(cart::remove_item),
        )
        .route("/api/cart/quote", get(cart::quote))
        // Checkout
        .route("/api/checkout", post(checkout::place_order))
        // Addresses
        .route("/api/addresses", get(addresses::index).post(addresses::create))
        .route("/api/addresses/{id}", delete(addresses::remove))
}
