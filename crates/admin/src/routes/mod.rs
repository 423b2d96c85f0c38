//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /api/dashboard?start&end&recent     - Revenue and order statistics
//!
//! # Orders
//! GET  /api/orders?status&q&page&per_page  - Order listing
//! GET  /api/orders/{id}                    - Order detail
//! PUT  /api/orders/{id}/status             - Change order status
//! GET  /api/orders/{id}/invoice            - Invoice document (HTML)
//! POST /api/orders/{id}/invoice            - Send invoice to the customer
//!
//! # Users (admin only)
//! GET  /api/users?role                     - User listing
//! ```
//!
//! Health checks are mounted by the binary, which owns the database pool.

use axum::{
    Router,
    routing::{get, put},
};

use crate::state::AppState;

pub mod dashboard;
pub mod orders;
pub mod users;

/// Build the API router.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Dashboard
        .route("/api/dashboard", get(dashboard::show))
        // Orders
        .route("/api/orders", get(orders::index))
        .route("/api/orders/{id}", get(orders::show))
        .route("/api/orders/{id}/status", put(orders::update_status))
        .route(
            "/api/orders/{id}/invoice",
            get(orders::invoice).post(orders::send_invoice),
        )
        // Users
        .route("/api/users", get(users::index))
}
