//! Checkout route handler.

use axum::{Json, extract::State, http::StatusCode};
use tower_sessions::Session;
use tracing::instrument;

use audie_boutique_core::{Order, Permission};

use crate::error::Result;
use crate::middleware::{RequireUser, load_cart, save_cart};
use crate::services::CheckoutRequest;
use crate::state::AppState;

/// Place an order from the session cart.
///
/// The cart is emptied only when the order was stored.
#[instrument(skip(user, state, session, body), fields(user = %user.id))]
pub async fn place_order(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    user.require(Permission::PlaceOrders)?;

    let mut cart = load_cart(&session).await?;
    let order = state.checkout().place_order(user.id, &mut cart, &body).await?;
    save_cart(&session, &cart).await?;

    Ok((StatusCode::CREATED, Json(order)))
}
