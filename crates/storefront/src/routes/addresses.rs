//! Address book route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::{info, instrument};

use audie_boutique_core::ports::StoreError;
use audie_boutique_core::{Address, AddressId, NewAddress, Permission};

use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::state::AppState;

/// The caller's active addresses.
#[instrument(skip(user, state), fields(user = %user.id))]
pub async fn index(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Address>>> {
    user.require(Permission::ManageOwnAddresses)?;
    let addresses = state.backends().addresses.fetch_addresses(user.id).await?;
    Ok(Json(addresses))
}

/// Add an address for the caller.
#[instrument(skip(user, state, body), fields(user = %user.id))]
pub async fn create(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Json(body): Json<NewAddress>,
) -> Result<(StatusCode, Json<Address>)> {
    user.require(Permission::ManageOwnAddresses)?;
    let fields = body.validate()?;
    let address = state
        .backends()
        .addresses
        .insert_address(user.id, fields)
        .await?;
    info!(address = %address.id, "address added");
    Ok((StatusCode::CREATED, Json(address)))
}

/// Soft-delete one of the caller's addresses.
///
/// Another customer's address answers 404, as if it did not exist.
#[instrument(skip(user, state), fields(user = %user.id))]
pub async fn remove(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path(id): Path<AddressId>,
) -> Result<StatusCode> {
    user.require(Permission::ManageOwnAddresses)?;
    let addresses = &state.backends().addresses;

    let not_found = || AppError::NotFound(format!("address {id}"));
    match addresses.fetch_address(id).await {
        Ok(address) if address.usable_by(user.id) => {}
        Ok(_) | Err(StoreError::NotFound(_)) => return Err(not_found()),
        Err(e) => return Err(e.into()),
    }

    addresses.soft_delete_address(id).await?;
    info!(address = %id, "address removed");
    Ok(StatusCode::NO_CONTENT)
}
