//! User listing route handler (admin only).

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use audie_boutique_core::{Permission, User, UserRole};

use crate::{error::AppError, middleware::RequireStaff, state::AppState};

#[derive(Debug, Deserialize)]
pub struct UsersQuery {
    pub role: Option<String>,
}

/// List users, optionally filtered by role.
#[instrument(skip(user, state), fields(user = %user.id))]
pub async fn index(
    RequireStaff(user): RequireStaff,
    State(state): State<AppState>,
    Query(query): Query<UsersQuery>,
) -> Result<Json<Vec<User>>, AppError> {
    user.require(Permission::ManageUsers)?;

    let role = query
        .role
        .as_deref()
        .filter(|r| !r.is_empty())
        .map(str::parse::<UserRole>)
        .transpose()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let users = state.backends().users.fetch_users(role).await?;
    Ok(Json(users))
}
