//! Authentication extractor for customer routes.
//!
//! Customers send their Supabase access token as
//! `Authorization: Bearer <token>`. Browsing and the cart work without it;
//! checkout and the address book require it.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::debug;

use audie_boutique_core::ports::StoreError;
use audie_boutique_core::{Email, Permission, UserId, UserRole};

use crate::error::{AppError, set_sentry_user};
use crate::state::AppState;

/// The authenticated customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: Option<Email>,
    pub role: UserRole,
}

impl CurrentUser {
    /// Fail with 403 unless the caller's role grants `permission`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Forbidden`] when the permission is missing.
    pub fn require(&self, permission: Permission) -> Result<(), AppError> {
        if self.role.can(permission) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "role {} may not {permission:?}",
                self.role
            )))
        }
    }
}

/// Extractor that requires a signed-in user of any role.
pub struct RequireUser(pub CurrentUser);

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_string()))?;
        let backends = state.backends();

        let id = backends
            .authenticator
            .authenticate(token)
            .await?
            .ok_or_else(|| AppError::Unauthorized("invalid or expired token".to_string()))?;

        let user = match backends.users.fetch_user(id).await {
            Ok(user) => user,
            Err(StoreError::NotFound(_)) => {
                debug!(user = %id, "token valid but no user row");
                return Err(AppError::Unauthorized("unknown user".to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        set_sentry_user(&user.id, user.email.as_ref().map(Email::as_str));
        Ok(Self(CurrentUser {
            id: user.id,
            email: user.email,
            role: user.role,
        }))
    }
}
