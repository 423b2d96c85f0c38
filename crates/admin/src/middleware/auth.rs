//! Authentication extractors for admin.
//!
//! Every API request carries `Authorization: Bearer <access token>`. The
//! token is verified against Supabase Auth and the `users` row supplies the
//! role. Only staff roles get past [`RequireStaff`].

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use audie_boutique_core::ports::StoreError;
use audie_boutique_core::{Email, Permission, UserId, UserRole};

use crate::error::{AppError, set_sentry_user};
use crate::state::AppState;

/// The authenticated caller.
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

/// Extractor that requires an authenticated staff member (admin or agent).
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireStaff(user): RequireStaff) -> Result<Json<..>, AppError> {
///     user.require(Permission::ViewOrders)?;
///     ...
/// }
/// ```
pub struct RequireStaff(pub CurrentUser);

/// Why a request was not authenticated.
#[derive(Debug)]
pub enum AuthRejection {
    /// No bearer token in the request.
    MissingToken,
    /// Token rejected by Supabase Auth, or no matching user row.
    InvalidToken,
    /// Authenticated, but not a staff role.
    NotStaff,
    /// Supabase could not be reached.
    Backend(StoreError),
}

impl From<AuthRejection> for AppError {
    fn from(rejection: AuthRejection) -> Self {
        match rejection {
            AuthRejection::MissingToken => Self::Unauthorized("missing bearer token".to_string()),
            AuthRejection::InvalidToken => {
                Self::Unauthorized("invalid or expired token".to_string())
            }
            AuthRejection::NotStaff => Self::Forbidden("staff access only".to_string()),
            AuthRejection::Backend(e) => Self::Store(e),
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}

/// Extract the token from an `Authorization: Bearer ...` header.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Resolve the request's bearer token to a user record.
async fn authenticate(parts: &Parts, state: &AppState) -> Result<CurrentUser, AuthRejection> {
    let token = bearer_token(parts).ok_or(AuthRejection::MissingToken)?;
    let backends = state.backends();

    let id = backends
        .authenticator
        .authenticate(token)
        .await
        .map_err(|e| {
            warn!(error = %e, "token verification failed");
            AuthRejection::Backend(e)
        })?
        .ok_or(AuthRejection::InvalidToken)?;

    let user = match backends.users.fetch_user(id).await {
        Ok(user) => user,
        Err(StoreError::NotFound(_)) => {
            debug!(user = %id, "token valid but no user row");
            return Err(AuthRejection::InvalidToken);
        }
        Err(e) => return Err(AuthRejection::Backend(e)),
    };

    Ok(CurrentUser {
        id: user.id,
        email: user.email,
        role: user.role,
    })
}

impl FromRequestParts<AppState> for RequireStaff {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = authenticate(parts, state).await?;
        if !user.role.is_staff() {
            return Err(AuthRejection::NotStaff);
        }

        set_sentry_user(&user.id, user.email.as_ref().map(Email::as_str));
        Ok(Self(user))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::{Request, StatusCode};

    use super::*;

    fn parts(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/orders");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&parts(Some("Bearer abc.def"))), Some("abc.def"));
        assert_eq!(bearer_token(&parts(Some("bearer  abc"))), Some("abc"));
        assert_eq!(bearer_token(&parts(Some("Basic abc"))), None);
        assert_eq!(bearer_token(&parts(Some("Bearer "))), None);
        assert_eq!(bearer_token(&parts(None)), None);
    }

    #[test]
    fn test_require_permission() {
        let agent = CurrentUser {
            id: UserId::random(),
            email: None,
            role: UserRole::Agent,
        };
        assert!(agent.require(Permission::ManageOrders).is_ok());
        let err = agent.require(Permission::ViewDashboard).unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_rejection_status_codes() {
        let status = |r: AuthRejection| AppError::from(r).status();
        assert_eq!(status(AuthRejection::MissingToken), StatusCode::UNAUTHORIZED);
        assert_eq!(status(AuthRejection::InvalidToken), StatusCode::UNAUTHORIZED);
        assert_eq!(status(AuthRejection::NotStaff), StatusCode::FORBIDDEN);
        assert_eq!(
            status(AuthRejection::Backend(StoreError::Timeout)),
            StatusCode::BAD_GATEWAY
        );
    }
}
