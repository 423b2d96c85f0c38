//! Access token verification against Supabase auth (GoTrue).
//!
//! Both services accept `Authorization: Bearer <access token>` as issued by
//! the Supabase client libraries. The token is checked by asking GoTrue who
//! it belongs to; the role then comes from the `users` table.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use audie_boutique_core::ports::{Authenticator, StoreError};
use audie_boutique_core::{Email, UserId};

use crate::client::{SupabaseClient, SupabaseError};

/// Authentication failures.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The token is expired, revoked or not a Supabase token.
    #[error("invalid or expired access token")]
    InvalidToken,

    /// GoTrue could not be reached or answered unexpectedly.
    #[error("auth backend error: {0}")]
    Backend(#[from] SupabaseError),
}

/// The identity behind a verified access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: UserId,
    pub email: Option<Email>,
}

#[derive(Debug, Deserialize)]
struct GoTrueUser {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
}

impl From<GoTrueUser> for AuthenticatedUser {
    fn from(user: GoTrueUser) -> Self {
        Self {
            id: UserId::new(user.id),
            // Phone-only accounts have an empty email.
            email: user.email.as_deref().and_then(|e| Email::parse(e).ok()),
        }
    }
}

impl SupabaseClient {
    /// Resolve an access token to the user it was issued to.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidToken`] when GoTrue rejects the token.
    #[tracing::instrument(skip_all)]
    pub async fn verify_access_token(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        match self.get_as::<GoTrueUser>("/auth/v1/user", token).await {
            Ok(user) => Ok(user.into()),
            Err(SupabaseError::Unauthorized | SupabaseError::NotFound(_)) => {
                Err(AuthError::InvalidToken)
            }
            Err(e) => Err(AuthError::Backend(e)),
        }
    }
}

#[async_trait]
impl Authenticator for SupabaseClient {
    async fn authenticate(&self, token: &str) -> Result<Option<UserId>, StoreError> {
        match self.verify_access_token(token).await {
            Ok(user) => Ok(Some(user.id)),
            Err(AuthError::InvalidToken) => Ok(None),
            Err(AuthError::Backend(e)) => Err(e.into()),
        }
    }
}
