//! User profile repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use audie_boutique_core::{Email, User, UserId, UserRole};

use super::RepositoryError;

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    full_name: Option<String>,
    email: Option<String>,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role: UserRole = row
            .role
            .parse()
            .map_err(|e| RepositoryError::DataCorruption(format!("user {}: {e}", row.id)))?;

        let email = row
            .email
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .map(Email::parse)
            .transpose()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
            })?;

        Ok(Self {
            id: UserId::new(row.id),
            full_name: row.full_name,
            email,
            role,
            created_at: row.created_at,
        })
    }
}

/// Repository for `users` rows.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List users, newest first, optionally restricted to one role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a row is invalid.
    pub async fn list(&self, role: Option<UserRole>) -> Result<Vec<User>, RepositoryError> {
        let rows: Vec<UserRow> = sqlx::query_as(
            r"
            SELECT id, full_name, email, role, created_at
            FROM users
            WHERE $1::text IS NULL OR role = $1
            ORDER BY created_at DESC
            ",
        )
        .bind(role.map(|r| r.to_string()))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the row is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(
            r"
            SELECT id, full_name, email, role, created_at
            FROM users
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn row(role: &str, email: Option<&str>) -> UserRow {
        UserRow {
            id: Uuid::new_v4(),
            full_name: Some("Claire Martin".into()),
            email: email.map(ToOwned::to_owned),
            role: role.into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_row_parsing() {
        let user = User::try_from(row("agent", Some("Claire@Example.fr"))).unwrap();
        assert_eq!(user.role, UserRole::Agent);
        assert_eq!(user.email.unwrap().as_str(), "claire@example.fr");
    }

    #[test]
    fn test_blank_email_is_absent() {
        let user = User::try_from(row("client", Some(" "))).unwrap();
        assert_eq!(user.email, None);
    }

    #[test]
    fn test_unknown_role_is_corruption() {
        assert!(matches!(
            User::try_from(row("superuser", None)),
            Err(RepositoryError::DataCorruption(_))
        ));
    }
}
