//! Address repository.

use sqlx::PgPool;
use uuid::Uuid;

use audie_boutique_core::{Address, AddressId, NewAddress, UserId};

use super::RepositoryError;

#[derive(Debug, sqlx::FromRow)]
struct AddressRow {
    id: Uuid,
    user_id: Uuid,
    full_name: String,
    street: String,
    postal_code: String,
    city: String,
    country: String,
    is_active: bool,
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Self {
            id: AddressId::new(row.id),
            customer_id: UserId::new(row.user_id),
            full_name: row.full_name,
            street: row.street,
            postal_code: row.postal_code,
            city: row.city,
            country: row.country,
            is_active: row.is_active,
        }
    }
}

/// Repository for `addresses` rows.
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an address by ID, active or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: AddressId) -> Result<Option<Address>, RepositoryError> {
        let row: Option<AddressRow> = sqlx::query_as(
            r"
            SELECT id, user_id, full_name, street, postal_code, city, country, is_active
            FROM addresses
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Active addresses of a customer, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active(&self, customer: UserId) -> Result<Vec<Address>, RepositoryError> {
        let rows: Vec<AddressRow> = sqlx::query_as(
            r"
            SELECT id, user_id, full_name, street, postal_code, city, country, is_active
            FROM addresses
            WHERE user_id = $1 AND is_active
            ORDER BY created_at
            ",
        )
        .bind(customer)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Insert an address for a customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        customer: UserId,
        address: &NewAddress,
    ) -> Result<Address, RepositoryError> {
        let row: AddressRow = sqlx::query_as(
            r"
            INSERT INTO addresses (user_id, full_name, street, postal_code, city, country, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, TRUE)
            RETURNING id, user_id, full_name, street, postal_code, city, country, is_active
            ",
        )
        .bind(customer)
        .bind(&address.full_name)
        .bind(&address.street)
        .bind(&address.postal_code)
        .bind(&address.city)
        .bind(&address.country)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Mark an address inactive.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such address exists.
    pub async fn deactivate(&self, id: AddressId) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE addresses SET is_active = FALSE WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("address {id}")));
        }
        Ok(())
    }
}
