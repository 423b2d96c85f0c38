//! Database operations on the Supabase Postgres instance.
//!
//! # Tables
//!
//! - `orders` - Placed orders, line items as JSONB, totals as NUMERIC
//! - `users` - Customer and staff profiles (`role`: admin, agent, client)
//! - `addresses` - Customer addresses, soft-deleted via `is_active`
//! - `products` - Catalog prices used to price cart lines
//!
//! The schema is owned by the Supabase project; this crate only reads and
//! writes rows. Queries are built at runtime (`sqlx::query_as`) so the
//! workspace builds without a live database.

pub mod addresses;
pub mod orders;
pub mod products;
pub mod users;

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use thiserror::Error;

use audie_boutique_core::ports::{
    AddressBook, OrderStore, ProductCatalog, StoreError, UserDirectory,
};
use audie_boutique_core::{
    Address, AddressId, NewAddress, NewOrder, Order, OrderId, OrderStatus, Product, ProductId,
    User, UserId, UserRole,
};

pub use addresses::AddressRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use users::UserRepository;

/// Postgres error code for `query_canceled`, raised by `statement_timeout`.
const QUERY_CANCELED: &str = "57014";

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// A compare-and-set found a different status.
    #[error("status conflict: expected {expected}, found {actual}")]
    Conflict {
        expected: OrderStatus,
        actual: OrderStatus,
    },
}

impl From<RepositoryError> for StoreError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Database(sqlx::Error::PoolTimedOut) => Self::Timeout,
            RepositoryError::Database(sqlx::Error::Database(db))
                if db.code().as_deref() == Some(QUERY_CANCELED) =>
            {
                Self::Timeout
            }
            RepositoryError::Database(sqlx::Error::RowNotFound) => {
                Self::NotFound("row not found".to_owned())
            }
            RepositoryError::Database(e) => Self::Backend(e.to_string()),
            RepositoryError::DataCorruption(msg) => Self::Malformed(msg),
            RepositoryError::NotFound(what) => Self::NotFound(what),
            RepositoryError::Conflict { expected, actual } => Self::Conflict { expected, actual },
        }
    }
}

/// Create a `PostgreSQL` connection pool.
///
/// `timeout` bounds both pool acquisition and every statement
/// (`statement_timeout` is set on each connection).
///
/// # Errors
///
/// Returns `sqlx::Error` if the URL is invalid or the connection cannot be
/// established.
pub async fn create_pool(
    database_url: &SecretString,
    timeout: Duration,
) -> Result<PgPool, sqlx::Error> {
    let options = PgConnectOptions::from_str(database_url.expose_secret())?
        .options([("statement_timeout", timeout.as_millis().to_string())]);

    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(timeout)
        .connect_with(options)
        .await
}

/// Port implementations backed by a connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database connectivity.
    ///
    /// # Errors
    ///
    /// Returns the sqlx error if the round trip fails.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn fetch_orders(&self) -> Result<Vec<Order>, StoreError> {
        Ok(OrderRepository::new(&self.pool).list_all().await?)
    }

    async fn fetch_order(&self, id: OrderId) -> Result<Order, StoreError> {
        OrderRepository::new(&self.pool)
            .get_by_id(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("order {id}")))
    }

    async fn update_order_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        new: OrderStatus,
    ) -> Result<(), StoreError> {
        Ok(OrderRepository::new(&self.pool)
            .compare_and_set_status(id, expected, new)
            .await?)
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError> {
        Ok(OrderRepository::new(&self.pool).create(&order).await?)
    }
}

#[async_trait]
impl UserDirectory for PgStore {
    async fn fetch_users(&self, role: Option<UserRole>) -> Result<Vec<User>, StoreError> {
        Ok(UserRepository::new(&self.pool).list(role).await?)
    }

    async fn fetch_user(&self, id: UserId) -> Result<User, StoreError> {
        UserRepository::new(&self.pool)
            .get_by_id(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("user {id}")))
    }
}

#[async_trait]
impl AddressBook for PgStore {
    async fn fetch_address(&self, id: AddressId) -> Result<Address, StoreError> {
        AddressRepository::new(&self.pool)
            .get_by_id(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("address {id}")))
    }

    async fn fetch_addresses(&self, customer: UserId) -> Result<Vec<Address>, StoreError> {
        Ok(AddressRepository::new(&self.pool)
            .list_active(customer)
            .await?)
    }

    async fn insert_address(
        &self,
        customer: UserId,
        address: NewAddress,
    ) -> Result<Address, StoreError> {
        Ok(AddressRepository::new(&self.pool)
            .create(customer, &address)
            .await?)
    }

    async fn soft_delete_address(&self, id: AddressId) -> Result<(), StoreError> {
        Ok(AddressRepository::new(&self.pool).deactivate(id).await?)
    }
}

#[async_trait]
impl ProductCatalog for PgStore {
    async fn fetch_product(&self, id: ProductId) -> Result<Product, StoreError> {
        ProductRepository::new(&self.pool)
            .get_by_id(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("product {id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_errors_map_to_store_errors() {
        assert_eq!(
            StoreError::from(RepositoryError::Database(sqlx::Error::PoolTimedOut)),
            StoreError::Timeout
        );
        assert_eq!(
            StoreError::from(RepositoryError::DataCorruption("bad".into())),
            StoreError::Malformed("bad".into())
        );
        assert_eq!(
            StoreError::from(RepositoryError::Conflict {
                expected: OrderStatus::Pending,
                actual: OrderStatus::Cancelled,
            }),
            StoreError::Conflict {
                expected: OrderStatus::Pending,
                actual: OrderStatus::Cancelled,
            }
        );
    }
}
