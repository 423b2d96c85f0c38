//! Product repository.

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use audie_boutique_core::{Money, Product, ProductId};

use super::RepositoryError;

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    price: Decimal,
    is_active: bool,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        if row.price.is_sign_negative() {
            return Err(RepositoryError::DataCorruption(format!(
                "product {} has negative price {}",
                row.id, row.price
            )));
        }
        Ok(Self {
            id: ProductId::new(row.id),
            name: row.name,
            price: Money::new(row.price),
            is_active: row.is_active,
        })
    }
}

/// Repository for `products` rows.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored price is negative.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row: Option<ProductRow> =
            sqlx::query_as("SELECT id, name, price, is_active FROM products WHERE id = $1")
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

    #[test]
    fn test_negative_price_is_corruption() {
        let row = ProductRow {
            id: Uuid::new_v4(),
            name: "Robe".into(),
            price: "-1".parse().unwrap(),
            is_active: true,
        };
        assert!(matches!(
            Product::try_from(row),
            Err(RepositoryError::DataCorruption(_))
        ));
    }
}
