//! Order repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use audie_boutique_core::{
    AddressId, LineItem, Money, NewOrder, Order, OrderId, OrderStatus, OrderTotals, ProductId,
    UserId,
};

use super::RepositoryError;

const ORDER_COLUMNS: &str = "id, user_id, created_at, status, is_shipping, address_id, \
                             subtotal, shipping, discount, total, items";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    user_id: Uuid,
    created_at: DateTime<Utc>,
    status: String,
    is_shipping: bool,
    address_id: Option<Uuid>,
    subtotal: Decimal,
    shipping: Decimal,
    discount: Decimal,
    total: Decimal,
    items: Json<Vec<StoredLineItem>>,
}

/// A line item as stored in `orders.items`.
///
/// Older rows were written by the JavaScript client with numeric prices and a
/// `price` key; both shapes are accepted.
#[derive(Debug, Deserialize)]
struct StoredLineItem {
    product_id: Uuid,
    name: String,
    #[serde(alias = "price")]
    unit_price: StoredAmount,
    quantity: u32,
    #[serde(default)]
    selected_color: Option<String>,
    #[serde(default)]
    selected_size: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredAmount {
    Text(String),
    Number(serde_json::Number),
}

impl StoredAmount {
    fn to_money(&self) -> Result<Money, RepositoryError> {
        let raw = match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => n.to_string(),
        };
        raw.parse::<Decimal>()
            .or_else(|_| Decimal::from_scientific(&raw))
            .map(Money::new)
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid item price {raw}: {e}")))
    }
}

impl TryFrom<StoredLineItem> for LineItem {
    type Error = RepositoryError;

    fn try_from(item: StoredLineItem) -> Result<Self, Self::Error> {
        let unit_price = item.unit_price.to_money()?;
        Self::new(ProductId::new(item.product_id), item.name, unit_price, item.quantity)
            .map(|line| line.with_variant(item.selected_color, item.selected_size))
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid order line: {e}")))
    }
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status: OrderStatus = row.status.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("order {}: {e}", row.id))
        })?;

        let totals = OrderTotals::verify(
            Money::new(row.subtotal),
            Money::new(row.shipping),
            Money::new(row.discount),
            Money::new(row.total),
        )
        .map_err(|e| RepositoryError::DataCorruption(format!("order {}: {e}", row.id)))?;

        let items = row
            .items
            .0
            .into_iter()
            .map(LineItem::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        if row.is_shipping && row.address_id.is_none() {
            return Err(RepositoryError::DataCorruption(format!(
                "order {}: delivery order without address",
                row.id
            )));
        }

        Ok(Self {
            id: OrderId::new(row.id),
            customer_id: UserId::new(row.user_id),
            created_at: row.created_at,
            status,
            is_shipping: row.is_shipping,
            address_id: row.address_id.map(AddressId::new),
            items,
            totals,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

/// Status compare-and-set; `$2` holds every stored spelling of the expected
/// status.
const CAS_STATUS_SQL: &str = "UPDATE orders SET status = $3 WHERE id = $1 AND status = ANY($2)";

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if any row is invalid.
    pub async fn list_all(&self) -> Result<Vec<Order>, RepositoryError> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the row is invalid.
    pub async fn get_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Insert a new order and return it as stored.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        let items = serde_json::to_value(&order.items)
            .map_err(|e| RepositoryError::DataCorruption(format!("unserializable items: {e}")))?;

        let row: OrderRow = sqlx::query_as(&format!(
            "INSERT INTO orders \
                 (user_id, status, is_shipping, address_id, subtotal, shipping, discount, total, items) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(order.customer_id)
        .bind(order.status.as_str())
        .bind(order.is_shipping)
        .bind(order.address_id)
        .bind(order.totals.subtotal())
        .bind(order.totals.shipping())
        .bind(order.totals.discount())
        .bind(order.totals.total())
        .bind(Json(items))
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    /// Set `status` to `new` only if the stored status is still `expected`,
    /// under any of its stored spellings.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist and
    /// `RepositoryError::Conflict` if its status is no longer `expected`.
    pub async fn compare_and_set_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        new: OrderStatus,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(CAS_STATUS_SQL)
            .bind(id)
            .bind(expected.stored_names())
            .bind(new.as_str())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        let current: Option<(String,)> = sqlx::query_as("SELECT status FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        match current {
            None => Err(RepositoryError::NotFound(format!("order {id}"))),
            Some((raw,)) => {
                let actual: OrderStatus = raw
                    .parse()
                    .map_err(|e| RepositoryError::DataCorruption(format!("order {id}: {e}")))?;
                Err(RepositoryError::Conflict { expected, actual })
            }
        }
    }
}
