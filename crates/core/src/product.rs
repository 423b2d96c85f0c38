//! Catalog products.

use serde::Serialize;

use crate::types::{Money, ProductId};

/// A sellable product. Cart lines are priced from here, never from the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    /// Inactive products stay readable for old orders but cannot be bought.
    pub is_active: bool,
}
