//! Line items, carts and the cart aggregator.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ValidationError;
use crate::types::{Money, ProductId};

/// One product/variant/quantity entry within a cart or order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    /// Product name at the time the line was added.
    pub name: String,
    pub unit_price: Money,
    pub quantity: u32,
    #[serde(default)]
    pub selected_color: Option<String>,
    #[serde(default)]
    pub selected_size: Option<String>,
}

impl LineItem {
    /// Build a validated line item.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ZeroQuantity`] or
    /// [`ValidationError::NegativePrice`].
    pub fn new(
        product_id: ProductId,
        name: impl Into<String>,
        unit_price: Money,
        quantity: u32,
    ) -> Result<Self, ValidationError> {
        let item = Self {
            product_id,
            name: name.into(),
            unit_price,
            quantity,
            selected_color: None,
            selected_size: None,
        };
        item.validate()?;
        Ok(item)
    }

    /// Attach the chosen variant.
    #[must_use]
    pub fn with_variant(mut self, color: Option<String>, size: Option<String>) -> Self {
        self.selected_color = color;
        self.selected_size = size;
        self
    }

    /// Check the quantity and price bounds.
    ///
    /// # Errors
    ///
    /// Returns the first violated bound.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.quantity == 0 {
            return Err(ValidationError::ZeroQuantity);
        }
        if self.unit_price.is_negative() {
            return Err(ValidationError::NegativePrice);
        }
        Ok(())
    }

    /// `unit_price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity
    }

    fn same_variant(&self, other: &Self) -> bool {
        self.product_id == other.product_id
            && self.selected_color == other.selected_color
            && self.selected_size == other.selected_size
    }
}

/// Aggregated view of a set of line items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CartSummary {
    pub subtotal: Money,
    pub item_count: u32,
}

/// Sum line totals and quantities.
///
/// Order-independent. Lines with a zero quantity contribute nothing.
#[must_use]
pub fn summarize(items: &[LineItem]) -> CartSummary {
    items
        .iter()
        .filter(|item| item.quantity > 0)
        .fold(CartSummary::default(), |acc, item| CartSummary {
            subtotal: acc.subtotal + item.line_total(),
            item_count: acc.item_count.saturating_add(item.quantity),
        })
}

/// A customer's cart. Insertion order is display order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Lines in display order.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add a line, merging it into an existing line for the same variant.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the line itself is invalid.
    pub fn add(&mut self, item: LineItem) -> Result<(), ValidationError> {
        item.validate()?;
        if let Some(existing) = self.items.iter_mut().find(|l| l.same_variant(&item)) {
            existing.quantity = existing.quantity.saturating_add(item.quantity);
            existing.unit_price = item.unit_price;
            existing.name = item.name;
        } else {
            self.items.push(item);
        }
        Ok(())
    }

    /// Change a line's quantity. A quantity of zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NoSuchLine`] for an out-of-range index.
    pub fn set_quantity(&mut self, index: usize, quantity: u32) -> Result<(), ValidationError> {
        if quantity == 0 {
            return self.remove(index).map(|_| ());
        }
        let line = self
            .items
            .get_mut(index)
            .ok_or(ValidationError::NoSuchLine(index))?;
        line.quantity = quantity;
        Ok(())
    }

    /// Remove and return a line.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NoSuchLine`] for an out-of-range index.
    pub fn remove(&mut self, index: usize) -> Result<LineItem, ValidationError> {
        if index >= self.items.len() {
            return Err(ValidationError::NoSuchLine(index));
        }
        Ok(self.items.remove(index))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    #[must_use]
    pub fn summary(&self) -> CartSummary {
        summarize(&self.items)
    }

    /// Serialize for session storage.
    #[must_use]
    pub fn to_persisted(&self) -> PersistedCart {
        PersistedCart {
            version: PersistedCart::CURRENT_VERSION,
            items: self.items.clone(),
        }
    }

    /// Rebuild a cart from session storage.
    ///
    /// # Errors
    ///
    /// Rejects unknown versions and invalid lines as a whole; a stored cart is
    /// never partially restored.
    pub fn from_persisted(persisted: PersistedCart) -> Result<Self, PersistedCartError> {
        if persisted.version != PersistedCart::CURRENT_VERSION {
            return Err(PersistedCartError::UnsupportedVersion(persisted.version));
        }
        let mut cart = Self::new();
        for item in persisted.items {
            cart.add(item)?;
        }
        Ok(cart)
    }
}

/// Versioned session representation of a [`Cart`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedCart {
    pub version: u32,
    pub items: Vec<LineItem>,
}

impl PersistedCart {
    /// Version written by this build.
    pub const CURRENT_VERSION: u32 = 1;
}

/// Why a stored cart could not be restored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistedCartError {
    #[error("unsupported cart version {0}")]
    UnsupportedVersion(u32),
    #[error("invalid cart line: {0}")]
    InvalidLine(#[from] ValidationError),
}
