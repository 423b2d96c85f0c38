//! Customer addresses.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::types::{AddressId, UserId};

/// A stored address. Soft-deleted addresses keep `is_active == false` so
/// orders that reference them still resolve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Address {
    pub id: AddressId,
    pub customer_id: UserId,
    pub full_name: String,
    pub street: String,
    pub postal_code: String,
    pub city: String,
    pub country: String,
    pub is_active: bool,
}

impl Address {
    /// Whether `customer` may use this address for a new order.
    #[must_use]
    pub fn usable_by(&self, customer: UserId) -> bool {
        self.is_active && self.customer_id == customer
    }

    /// Postal code and city on one line, e.g. `75011 Paris`.
    #[must_use]
    pub fn city_line(&self) -> String {
        format!("{} {}", self.postal_code, self.city)
    }
}

/// Fields submitted to create an address.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewAddress {
    pub full_name: String,
    pub street: String,
    pub postal_code: String,
    pub city: String,
    pub country: String,
}

impl NewAddress {
    /// Trim every field and reject blanks.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingField`] naming the first blank field.
    pub fn validate(self) -> Result<Self, ValidationError> {
        fn required(value: String, field: &'static str) -> Result<String, ValidationError> {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                Err(ValidationError::MissingField(field))
            } else {
                Ok(trimmed.to_owned())
            }
        }

        Ok(Self {
            full_name: required(self.full_name, "full_name")?,
            street: required(self.street, "street")?,
            postal_code: required(self.postal_code, "postal_code")?,
            city: required(self.city, "city")?,
            country: required(self.country, "country")?,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn fields() -> NewAddress {
        NewAddress {
            full_name: " Claire Martin ".into(),
            street: "12 rue des Lilas".into(),
            postal_code: "75011".into(),
            city: "Paris".into(),
            country: "France".into(),
        }
    }

    #[test]
    fn test_validate_trims() {
        let address = fields().validate().unwrap();
        assert_eq!(address.full_name, "Claire Martin");
    }

    #[test]
    fn test_validate_rejects_blank_field() {
        let mut input = fields();
        input.city = "   ".into();
        assert_eq!(
            input.validate(),
            Err(ValidationError::MissingField("city"))
        );
    }

    #[test]
    fn test_usable_by_requires_owner_and_active() {
        let owner = UserId::random();
        let mut address = Address {
            id: AddressId::random(),
            customer_id: owner,
            full_name: "C".into(),
            street: "S".into(),
            postal_code: "P".into(),
            city: "Paris".into(),
            country: "France".into(),
            is_active: true,
        };
        assert!(address.usable_by(owner));
        assert!(!address.usable_by(UserId::random()));
        address.is_active = false;
        assert!(!address.usable_by(owner));
    }
}
