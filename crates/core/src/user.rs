//! Users.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::{Email, UserId, UserRole};

/// Label shown when an order's customer record cannot be found.
pub const UNKNOWN_CUSTOMER_LABEL: &str = "Client inconnu";

/// A row of the `users` table (customers and staff alike).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub full_name: Option<String>,
    pub email: Option<Email>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Best available display name: full name, then email, then a fallback.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.full_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(ToOwned::to_owned)
            .or_else(|| self.email.as_ref().map(ToString::to_string))
            .unwrap_or_else(|| UNKNOWN_CUSTOMER_LABEL.to_owned())
    }
}
