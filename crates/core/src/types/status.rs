//! Status and role enums.

use core::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a wire value does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind}: {value}")]
pub struct ParseEnumError {
    /// Which enum was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

/// Order status.
///
/// Exactly one status at a time. Changes are staff-triggered, never derived
/// from other order fields. `Processing` is stored as `paid`, which is what
/// the storefront shows customers once payment cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    #[serde(rename = "paid")]
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Wire/database name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "paid",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Every spelling a stored row may carry for this status, canonical first.
    #[must_use]
    pub const fn stored_names(self) -> &'static [&'static str] {
        match self {
            Self::Pending => &["pending"],
            Self::Processing => &["paid", "processing"],
            Self::Shipped => &["shipped"],
            Self::Delivered => &["delivered"],
            Self::Cancelled => &["cancelled", "canceled"],
        }
    }

    /// Human-readable label shown to customers.
    #[must_use]
    pub const fn label(self, locale: Locale) -> &'static str {
        match (locale, self) {
            (Locale::Fr, Self::Pending) => "En attente",
            (Locale::Fr, Self::Processing) => "Payée",
            (Locale::Fr, Self::Shipped) => "Expédiée",
            (Locale::Fr, Self::Delivered) => "Livrée",
            (Locale::Fr, Self::Cancelled) => "Annulée",
            (Locale::En, Self::Pending) => "Pending",
            (Locale::En, Self::Processing) => "Paid",
            (Locale::En, Self::Shipped) => "Shipped",
            (Locale::En, Self::Delivered) => "Delivered",
            (Locale::En, Self::Cancelled) => "Cancelled",
        }
    }

    /// Whether orders in this status count towards revenue.
    #[must_use]
    pub const fn counts_as_revenue(self) -> bool {
        !matches!(self, Self::Pending | Self::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for OrderStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            // Older rows were written with "processing" before the rename.
            "paid" | "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            _ => Err(ParseEnumError {
                kind: "order status",
                value: s.to_owned(),
            }),
        }
    }
}

/// Language used for customer-facing text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Locale {
    #[default]
    Fr,
    En,
}

impl core::str::FromStr for Locale {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fr" => Ok(Self::Fr),
            "en" => Ok(Self::En),
            _ => Err(ParseEnumError {
                kind: "locale",
                value: s.to_owned(),
            }),
        }
    }
}

/// Role of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Store owner: full back-office access.
    Admin,
    /// Staff member handling orders.
    Agent,
    /// Shop customer.
    Client,
}

/// Something a user may be allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ViewDashboard,
    ViewOrders,
    ManageOrders,
    SendInvoices,
    ManageUsers,
    PlaceOrders,
    ManageOwnAddresses,
}

impl UserRole {
    /// Whether this role grants `permission`.
    ///
    /// This is the only place role strings turn into access decisions.
    #[must_use]
    pub const fn can(self, permission: Permission) -> bool {
        match self {
            Self::Admin => true,
            Self::Agent => !matches!(
                permission,
                Permission::ViewDashboard | Permission::ManageUsers
            ),
            Self::Client => matches!(
                permission,
                Permission::PlaceOrders | Permission::ManageOwnAddresses
            ),
        }
    }

    /// Whether this role belongs to store staff.
    #[must_use]
    pub const fn is_staff(self) -> bool {
        matches!(self, Self::Admin | Self::Agent)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Agent => write!(f, "agent"),
            Self::Client => write!(f, "client"),
        }
    }
}

impl core::str::FromStr for UserRole {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "agent" => Ok(Self::Agent),
            "client" => Ok(Self::Client),
            _ => Err(ParseEnumError {
                kind: "user role",
                value: s.to_owned(),
            }),
        }
    }
}
