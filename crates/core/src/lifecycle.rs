//! Order status transition rules.
//!
//! ```text
//! Pending ──► Processing ──► Shipped ──► Delivered
//!    │            │             ┆
//!    └────────────┴─────────────┴┄┄► Cancelled
//! ```
//!
//! The dotted edge (cancelling a shipped order) is business policy and off by
//! default. `Delivered` and `Cancelled` are terminal.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::OrderStatus;

/// A rejected status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("cannot move order from {from} to {to}")]
    NotAllowed { from: OrderStatus, to: OrderStatus },
}

/// Outcome of checking a requested status against the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StatusChange {
    /// The order already has the requested status.
    Unchanged { status: OrderStatus },
    /// The order moves to a new status.
    Changed { from: OrderStatus, to: OrderStatus },
}

/// Which transitions staff may apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransitionPolicy {
    /// Permit `Shipped -> Cancelled` (e.g. parcel returned to sender).
    pub allow_cancel_after_shipping: bool,
}

impl TransitionPolicy {
    /// Whether `from -> to` is a legal move. Same-status is not a move.
    #[must_use]
    pub const fn permits(&self, from: OrderStatus, to: OrderStatus) -> bool {
        use OrderStatus::{Cancelled, Delivered, Pending, Processing, Shipped};
        match (from, to) {
            (Pending, Processing | Cancelled)
            | (Processing, Shipped | Cancelled)
            | (Shipped, Delivered) => true,
            (Shipped, Cancelled) => self.allow_cancel_after_shipping,
            _ => false,
        }
    }

    /// Classify a requested status change.
    ///
    /// Requesting the current status is a no-op, which makes resent requests
    /// safe.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::NotAllowed`] for an illegal move.
    pub fn check(
        &self,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<StatusChange, TransitionError> {
        if from == to {
            return Ok(StatusChange::Unchanged { status: from });
        }
        if self.permits(from, to) {
            Ok(StatusChange::Changed { from, to })
        } else {
            Err(TransitionError::NotAllowed { from, to })
        }
    }

    /// Statuses reachable in one step from `from`, for building staff menus.
    #[must_use]
    pub fn next_statuses(&self, from: OrderStatus) -> Vec<OrderStatus> {
        OrderStatus::ALL
            .into_iter()
            .filter(|&to| self.permits(from, to))
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use OrderStatus::{Cancelled, Delivered, Pending, Processing, Shipped};

    #[test]
    fn test_happy_path() {
        let policy = TransitionPolicy::default();
        for (from, to) in [(Pending, Processing), (Processing, Shipped), (Shipped, Delivered)] {
            assert_eq!(
                policy.check(from, to).unwrap(),
                StatusChange::Changed { from, to }
            );
        }
    }

    #[test]
    fn test_same_status_is_unchanged() {
        let policy = TransitionPolicy::default();
        for status in OrderStatus::ALL {
            assert_eq!(
                policy.check(status, status).unwrap(),
                StatusChange::Unchanged { status }
            );
        }
    }

    #[test]
    fn test_cancel_before_shipping() {
        let policy = TransitionPolicy::default();
        assert!(policy.check(Pending, Cancelled).is_ok());
        assert!(policy.check(Processing, Cancelled).is_ok());
    }

    #[test]
    fn test_cancel_after_shipping_depends_on_policy() {
        let strict = TransitionPolicy::default();
        assert_eq!(
            strict.check(Shipped, Cancelled),
            Err(TransitionError::NotAllowed {
                from: Shipped,
                to: Cancelled
            })
        );
        let lenient = TransitionPolicy {
            allow_cancel_after_shipping: true,
        };
        assert!(lenient.check(Shipped, Cancelled).is_ok());
        assert!(lenient.check(Delivered, Cancelled).is_err());
    }

    #[test]
    fn test_terminal_and_backward_moves_are_rejected() {
        let policy = TransitionPolicy::default();
        assert!(policy.check(Delivered, Shipped).is_err());
        assert!(policy.check(Cancelled, Pending).is_err());
        assert!(policy.check(Shipped, Processing).is_err());
        assert!(policy.check(Pending, Shipped).is_err());
    }

    #[test]
    fn test_next_statuses() {
        let policy = TransitionPolicy::default();
        assert_eq!(policy.next_statuses(Pending), vec![Processing, Cancelled]);
        assert_eq!(policy.next_statuses(Shipped), vec![Delivered]);
        assert!(policy.next_statuses(Delivered).is_empty());
    }
}
