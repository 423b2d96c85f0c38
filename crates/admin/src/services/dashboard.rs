//! Dashboard statistics.
//!
//! Reads are best-effort: if orders or users cannot be fetched the dashboard
//! renders from an empty list and the failure is logged.

use std::sync::Arc;

use tracing::{instrument, warn};

use audie_boutique_core::ports::{OrderStore, UserDirectory};
use audie_boutique_core::stats::{self, DateRange, OrderStats};

/// Builds [`OrderStats`] from the current backend snapshot.
pub struct DashboardService {
    orders: Arc<dyn OrderStore>,
    users: Arc<dyn UserDirectory>,
}

impl DashboardService {
    #[must_use]
    pub fn new(orders: Arc<dyn OrderStore>, users: Arc<dyn UserDirectory>) -> Self {
        Self { orders, users }
    }

    /// Statistics for `range`, with the `recent_limit` newest orders.
    #[instrument(skip(self), fields(start = %range.start(), end = %range.end()))]
    pub async fn stats(&self, range: DateRange, recent_limit: usize) -> OrderStats {
        let (orders, users) = tokio::join!(
            self.orders.fetch_orders(),
            self.users.fetch_users(None)
        );

        let orders = orders.unwrap_or_else(|e| {
            warn!(error = %e, "could not load orders for dashboard");
            Vec::new()
        });
        let users = users.unwrap_or_else(|e| {
            warn!(error = %e, "could not load users for dashboard");
            Vec::new()
        });

        stats::aggregate(&orders, &range, &users, recent_limit)
    }
}

impl std::fmt::Debug for DashboardService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardService").finish_non_exhaustive()
    }
}
