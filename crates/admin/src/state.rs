//! Application state shared across handlers.

use std::sync::Arc;

use audie_boutique_core::ports::{
    AddressBook, Authenticator, InvoiceUploader, OrderStore, PushNotifier, UserDirectory,
};

use crate::config::AdminConfig;
use crate::services::{DashboardService, InvoiceService, OrderStatusService};

/// Backend port implementations the admin API runs against.
///
/// Production wires every field to Supabase; tests use in-memory fakes.
#[derive(Clone)]
pub struct Backends {
    pub authenticator: Arc<dyn Authenticator>,
    pub orders: Arc<dyn OrderStore>,
    pub users: Arc<dyn UserDirectory>,
    pub addresses: Arc<dyn AddressBook>,
    pub notifier: Arc<dyn PushNotifier>,
    pub invoices: Arc<dyn InvoiceUploader>,
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    backends: Backends,
    order_status: OrderStatusService,
    dashboard: DashboardService,
    invoices: InvoiceService,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: AdminConfig, backends: Backends) -> Self {
        let order_status = OrderStatusService::new(
            Arc::clone(&backends.orders),
            Arc::clone(&backends.notifier),
            config.transition_policy,
            config.notification_locale,
            config.storefront_base_url.clone(),
        );
        let dashboard =
            DashboardService::new(Arc::clone(&backends.orders), Arc::clone(&backends.users));
        let invoices = InvoiceService::new(
            Arc::clone(&backends.users),
            Arc::clone(&backends.addresses),
            Arc::clone(&backends.invoices),
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                backends,
                order_status,
                dashboard,
                invoices,
            }),
        }
    }

    /// Get a reference to the admin configuration.
    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Get a reference to the backend ports.
    #[must_use]
    pub fn backends(&self) -> &Backends {
        &self.inner.backends
    }

    #[must_use]
    pub fn order_status(&self) -> &OrderStatusService {
        &self.inner.order_status
    }

    #[must_use]
    pub fn dashboard(&self) -> &DashboardService {
        &self.inner.dashboard
    }

    #[must_use]
    pub fn invoices(&self) -> &InvoiceService {
        &self.inner.invoices
    }
}
