//! Application state shared across handlers.

use std::sync::Arc;

use audie_boutique_core::ports::{
    AddressBook, Authenticator, OrderStore, ProductCatalog, UserDirectory,
};

use crate::config::StorefrontConfig;
use crate::services::CheckoutService;

/// Backend port implementations the storefront runs against.
#[derive(Clone)]
pub struct Backends {
    pub authenticator: Arc<dyn Authenticator>,
    pub orders: Arc<dyn OrderStore>,
    pub users: Arc<dyn UserDirectory>,
    pub addresses: Arc<dyn AddressBook>,
    pub products: Arc<dyn ProductCatalog>,
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    backends: Backends,
    checkout: CheckoutService,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: StorefrontConfig, backends: Backends) -> Self {
        let checkout = CheckoutService::new(
            Arc::clone(&backends.orders),
            Arc::clone(&backends.addresses),
            config.shipping,
            config.promo_codes.clone(),
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                backends,
                checkout,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the backend ports.
    #[must_use]
    pub fn backends(&self) -> &Backends {
        &self.inner.backends
    }

    #[must_use]
    pub fn checkout(&self) -> &CheckoutService {
        &self.inner.checkout
    }
}
