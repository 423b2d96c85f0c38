//! Staff-triggered order status changes.
//!
//! A change is checked against the [`TransitionPolicy`], persisted with a
//! compare-and-set on the previous status, and followed by exactly one push
//! notification to the customer. The notification is sent on a background
//! task; its failures are logged and never undo the change.

use std::sync::Arc;

use thiserror::Error;
use tracing::{Instrument, info, instrument, warn};
use url::Url;

use audie_boutique_core::ports::{OrderStore, PushMessage, PushNotifier, StoreError};
use audie_boutique_core::{
    Locale, Order, OrderStatus, StatusChange, TransitionError, TransitionPolicy,
};

/// Why a status change was not applied.
#[derive(Debug, Error)]
pub enum StatusUpdateError {
    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Applies status changes and notifies customers.
pub struct OrderStatusService {
    orders: Arc<dyn OrderStore>,
    notifier: Arc<dyn PushNotifier>,
    policy: TransitionPolicy,
    locale: Locale,
    storefront_base_url: Url,
}

impl OrderStatusService {
    #[must_use]
    pub fn new(
        orders: Arc<dyn OrderStore>,
        notifier: Arc<dyn PushNotifier>,
        policy: TransitionPolicy,
        locale: Locale,
        storefront_base_url: Url,
    ) -> Self {
        Self {
            orders,
            notifier,
            policy,
            locale,
            storefront_base_url,
        }
    }

    #[must_use]
    pub const fn policy(&self) -> TransitionPolicy {
        self.policy
    }

    /// Move `order` to `new_status`.
    ///
    /// Requesting the current status is a no-op: nothing is written and no
    /// notification is sent. On any persistence failure `order.status` is
    /// restored to its previous value.
    ///
    /// # Errors
    ///
    /// Returns [`StatusUpdateError::Transition`] for an illegal move (the
    /// order is untouched) and [`StatusUpdateError::Store`] when the write
    /// fails, including [`StoreError::Conflict`] when someone else changed the
    /// status first.
    #[instrument(
        skip(self, order),
        fields(order = %order.id, from = %order.status, to = %new_status)
    )]
    pub async fn apply_status(
        &self,
        order: &mut Order,
        new_status: OrderStatus,
    ) -> Result<StatusChange, StatusUpdateError> {
        let change = self.policy.check(order.status, new_status)?;
        let StatusChange::Changed { from, to } = change else {
            info!("status unchanged, nothing to do");
            return Ok(change);
        };

        order.status = to;
        if let Err(e) = self.orders.update_order_status(order.id, from, to).await {
            order.status = from;
            warn!(error = %e, "status update failed, rolled back");
            return Err(e.into());
        }
        info!("order status updated");

        let notifier = Arc::clone(&self.notifier);
        let customer = order.customer_id;
        let message = self.message_for(order);
        tokio::spawn(
            async move {
                if let Err(e) = notifier.send_push(customer, message).await {
                    warn!(error = %e, %customer, "status notification failed");
                }
            }
            .in_current_span(),
        );

        Ok(change)
    }

    /// Load an order and move it to `new_status`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::apply_status`], plus [`StoreError::NotFound`].
    pub async fn update(
        &self,
        id: audie_boutique_core::OrderId,
        new_status: OrderStatus,
    ) -> Result<(Order, StatusChange), StatusUpdateError> {
        let mut order = self.orders.fetch_order(id).await?;
        let change = self.apply_status(&mut order, new_status).await?;
        Ok((order, change))
    }

    /// Push notification announcing the order's current status.
    #[must_use]
    pub fn message_for(&self, order: &Order) -> PushMessage {
        let reference = order.reference();
        let label = order.status.label(self.locale);
        let (title, body) = match self.locale {
            Locale::Fr => (
                format!("Commande {reference}"),
                format!("Votre commande est maintenant : {label}"),
            ),
            Locale::En => (
                format!("Order {reference}"),
                format!("Your order is now: {label}"),
            ),
        };
        PushMessage {
            title,
            body,
            url: format!(
                "{}/orders/{}",
                self.storefront_base_url.as_str().trim_end_matches('/'),
                order.id
            ),
        }
    }
}

impl std::fmt::Debug for OrderStatusService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderStatusService")
            .field("policy", &self.policy)
            .field("locale", &self.locale)
            .finish_non_exhaustive()
    }
}
