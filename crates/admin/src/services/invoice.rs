//! Invoice rendering and delivery.
//!
//! Invoices are rendered from the order snapshot only, so the same order
//! always produces the same document.

use std::sync::Arc;

use askama::Template;
use thiserror::Error;
use tracing::instrument;

use audie_boutique_core::ports::{AddressBook, InvoiceUploader, StoreError, UserDirectory};
use audie_boutique_core::{Address, LineItem, Money, Order, User};

/// Why an invoice could not be produced or sent.
#[derive(Debug, Error)]
pub enum InvoiceError {
    #[error("template error: {0}")]
    Render(#[from] askama::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One invoice row.
#[derive(Debug, Clone)]
pub struct InvoiceLineView {
    pub name: String,
    pub variant: Option<String>,
    pub quantity: u32,
    pub unit_price: String,
    pub total: String,
}

impl From<&LineItem> for InvoiceLineView {
    fn from(item: &LineItem) -> Self {
        let variant = match (&item.selected_color, &item.selected_size) {
            (Some(color), Some(size)) => Some(format!("{color} / {size}")),
            (Some(one), None) | (None, Some(one)) => Some(one.clone()),
            (None, None) => None,
        };
        Self {
            name: item.name.clone(),
            variant,
            quantity: item.quantity,
            unit_price: item.unit_price.to_string(),
            total: item.line_total().to_string(),
        }
    }
}

/// Invoice document template.
#[derive(Template)]
#[template(path = "invoice.html")]
pub struct InvoiceTemplate {
    pub reference: String,
    pub order_date: String,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub address: Option<Address>,
    pub pickup: bool,
    pub lines: Vec<InvoiceLineView>,
    pub subtotal: String,
    pub shipping: String,
    pub discount: Option<String>,
    pub total: String,
}

/// Render an invoice for `order`.
///
/// # Errors
///
/// Returns the template error if rendering fails.
pub fn render_invoice(
    order: &Order,
    customer: Option<&User>,
    address: Option<&Address>,
) -> Result<Vec<u8>, askama::Error> {
    let totals = &order.totals;
    let template = InvoiceTemplate {
        reference: order.reference(),
        order_date: order.created_at.format("%d/%m/%Y").to_string(),
        customer_name: customer.map_or_else(
            || audie_boutique_core::user::UNKNOWN_CUSTOMER_LABEL.to_owned(),
            User::display_name,
        ),
        customer_email: customer
            .and_then(|c| c.email.as_ref())
            .map(ToString::to_string),
        address: address.cloned(),
        pickup: !order.is_shipping,
        lines: order.items.iter().map(InvoiceLineView::from).collect(),
        subtotal: totals.subtotal().to_string(),
        shipping: totals.shipping().to_string(),
        discount: (totals.discount() > Money::ZERO).then(|| totals.discount().to_string()),
        total: totals.total().to_string(),
    };
    Ok(template.render()?.into_bytes())
}

/// Renders invoices and sends them through the invoice edge function.
pub struct InvoiceService {
    users: Arc<dyn UserDirectory>,
    addresses: Arc<dyn AddressBook>,
    uploader: Arc<dyn InvoiceUploader>,
}

impl InvoiceService {
    #[must_use]
    pub fn new(
        users: Arc<dyn UserDirectory>,
        addresses: Arc<dyn AddressBook>,
        uploader: Arc<dyn InvoiceUploader>,
    ) -> Self {
        Self {
            users,
            addresses,
            uploader,
        }
    }

    /// Render the invoice document for an order.
    ///
    /// A missing customer record falls back to the unknown-customer label;
    /// other backend failures are returned.
    ///
    /// # Errors
    ///
    /// Returns [`InvoiceError`] on backend or template failure.
    #[instrument(skip(self, order), fields(order = %order.id))]
    pub async fn render(&self, order: &Order) -> Result<Vec<u8>, InvoiceError> {
        let customer = match self.users.fetch_user(order.customer_id).await {
            Ok(user) => Some(user),
            Err(StoreError::NotFound(_)) => None,
            Err(e) => return Err(e.into()),
        };
        let address = match order.address_id {
            Some(id) => Some(self.addresses.fetch_address(id).await?),
            None => None,
        };
        Ok(render_invoice(order, customer.as_ref(), address.as_ref())?)
    }

    /// Render and deliver the invoice to the order's customer.
    ///
    /// # Errors
    ///
    /// Returns [`InvoiceError`] on backend or template failure.
    #[instrument(skip(self, order), fields(order = %order.id))]
    pub async fn send(&self, order: &Order) -> Result<(), InvoiceError> {
        let document = self.render(order).await?;
        self.uploader
            .send_invoice(order.customer_id, order.id, document)
            .await?;
        Ok(())
    }
}

impl std::fmt::Debug for InvoiceService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvoiceService").finish_non_exhaustive()
    }
}
