//! Edge function clients.
//!
//! - `send-push` takes a JSON body and fans out to the customer's registered
//!   devices.
//! - `send-invoice` takes a multipart form with the rendered document and
//!   emails it.
//!
//! Both are called with the service-role key.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Serialize;

use audie_boutique_core::ports::{InvoiceUploader, PushMessage, PushNotifier, StoreError};
use audie_boutique_core::{OrderId, UserId};

use crate::client::SupabaseClient;

const SEND_PUSH_PATH: &str = "/functions/v1/send-push";
const SEND_INVOICE_PATH: &str = "/functions/v1/send-invoice";

#[derive(Debug, Serialize)]
struct SendPushBody<'a> {
    user_id: UserId,
    title: &'a str,
    body: &'a str,
    url: &'a str,
}

/// Push and invoice delivery through Supabase edge functions.
#[derive(Debug, Clone)]
pub struct EdgeFunctions {
    client: SupabaseClient,
}

impl EdgeFunctions {
    #[must_use]
    pub const fn new(client: SupabaseClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PushNotifier for EdgeFunctions {
    #[tracing::instrument(skip(self, message), fields(customer = %customer))]
    async fn send_push(&self, customer: UserId, message: PushMessage) -> Result<(), StoreError> {
        let body = SendPushBody {
            user_id: customer,
            title: &message.title,
            body: &message.body,
            url: &message.url,
        };
        self.client.post_service(SEND_PUSH_PATH, &body).await?;
        tracing::debug!("push notification dispatched");
        Ok(())
    }
}

fn invoice_form(customer: UserId, order: OrderId, document: Vec<u8>) -> Result<Form, StoreError> {
    let file = Part::bytes(document)
        .file_name(format!("facture-{}.html", order.short()))
        .mime_str("text/html; charset=utf-8")
        .map_err(|e| StoreError::Malformed(format!("invoice part: {e}")))?;
    Ok(Form::new()
        .text("user_id", customer.to_string())
        .text("order_id", order.to_string())
        .part("file", file))
}

#[async_trait]
impl InvoiceUploader for EdgeFunctions {
    #[tracing::instrument(
        skip(self, document),
        fields(customer = %customer, order = %order, bytes = document.len())
    )]
    async fn send_invoice(
        &self,
        customer: UserId,
        order: OrderId,
        document: Vec<u8>,
    ) -> Result<(), StoreError> {
        let form = invoice_form(customer, order, document)?;
        self.client
            .post_multipart_service(SEND_INVOICE_PATH, form)
            .await?;
        tracing::info!("invoice sent");
        Ok(())
    }
}
