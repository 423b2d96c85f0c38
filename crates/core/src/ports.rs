//! Backend seams.
//!
//! The services in `admin` and `storefront` talk to storage and side-channel
//! backends only through these traits. Production implementations live in
//! `audie-boutique-supabase`; tests use in-memory fakes.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::address::{Address, NewAddress};
use crate::order::{NewOrder, Order};
use crate::product::Product;
use crate::types::{AddressId, OrderId, OrderStatus, ProductId, UserId, UserRole};
use crate::user::User;

/// Failure reported by a backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The requested record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A compare-and-set update found a different status than expected.
    #[error("order status changed concurrently: expected {expected}, found {actual}")]
    Conflict {
        expected: OrderStatus,
        actual: OrderStatus,
    },

    /// The backend rejected or failed the request.
    #[error("backend error: {0}")]
    Backend(String),

    /// A stored record could not be turned into a domain value.
    #[error("malformed record: {0}")]
    Malformed(String),

    /// The backend did not answer in time.
    #[error("backend timed out")]
    Timeout,
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Resolve a bearer access token to its user.
    ///
    /// Returns `Ok(None)` for an invalid or expired token.
    async fn authenticate(&self, token: &str) -> Result<Option<UserId>, StoreError>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// All orders, newest first.
    async fn fetch_orders(&self) -> Result<Vec<Order>, StoreError>;

    async fn fetch_order(&self, id: OrderId) -> Result<Order, StoreError>;

    /// Set `status` to `new` only if it is currently `expected`.
    ///
    /// Returns [`StoreError::Conflict`] when another writer got there first.
    async fn update_order_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        new: OrderStatus,
    ) -> Result<(), StoreError>;

    async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError>;
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// All users, optionally restricted to one role.
    async fn fetch_users(&self, role: Option<UserRole>) -> Result<Vec<User>, StoreError>;

    async fn fetch_user(&self, id: UserId) -> Result<User, StoreError>;
}

#[async_trait]
pub trait AddressBook: Send + Sync {
    /// Fetch an address, including soft-deleted ones.
    async fn fetch_address(&self, id: AddressId) -> Result<Address, StoreError>;

    /// Active addresses of one customer.
    async fn fetch_addresses(&self, customer: UserId) -> Result<Vec<Address>, StoreError>;

    async fn insert_address(
        &self,
        customer: UserId,
        address: NewAddress,
    ) -> Result<Address, StoreError>;

    /// Mark an address inactive. Orders keep referencing it.
    async fn soft_delete_address(&self, id: AddressId) -> Result<(), StoreError>;
}

#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn fetch_product(&self, id: ProductId) -> Result<Product, StoreError>;
}

/// Content of a push notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
    pub url: String,
}

#[async_trait]
pub trait PushNotifier: Send + Sync {
    async fn send_push(&self, customer: UserId, message: PushMessage) -> Result<(), StoreError>;
}

#[async_trait]
pub trait InvoiceUploader: Send + Sync {
    /// Deliver a rendered invoice document to a customer.
    async fn send_invoice(
        &self,
        customer: UserId,
        order: OrderId,
        document: Vec<u8>,
    ) -> Result<(), StoreError>;
}
