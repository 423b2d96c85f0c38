//! In-memory backends and fixtures for Audie Boutique tests.
//!
//! [`MemoryBackend`] implements every core port over plain collections, can
//! be told to fail specific operations, and records the push notifications
//! and invoices it was asked to send. The `*_state` helpers wire it into the
//! admin and storefront application states.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p audie-boutique-integration-tests
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use chrono::{DateTime, TimeZone, Utc};
use secrecy::SecretString;
use serde_json::Value;
use tokio::sync::Mutex;
use tower::ServiceExt;
use url::Url;

use audie_boutique_admin::config::{AdminConfig, LogFormat as AdminLogFormat};
use audie_boutique_admin::state::{AppState as AdminState, Backends as AdminBackends};
use audie_boutique_core::ports::{
    AddressBook, Authenticator, InvoiceUploader, OrderStore, ProductCatalog, PushMessage,
    PushNotifier, StoreError, UserDirectory,
};
use audie_boutique_core::{
    Address, AddressId, Email, LineItem, Locale, Money, NewAddress, NewOrder, Order, OrderId,
    OrderStatus, OrderTotals, Product, ProductId, ShippingRules, TransitionPolicy, User, UserId,
    UserRole,
};
use audie_boutique_storefront::config::{LogFormat as StorefrontLogFormat, StorefrontConfig};
use audie_boutique_storefront::services::PromoCodes;
use audie_boutique_storefront::state::{AppState as StorefrontState, Backends as StorefrontBackends};
use audie_boutique_supabase::SupabaseConfig;

/// Backend operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Authenticate,
    FetchOrders,
    FetchOrder,
    UpdateStatus,
    InsertOrder,
    FetchUsers,
    FetchUser,
    FetchAddress,
    InsertAddress,
    SendPush,
    SendInvoice,
}

/// A recorded invoice upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentInvoice {
    pub customer: UserId,
    pub order: OrderId,
    pub document: Vec<u8>,
}

#[derive(Debug, Default)]
struct Data {
    tokens: HashMap<String, UserId>,
    orders: Vec<Order>,
    users: Vec<User>,
    addresses: Vec<Address>,
    products: Vec<Product>,
    pushes: Vec<(UserId, PushMessage)>,
    invoices: Vec<SentInvoice>,
    failures: HashMap<Operation, StoreError>,
    push_delay: Option<Duration>,
    status_writes: usize,
}

impl Data {
    fn check(&self, op: Operation) -> Result<(), StoreError> {
        self.failures.get(&op).map_or(Ok(()), |e| Err(e.clone()))
    }
}

/// Every port, backed by in-memory collections.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    data: Mutex<Data>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a user and the bearer token that authenticates as them.
    pub async fn add_user(&self, user: User, token: &str) {
        let mut data = self.data.lock().await;
        data.tokens.insert(token.to_owned(), user.id);
        data.users.push(user);
    }

    /// Register a user with no token.
    pub async fn add_customer(&self, user: User) {
        self.data.lock().await.users.push(user);
    }

    pub async fn add_order(&self, order: Order) {
        self.data.lock().await.orders.push(order);
    }

    pub async fn add_address(&self, address: Address) {
        self.data.lock().await.addresses.push(address);
    }

    pub async fn add_product(&self, product: Product) {
        self.data.lock().await.products.push(product);
    }

    /// Make `op` fail with `error` until [`Self::heal`] is called.
    pub async fn fail(&self, op: Operation, error: StoreError) {
        self.data.lock().await.failures.insert(op, error);
    }

    pub async fn heal(&self, op: Operation) {
        self.data.lock().await.failures.remove(&op);
    }

    /// Make every push notification take `delay` before it is recorded.
    pub async fn slow_pushes(&self, delay: Duration) {
        self.data.lock().await.push_delay = Some(delay);
    }

    /// Change an order's stored status directly, as another writer would.
    pub async fn overwrite_status(&self, id: OrderId, status: OrderStatus) {
        let mut data = self.data.lock().await;
        if let Some(order) = data.orders.iter_mut().find(|o| o.id == id) {
            order.status = status;
        }
    }

    pub async fn stored_order(&self, id: OrderId) -> Option<Order> {
        self.data
            .lock()
            .await
            .orders
            .iter()
            .find(|o| o.id == id)
            .cloned()
    }

    pub async fn stored_orders(&self) -> Vec<Order> {
        self.data.lock().await.orders.clone()
    }

    pub async fn stored_address(&self, id: AddressId) -> Option<Address> {
        self.data
            .lock()
            .await
            .addresses
            .iter()
            .find(|a| a.id == id)
            .cloned()
    }

    /// Push notifications sent so far.
    pub async fn pushes(&self) -> Vec<(UserId, PushMessage)> {
        self.data.lock().await.pushes.clone()
    }

    /// Wait until at least `count` push notifications were sent, for up to
    /// two seconds, and return them.
    pub async fn wait_for_pushes(&self, count: usize) -> Vec<(UserId, PushMessage)> {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        loop {
            let pushes = self.pushes().await;
            if pushes.len() >= count || tokio::time::Instant::now() >= deadline {
                return pushes;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    /// Invoices uploaded so far.
    pub async fn invoices(&self) -> Vec<SentInvoice> {
        self.data.lock().await.invoices.clone()
    }

    /// Successful status writes so far.
    pub async fn status_writes(&self) -> usize {
        self.data.lock().await.status_writes
    }
}

#[async_trait]
impl Authenticator for MemoryBackend {
    async fn authenticate(&self, token: &str) -> Result<Option<UserId>, StoreError> {
        let data = self.data.lock().await;
        data.check(Operation::Authenticate)?;
        Ok(data.tokens.get(token).copied())
    }
}

#[async_trait]
impl OrderStore for MemoryBackend {
    async fn fetch_orders(&self) -> Result<Vec<Order>, StoreError> {
        let data = self.data.lock().await;
        data.check(Operation::FetchOrders)?;
        let mut orders = data.orders.clone();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn fetch_order(&self, id: OrderId) -> Result<Order, StoreError> {
        let data = self.data.lock().await;
        data.check(Operation::FetchOrder)?;
        data.orders
            .iter()
            .find(|o| o.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("order {id}")))
    }

    async fn update_order_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        new: OrderStatus,
    ) -> Result<(), StoreError> {
        let mut data = self.data.lock().await;
        data.check(Operation::UpdateStatus)?;
        let order = data
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("order {id}")))?;
        if order.status != expected {
            return Err(StoreError::Conflict {
                expected,
                actual: order.status,
            });
        }
        order.status = new;
        data.status_writes += 1;
        Ok(())
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError> {
        let mut data = self.data.lock().await;
        data.check(Operation::InsertOrder)?;
        let order = Order {
            id: OrderId::random(),
            customer_id: order.customer_id,
            created_at: Utc::now(),
            status: order.status,
            is_shipping: order.is_shipping,
            address_id: order.address_id,
            items: order.items,
            totals: order.totals,
        };
        data.orders.push(order.clone());
        Ok(order)
    }
}

#[async_trait]
impl UserDirectory for MemoryBackend {
    async fn fetch_users(&self, role: Option<UserRole>) -> Result<Vec<User>, StoreError> {
        let data = self.data.lock().await;
        data.check(Operation::FetchUsers)?;
        Ok(data
            .users
            .iter()
            .filter(|u| role.is_none_or(|r| u.role == r))
            .cloned()
            .collect())
    }

    async fn fetch_user(&self, id: UserId) -> Result<User, StoreError> {
        let data = self.data.lock().await;
        data.check(Operation::FetchUser)?;
        data.users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("user {id}")))
    }
}

#[async_trait]
impl AddressBook for MemoryBackend {
    async fn fetch_address(&self, id: AddressId) -> Result<Address, StoreError> {
        let data = self.data.lock().await;
        data.check(Operation::FetchAddress)?;
        data.addresses
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("address {id}")))
    }

    async fn fetch_addresses(&self, customer: UserId) -> Result<Vec<Address>, StoreError> {
        let data = self.data.lock().await;
        Ok(data
            .addresses
            .iter()
            .filter(|a| a.usable_by(customer))
            .cloned()
            .collect())
    }

    async fn insert_address(
        &self,
        customer: UserId,
        address: NewAddress,
    ) -> Result<Address, StoreError> {
        let mut data = self.data.lock().await;
        data.check(Operation::InsertAddress)?;
        let address = Address {
            id: AddressId::random(),
            customer_id: customer,
            full_name: address.full_name,
            street: address.street,
            postal_code: address.postal_code,
            city: address.city,
            country: address.country,
            is_active: true,
        };
        data.addresses.push(address.clone());
        Ok(address)
    }

    async fn soft_delete_address(&self, id: AddressId) -> Result<(), StoreError> {
        let mut data = self.data.lock().await;
        let address = data
            .addresses
            .iter_mut()
            .find(|a| a.id == id && a.is_active)
            .ok_or_else(|| StoreError::NotFound(format!("address {id}")))?;
        address.is_active = false;
        Ok(())
    }
}

#[async_trait]
impl ProductCatalog for MemoryBackend {
    async fn fetch_product(&self, id: ProductId) -> Result<Product, StoreError> {
        let data = self.data.lock().await;
        data.products
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("product {id}")))
    }
}

#[async_trait]
impl PushNotifier for MemoryBackend {
    async fn send_push(&self, customer: UserId, message: PushMessage) -> Result<(), StoreError> {
        let delay = {
            let data = self.data.lock().await;
            data.check(Operation::SendPush)?;
            data.push_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.data.lock().await.pushes.push((customer, message));
        Ok(())
    }
}

#[async_trait]
impl InvoiceUploader for MemoryBackend {
    async fn send_invoice(
        &self,
        customer: UserId,
        order: OrderId,
        document: Vec<u8>,
    ) -> Result<(), StoreError> {
        let mut data = self.data.lock().await;
        data.check(Operation::SendInvoice)?;
        data.invoices.push(SentInvoice {
            customer,
            order,
            document,
        });
        Ok(())
    }
}

// =============================================================================
// Application states
// =============================================================================

fn supabase_config() -> SupabaseConfig {
    SupabaseConfig {
        url: url("https://project.supabase.co"),
        anon_key: SecretString::from("anon-key"),
        service_role_key: SecretString::from("service-role-key"),
        timeout: Duration::from_secs(10),
    }
}

fn url(raw: &str) -> Url {
    Url::parse(raw).unwrap_or_else(|e| panic!("invalid test url {raw}: {e}"))
}

/// Admin configuration for tests.
#[must_use]
pub fn admin_config(policy: TransitionPolicy) -> AdminConfig {
    AdminConfig {
        database_url: SecretString::from("postgres://localhost/test"),
        supabase: supabase_config(),
        host: [127, 0, 0, 1].into(),
        port: 3001,
        storefront_base_url: url("https://audieboutique.com"),
        notification_locale: Locale::Fr,
        transition_policy: policy,
        backend_timeout: Duration::from_secs(10),
        log_format: AdminLogFormat::Text,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// Admin state with every port served by `backend`.
#[must_use]
pub fn admin_state(backend: &Arc<MemoryBackend>, policy: TransitionPolicy) -> AdminState {
    let backends = AdminBackends {
        authenticator: backend.clone(),
        orders: backend.clone(),
        users: backend.clone(),
        addresses: backend.clone(),
        notifier: backend.clone(),
        invoices: backend.clone(),
    };
    AdminState::new(admin_config(policy), backends)
}

/// Storefront configuration for tests: 5.90 delivery, free from 80,
/// promo codes `BIENVENUE` (10%) and `CADEAU500` (500 off).
#[must_use]
pub fn storefront_config() -> StorefrontConfig {
    let promo_codes = "BIENVENUE=10%,CADEAU500=500"
        .parse::<PromoCodes>()
        .unwrap_or_else(|e| panic!("invalid test promo codes: {e}"));
    StorefrontConfig {
        database_url: SecretString::from("postgres://localhost/test"),
        supabase: supabase_config(),
        host: [127, 0, 0, 1].into(),
        port: 3000,
        base_url: url("http://localhost:3000"),
        shipping: ShippingRules::new(eur("5.90"), eur("80")),
        promo_codes,
        backend_timeout: Duration::from_secs(10),
        log_format: StorefrontLogFormat::Text,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// Storefront state with every port served by `backend`.
#[must_use]
pub fn storefront_state(backend: &Arc<MemoryBackend>) -> StorefrontState {
    let backends = StorefrontBackends {
        authenticator: backend.clone(),
        orders: backend.clone(),
        users: backend.clone(),
        addresses: backend.clone(),
        products: backend.clone(),
    };
    StorefrontState::new(storefront_config(), backends)
}

// =============================================================================
// HTTP
// =============================================================================

/// A buffered response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// JSON body, or the raw text as a JSON string when it is not JSON.
    pub body: Value,
}

impl TestResponse {
    /// The `name=value` pair of the first `Set-Cookie` header.
    #[must_use]
    pub fn cookie(&self) -> Option<String> {
        self.headers
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::to_owned)
    }
}

/// Build a request, with a JSON body when `body` is given.
#[must_use]
pub fn request(
    method: &str,
    uri: &str,
    headers: &[(&str, &str)],
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    builder
        .body(body)
        .unwrap_or_else(|e| panic!("invalid test request: {e}"))
}

/// Run `request` through `app` and buffer the response.
pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .unwrap_or_else(|e| panic!("request failed: {e}"));
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap_or_else(|e| panic!("unreadable body: {e}"));
    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    TestResponse {
        status,
        headers,
        body,
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// Parse a euro amount, e.g. `eur("59.90")`.
#[must_use]
pub fn eur(amount: &str) -> Money {
    amount
        .parse()
        .unwrap_or_else(|e| panic!("invalid test amount {amount}: {e}"))
}

/// Midnight UTC plus `hour` on a calendar day.
#[must_use]
pub fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0)
        .single()
        .unwrap_or_else(|| panic!("invalid test date {year}-{month}-{day}"))
}

#[must_use]
pub fn user(role: UserRole, name: &str, email: &str) -> User {
    User {
        id: UserId::random(),
        full_name: Some(name.to_owned()),
        email: Some(Email::parse(email).unwrap_or_else(|e| panic!("invalid test email: {e}"))),
        role,
        created_at: at(2024, 1, 1, 0),
    }
}

#[must_use]
pub fn address(customer: UserId) -> Address {
    Address {
        id: AddressId::random(),
        customer_id: customer,
        full_name: "Claire Martin".to_owned(),
        street: "12 rue des Lilas".to_owned(),
        postal_code: "75011".to_owned(),
        city: "Paris".to_owned(),
        country: "France".to_owned(),
        is_active: true,
    }
}

#[must_use]
pub fn product(name: &str, price: &str) -> Product {
    Product {
        id: ProductId::random(),
        name: name.to_owned(),
        price: eur(price),
        is_active: true,
    }
}

/// A pickup order with a single line and no shipping or discount.
#[must_use]
pub fn order(
    customer: UserId,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    total: &str,
) -> Order {
    let amount = eur(total);
    let line = LineItem::new(ProductId::random(), "Robe", amount, 1)
        .unwrap_or_else(|e| panic!("invalid test line: {e}"));
    Order {
        id: OrderId::random(),
        customer_id: customer,
        created_at,
        status,
        is_shipping: false,
        address_id: None,
        items: vec![line],
        totals: OrderTotals::compute(amount, Money::ZERO, Money::ZERO)
            .unwrap_or_else(|e| panic!("invalid test totals: {e}")),
    }
}
