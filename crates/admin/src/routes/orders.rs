//! Order management route handlers.

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use audie_boutique_core::cart::summarize;
use audie_boutique_core::ports::StoreError;
use audie_boutique_core::user::UNKNOWN_CUSTOMER_LABEL;
use audie_boutique_core::{
    Address, Money, Order, OrderId, OrderStatus, Permission, StatusChange, User, UserId,
};

use crate::{error::AppError, middleware::RequireStaff, state::AppState};

const DEFAULT_PER_PAGE: usize = 25;
const MAX_PER_PAGE: usize = 100;

/// Order listing query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct OrdersQuery {
    pub status: Option<String>,
    /// Matches the order reference or the customer's name or email.
    pub q: Option<String>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

/// One row of the order listing.
#[derive(Debug, Clone, Serialize)]
pub struct OrderListItem {
    pub id: OrderId,
    pub reference: String,
    pub customer_id: UserId,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub status: OrderStatus,
    pub is_shipping: bool,
    pub item_count: u32,
    pub total: Money,
}

impl OrderListItem {
    fn new(order: &Order, customer: Option<&User>) -> Self {
        Self {
            id: order.id,
            reference: order.reference(),
            customer_id: order.customer_id,
            customer_name: customer
                .map_or_else(|| UNKNOWN_CUSTOMER_LABEL.to_string(), User::display_name),
            customer_email: customer
                .and_then(|c| c.email.as_ref())
                .map(ToString::to_string),
            created_at: order.created_at,
            status: order.status,
            is_shipping: order.is_shipping,
            item_count: summarize(&order.items).item_count,
            total: order.totals.total(),
        }
    }

    fn matches(&self, needle: &str) -> bool {
        self.reference.to_lowercase().contains(needle)
            || self.customer_name.to_lowercase().contains(needle)
            || self
                .customer_email
                .as_deref()
                .is_some_and(|email| email.to_lowercase().contains(needle))
    }
}

/// A page of orders.
#[derive(Debug, Serialize)]
pub struct OrderPage {
    pub orders: Vec<OrderListItem>,
    pub page: usize,
    pub per_page: usize,
    /// Number of orders matching the filters, across all pages.
    pub total: usize,
}

/// Filter, search and paginate a snapshot of orders.
///
/// Pages are 1-based; `per_page` is clamped to `1..=100`.
fn list_orders(
    orders: &[Order],
    users: &[User],
    status: Option<OrderStatus>,
    query: &OrdersQuery,
) -> OrderPage {
    let by_id: HashMap<UserId, &User> = users.iter().map(|u| (u.id, u)).collect();
    let needle = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_lowercase);

    let matching: Vec<OrderListItem> = orders
        .iter()
        .filter(|order| status.is_none_or(|s| order.status == s))
        .map(|order| OrderListItem::new(order, by_id.get(&order.customer_id).copied()))
        .filter(|item| needle.as_deref().is_none_or(|n| item.matches(n)))
        .collect();

    let per_page = query
        .per_page
        .unwrap_or(DEFAULT_PER_PAGE)
        .clamp(1, MAX_PER_PAGE);
    let page = query.page.unwrap_or(1).max(1);
    let total = matching.len();

    let orders = matching
        .into_iter()
        .skip((page - 1).saturating_mul(per_page))
        .take(per_page)
        .collect();

    OrderPage {
        orders,
        page,
        per_page,
        total,
    }
}

fn parse_status(raw: &str) -> Result<OrderStatus, AppError> {
    raw.parse::<OrderStatus>()
        .map_err(|e| AppError::BadRequest(e.to_string()))
}

/// Order listing handler.
#[instrument(skip(user, state), fields(user = %user.id))]
pub async fn index(
    RequireStaff(user): RequireStaff,
    State(state): State<AppState>,
    Query(query): Query<OrdersQuery>,
) -> Result<Json<OrderPage>, AppError> {
    user.require(Permission::ViewOrders)?;

    let status = query
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(parse_status)
        .transpose()?;

    let backends = state.backends();
    let (orders, users) = tokio::join!(
        backends.orders.fetch_orders(),
        backends.users.fetch_users(None)
    );

    Ok(Json(list_orders(&orders?, &users?, status, &query)))
}

/// Full order view for the detail screen.
#[derive(Debug, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub reference: String,
    pub customer: Option<User>,
    pub customer_name: String,
    pub address: Option<Address>,
    /// Statuses staff may move this order to.
    pub next_statuses: Vec<OrderStatus>,
}

/// Order detail handler.
#[instrument(skip(user, state), fields(user = %user.id))]
pub async fn show(
    RequireStaff(user): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderDetail>, AppError> {
    user.require(Permission::ViewOrders)?;

    let backends = state.backends();
    let order = backends.orders.fetch_order(id).await?;

    let customer = match backends.users.fetch_user(order.customer_id).await {
        Ok(customer) => Some(customer),
        Err(StoreError::NotFound(_)) => None,
        Err(e) => return Err(e.into()),
    };
    let address = match order.address_id {
        Some(address_id) => match backends.addresses.fetch_address(address_id).await {
            Ok(address) => Some(address),
            Err(StoreError::NotFound(_)) => None,
            Err(e) => return Err(e.into()),
        },
        None => None,
    };

    let customer_name = customer
        .as_ref()
        .map_or_else(|| UNKNOWN_CUSTOMER_LABEL.to_string(), User::display_name);
    let next_statuses = state.order_status().policy().next_statuses(order.status);

    Ok(Json(OrderDetail {
        reference: order.reference(),
        order,
        customer,
        customer_name,
        address,
        next_statuses,
    }))
}

/// Status change request body, e.g. `{"status": "shipped"}`.
#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct StatusUpdateResponse {
    pub order: Order,
    pub change: StatusChange,
    pub next_statuses: Vec<OrderStatus>,
}

/// Change an order's status and notify the customer.
#[instrument(skip(user, state, body), fields(user = %user.id, status = %body.status))]
pub async fn update_status(
    RequireStaff(user): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Json(body): Json<StatusUpdateRequest>,
) -> Result<Json<StatusUpdateResponse>, AppError> {
    user.require(Permission::ManageOrders)?;
    let new_status = parse_status(&body.status)?;

    let service = state.order_status();
    let (order, change) = service.update(id, new_status).await?;
    info!(order = %order.id, ?change, "status change handled");

    Ok(Json(StatusUpdateResponse {
        next_statuses: service.policy().next_statuses(order.status),
        order,
        change,
    }))
}

/// Invoice document for an order, as HTML.
#[instrument(skip(user, state), fields(user = %user.id))]
pub async fn invoice(
    RequireStaff(user): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<impl IntoResponse, AppError> {
    user.require(Permission::SendInvoices)?;

    let order = state.backends().orders.fetch_order(id).await?;
    let document = state.invoices().render(&order).await?;

    Ok((
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        document,
    ))
}

/// Render and send the invoice to the order's customer.
#[instrument(skip(user, state), fields(user = %user.id))]
pub async fn send_invoice(
    RequireStaff(user): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<StatusCode, AppError> {
    user.require(Permission::SendInvoices)?;

    let order = state.backends().orders.fetch_order(id).await?;
    state.invoices().send(&order).await?;
    info!(order = %order.id, "invoice sent");

    Ok(StatusCode::ACCEPTED)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::TimeZone;

    use audie_boutique_core::{Email, LineItem, OrderTotals, ProductId, UserRole};

    use super::*;

    fn eur(s: &str) -> Money {
        s.parse().unwrap()
    }

    fn user(name: &str, email: &str) -> User {
        User {
            id: UserId::random(),
            full_name: Some(name.into()),
            email: Some(Email::parse(email).unwrap()),
            role: UserRole::Client,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn order(customer: UserId, status: OrderStatus, day: u32) -> Order {
        Order {
            id: OrderId::random(),
            customer_id: customer,
            created_at: Utc.with_ymd_and_hms(2024, 2, day, 10, 0, 0).unwrap(),
            status,
            is_shipping: false,
            address_id: None,
            items: vec![LineItem::new(ProductId::random(), "Sac", eur("40"), 2).unwrap()],
            totals: OrderTotals::compute(eur("80"), Money::ZERO, Money::ZERO).unwrap(),
        }
    }

    #[test]
    fn test_filter_by_status_and_search() {
        let claire = user("Claire Martin", "claire@example.org");
        let paul = user("Paul Durand", "paul@example.org");
        let orders = vec![
            order(claire.id, OrderStatus::Pending, 3),
            order(paul.id, OrderStatus::Pending, 2),
            order(claire.id, OrderStatus::Shipped, 1),
        ];
        let users = vec![claire, paul];

        let page = list_orders(
            &orders,
            &users,
            Some(OrderStatus::Pending),
            &OrdersQuery::default(),
        );
        assert_eq!(page.total, 2);

        let query = OrdersQuery {
            q: Some("  CLAIRE ".into()),
            ..OrdersQuery::default()
        };
        let page = list_orders(&orders, &users, None, &query);
        assert_eq!(page.total, 2);
        assert!(page.orders.iter().all(|o| o.customer_name == "Claire Martin"));
        assert_eq!(page.orders[0].item_count, 2);

        let reference = orders[1].reference();
        let query = OrdersQuery {
            q: Some(reference.clone()),
            ..OrdersQuery::default()
        };
        let page = list_orders(&orders, &users, None, &query);
        assert_eq!(page.total, 1);
        assert_eq!(page.orders[0].reference, reference);
    }

    #[test]
    fn test_item_count_saturates() {
        let customer = user("Claire Martin", "claire@example.org");
        let mut big = order(customer.id, OrderStatus::Pending, 1);
        let half = u32::MAX / 2 + 1;
        big.items = vec![
            LineItem::new(ProductId::random(), "Sac", eur("1"), half)
                .unwrap()
                .with_variant(Some("Noir".into()), None),
            LineItem::new(ProductId::random(), "Sac", eur("1"), half)
                .unwrap()
                .with_variant(Some("Rouge".into()), None),
        ];

        let page = list_orders(&[big], &[customer], None, &OrdersQuery::default());
        assert_eq!(page.orders[0].item_count, u32::MAX);
    }

    #[test]
    fn test_unknown_customer_label() {
        let orders = vec![order(UserId::random(), OrderStatus::Pending, 1)];
        let page = list_orders(&orders, &[], None, &OrdersQuery::default());
        assert_eq!(page.orders[0].customer_name, UNKNOWN_CUSTOMER_LABEL);
        assert_eq!(page.orders[0].customer_email, None);
    }

    #[test]
    fn test_pagination() {
        let customer = UserId::random();
        let orders: Vec<Order> = (1..=5)
            .map(|day| order(customer, OrderStatus::Pending, day))
            .collect();
        let query = OrdersQuery {
            page: Some(2),
            per_page: Some(2),
            ..OrdersQuery::default()
        };
        let page = list_orders(&orders, &[], None, &query);
        assert_eq!(page.total, 5);
        assert_eq!(page.orders.len(), 2);
        assert_eq!(page.orders[0].id, orders[2].id);

        let query = OrdersQuery {
            page: Some(0),
            per_page: Some(0),
            ..OrdersQuery::default()
        };
        let page = list_orders(&orders, &[], None, &query);
        assert_eq!((page.page, page.per_page), (1, 1));
        assert_eq!(page.orders.len(), 1);
    }

    #[test]
    fn test_parse_status_accepts_legacy_names() {
        assert_eq!(parse_status("processing").unwrap(), OrderStatus::Processing);
        assert_eq!(parse_status("paid").unwrap(), OrderStatus::Processing);
        let err = parse_status("lost").unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
