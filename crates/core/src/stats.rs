//! Revenue and order statistics for the back-office dashboard.
//!
//! All functions here read a snapshot of orders and users and never mutate
//! it. Calendar days are UTC days.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::ValidationError;
use crate::order::Order;
use crate::types::{Money, OrderId, OrderStatus, UserId};
use crate::user::{UNKNOWN_CUSTOMER_LABEL, User};

/// An inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Longest range a single report may cover.
    pub const MAX_DAYS: i64 = 731;

    /// Build a range covering `start` through the whole of `end`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvertedRange`] if `end < start`, or
    /// [`ValidationError::RangeTooLong`] past [`Self::MAX_DAYS`].
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if end < start {
            return Err(ValidationError::InvertedRange);
        }
        if (end - start).num_days() + 1 > Self::MAX_DAYS {
            return Err(ValidationError::RangeTooLong {
                max_days: Self::MAX_DAYS,
            });
        }
        Ok(Self { start, end })
    }

    /// The `days` calendar days ending with `today`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::new`]; `days == 0` yields an inverted range.
    pub fn trailing(today: NaiveDate, days: u32) -> Result<Self, ValidationError> {
        if days == 0 {
            return Err(ValidationError::InvertedRange);
        }
        let start = today
            .checked_sub_days(Days::new(u64::from(days) - 1))
            .ok_or(ValidationError::InvertedRange)?;
        Self::new(start, today)
    }

    #[must_use]
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    /// Whether `at` falls in `[start 00:00, end + 1 day 00:00)`.
    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        let lower = self.start.and_time(NaiveTime::MIN).and_utc();
        if at < lower {
            return false;
        }
        self.end
            .checked_add_days(Days::new(1))
            .is_none_or(|next| at < next.and_time(NaiveTime::MIN).and_utc())
    }

    /// Every day in the range, in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(|day| *day <= self.end)
    }
}

/// Revenue for one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyRevenue {
    pub date: NaiveDate,
    pub revenue: Money,
    pub orders: u32,
}

/// An order joined with its customer, for the "recent orders" table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecentOrder {
    pub id: OrderId,
    pub reference: String,
    pub customer_id: UserId,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub status: OrderStatus,
    pub total: Money,
}

/// Dashboard statistics for a date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderStats {
    pub range: DateRange,
    /// Every order created in the range, any status.
    #[serde(skip_serializing)]
    pub filtered_orders: Vec<Order>,
    /// Sum of totals over revenue-counting orders (not pending, not cancelled).
    pub total_revenue: Money,
    /// Number of revenue-counting orders.
    pub total_orders: usize,
    /// Distinct customers over all orders in range, whatever their status.
    pub unique_customers: usize,
    pub average_order_value: Money,
    pub status_breakdown: BTreeMap<OrderStatus, usize>,
    pub daily_series: Vec<DailyRevenue>,
    pub recent_orders: Vec<RecentOrder>,
}

/// Compute dashboard statistics.
///
/// Orders whose customer has no user record are still listed, under
/// [`UNKNOWN_CUSTOMER_LABEL`].
#[must_use]
pub fn aggregate(
    orders: &[Order],
    range: &DateRange,
    users: &[User],
    recent_limit: usize,
) -> OrderStats {
    let filtered_orders: Vec<Order> = orders
        .iter()
        .filter(|order| range.contains(order.created_at))
        .cloned()
        .collect();

    let revenue_orders = || {
        filtered_orders
            .iter()
            .filter(|order| order.status.counts_as_revenue())
    };

    let total_revenue: Money = revenue_orders().map(|order| order.totals.total()).sum();
    let total_orders = revenue_orders().count();
    let unique_customers = filtered_orders
        .iter()
        .map(|order| order.customer_id)
        .collect::<HashSet<_>>()
        .len();

    let average_order_value = if total_orders == 0 {
        Money::ZERO
    } else {
        Money::new(total_revenue.amount() / Decimal::from(total_orders)).round_to_cents()
    };

    let mut status_breakdown = BTreeMap::new();
    for order in &filtered_orders {
        *status_breakdown.entry(order.status).or_insert(0) += 1;
    }

    let mut per_day: HashMap<NaiveDate, (Money, u32)> = HashMap::new();
    for order in revenue_orders() {
        let entry = per_day
            .entry(order.created_at.date_naive())
            .or_insert((Money::ZERO, 0));
        entry.0 = entry.0 + order.totals.total();
        entry.1 += 1;
    }
    let daily_series = range
        .days()
        .map(|date| {
            let (revenue, orders) = per_day.get(&date).copied().unwrap_or((Money::ZERO, 0));
            DailyRevenue {
                date,
                revenue,
                orders,
            }
        })
        .collect();

    let recent_orders = recent_orders(&filtered_orders, users, recent_limit);

    OrderStats {
        range: *range,
        filtered_orders,
        total_revenue,
        total_orders,
        unique_customers,
        average_order_value,
        status_breakdown,
        daily_series,
        recent_orders,
    }
}

/// Newest `limit` orders joined with their customers.
#[must_use]
pub fn recent_orders(orders: &[Order], users: &[User], limit: usize) -> Vec<RecentOrder> {
    let by_id: HashMap<UserId, &User> = users.iter().map(|user| (user.id, user)).collect();

    let mut newest: Vec<&Order> = orders.iter().collect();
    newest.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    newest
        .into_iter()
        .take(limit)
        .map(|order| {
            let user = by_id.get(&order.customer_id);
            RecentOrder {
                id: order.id,
                reference: order.reference(),
                customer_id: order.customer_id,
                customer_name: user.map_or_else(
                    || UNKNOWN_CUSTOMER_LABEL.to_owned(),
                    |user| user.display_name(),
                ),
                customer_email: user
                    .and_then(|user| user.email.as_ref())
                    .map(ToString::to_string),
                created_at: order.created_at,
                status: order.status,
                total: order.totals.total(),
            }
        })
        .collect()
}
