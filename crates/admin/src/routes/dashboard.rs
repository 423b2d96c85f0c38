//! Dashboard route handler.

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracing::instrument;

use audie_boutique_core::{DateRange, OrderStats, Permission};

use crate::{error::AppError, middleware::RequireStaff, state::AppState};

/// Window used when no dates are given.
pub const DEFAULT_DAYS: u32 = 30;
/// Recent orders shown when `recent` is not given.
pub const DEFAULT_RECENT: usize = 10;
const MAX_RECENT: usize = 100;

/// Dashboard query parameters. Dates are `YYYY-MM-DD`, both inclusive.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub recent: Option<usize>,
}

impl DashboardQuery {
    /// Resolve the requested range; missing bounds default to the trailing
    /// [`DEFAULT_DAYS`] ending `today`.
    fn range(&self, today: NaiveDate) -> Result<DateRange, AppError> {
        let range = match (self.start, self.end) {
            (Some(start), Some(end)) => DateRange::new(start, end)?,
            (Some(start), None) => DateRange::new(start, today)?,
            (None, Some(end)) => DateRange::trailing(end, DEFAULT_DAYS)?,
            (None, None) => DateRange::trailing(today, DEFAULT_DAYS)?,
        };
        Ok(range)
    }
}

/// Dashboard statistics.
#[instrument(skip(user, state), fields(user = %user.id))]
pub async fn show(
    RequireStaff(user): RequireStaff,
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<OrderStats>, AppError> {
    user.require(Permission::ViewDashboard)?;

    let range = query.range(Utc::now().date_naive())?;
    let recent = query.recent.unwrap_or(DEFAULT_RECENT).min(MAX_RECENT);

    Ok(Json(state.dashboard().stats(range, recent).await))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_default_range_is_trailing_window() {
        let range = DashboardQuery::default().range(date("2024-03-31")).unwrap();
        assert_eq!(range.start(), date("2024-03-02"));
        assert_eq!(range.end(), date("2024-03-31"));
    }

    #[test]
    fn test_open_ended_start() {
        let query = DashboardQuery {
            start: Some(date("2024-03-01")),
            ..DashboardQuery::default()
        };
        let range = query.range(date("2024-03-10")).unwrap();
        assert_eq!(range.start(), date("2024-03-01"));
        assert_eq!(range.end(), date("2024-03-10"));
    }

    #[test]
    fn test_inverted_range_is_bad_request() {
        let query = DashboardQuery {
            start: Some(date("2024-03-05")),
            end: Some(date("2024-03-01")),
            recent: None,
        };
        let err = query.range(date("2024-03-10")).unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }
}
