//! Unified error handling for admin.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use audie_boutique_core::ports::StoreError;
use audie_boutique_core::{TransitionError, ValidationError};

use crate::services::{InvoiceError, StatusUpdateError};

/// Application-level error type for the admin API.
#[derive(Debug, Error)]
pub enum AppError {
    /// A backend call failed.
    #[error("Backend error: {0}")]
    Store(#[from] StoreError),

    /// Input failed a business rule.
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// The requested status change is not permitted.
    #[error("{0}")]
    Transition(#[from] TransitionError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User lacks permission.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StatusUpdateError> for AppError {
    fn from(err: StatusUpdateError) -> Self {
        match err {
            StatusUpdateError::Transition(e) => Self::Transition(e),
            StatusUpdateError::Store(e) => Self::Store(e),
        }
    }
}

impl From<InvoiceError> for AppError {
    fn from(err: InvoiceError) -> Self {
        match err {
            InvoiceError::Render(e) => Self::Internal(format!("invoice template: {e}")),
            InvoiceError::Store(e) => Self::Store(e),
        }
    }
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Store(StoreError::NotFound(_)) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Store(StoreError::Conflict { .. }) => StatusCode::CONFLICT,
            Self::Store(StoreError::Backend(_) | StoreError::Timeout) => StatusCode::BAD_GATEWAY,
            Self::Store(StoreError::Malformed(_)) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Transition(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Log server errors with Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Store(StoreError::Malformed(_)) | Self::Internal(_) => {
                "Internal server error".to_string()
            }
            Self::Store(StoreError::Backend(_)) => "External service error".to_string(),
            _ => self.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Set the Sentry user context for the authenticated staff member.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
mod tests {
    use audie_boutique_core::OrderStatus;

    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("order-123".to_string());
        assert_eq!(err.to_string(), "Not found: order-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Store(StoreError::NotFound("order".into()))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Store(StoreError::Conflict {
                expected: OrderStatus::Pending,
                actual: OrderStatus::Cancelled,
            })),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Store(StoreError::Timeout)),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(AppError::Transition(TransitionError::NotAllowed {
                from: OrderStatus::Delivered,
                to: OrderStatus::Pending,
            })),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            get_status(AppError::Validation(ValidationError::InvertedRange)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
