//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. Route handlers that cannot render a dedicated
//! error state return `Result<T, AppError>`.
//!
//! The taxonomy follows the storefront's failure model: `AuthRequired`
//! short-circuits an action before any request is made; `Validation` never
//! leaves the form that raised it; showroom and checkout failures surface as
//! view-level error states wherever a view exists to render them.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::services::auth::AuthError;
use crate::services::checkout::CheckoutError;
use crate::showroom::ShowroomError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Showroom API operation failed.
    #[error("Showroom error: {0}")]
    Showroom(#[from] ShowroomError),

    /// Token provider failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Checkout orchestration failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// No session exists; the user must sign in before the action proceeds.
    #[error("Sign-in required")]
    AuthRequired,

    /// Client-side form input rejected before any request was sent.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(self, Self::Showroom(_) | Self::Auth(_) | Self::Internal(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Showroom(_) => StatusCode::BAD_GATEWAY,
            Self::Auth(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Checkout(CheckoutError::MissingParams) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Checkout(_) => StatusCode::BAD_GATEWAY,
            Self::AuthRequired => StatusCode::UNAUTHORIZED,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Showroom(_) | Self::Checkout(_) => "External service error".to_string(),
            Self::Auth(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::AuthRequired => "Please sign in to continue".to_string(),
            _ => self.to_string(),
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user
/// actions leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("navigation", "Viewed vehicle page", Some(&[("car_id", "42")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("car-42".to_string());
        assert_eq!(err.to_string(), "Not found: car-42");

        let err = AppError::Validation("Price must be a non-negative number.".to_string());
        assert_eq!(
            err.to_string(),
            "Validation failed: Price must be a non-negative number."
        );
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            let response = err.into_response();
            response.status()
        }

        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(get_status(AppError::AuthRequired), StatusCode::UNAUTHORIZED);
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Validation("test".to_string())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Checkout(CheckoutError::MissingParams)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Showroom(ShowroomError::Api {
                status: 500,
                detail: None
            })),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_upstream_detail_not_exposed() {
        let err = AppError::Showroom(ShowroomError::Api {
            status: 500,
            detail: Some("database password wrong".to_string()),
        });
        let response = err.into_response();
        // The body is the generic message; upstream detail stays server-side.
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
