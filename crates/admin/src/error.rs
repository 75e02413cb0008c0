//! Unified error handling for the app server.
//!
//! Every handler returns `Result<_, AppError>`; the response body is always
//! `{ "error": "<message>" }`.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::widgets::WidgetValidationError;
use crate::shopify::AdminShopifyError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Shopify API operation failed.
    #[error("Shopify error: {0}")]
    Shopify(#[from] AdminShopifyError),

    /// Widget payload failed validation.
    #[error("Invalid widget: {0}")]
    Validation(#[from] WidgetValidationError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated, but not allowed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Route exists but not for this method.
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Shopify(AdminShopifyError::RateLimited(_)) => StatusCode::TOO_MANY_REQUESTS,
            Self::Shopify(_) => StatusCode::BAD_GATEWAY,
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
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
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Database(RepositoryError::NotFound) => "Not found".to_string(),
            Self::Database(RepositoryError::Conflict(_)) => "Conflict".to_string(),
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Shopify(AdminShopifyError::RateLimited(_)) => {
                "Shopify rate limit reached, retry later".to_string()
            }
            Self::Shopify(_) => "External service error".to_string(),
            _ => self.to_string(),
        };

        let mut response = (status, Json(json!({ "error": message }))).into_response();

        if let Self::Shopify(AdminShopifyError::RateLimited(secs)) = &self
            && let Ok(value) = HeaderValue::from_str(&secs.to_string())
        {
            response.headers_mut().insert(RETRY_AFTER, value);
        }

        response
    }
}

/// Fallback for routes matched by path but not by method.
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

/// Tag the Sentry scope with the shop behind the request.
pub fn set_sentry_shop(shop: &str) {
    sentry::configure_scope(|scope| {
        scope.set_tag("shop", shop);
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use http_body_util::BodyExt;

    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("widget 12".to_string());
        assert_eq!(err.to_string(), "Not found: widget 12");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
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
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::MethodNotAllowed),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::NotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::Conflict("dup".to_string()))),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Shopify(AdminShopifyError::NotFound("x".to_string()))),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_rate_limited_sets_retry_after() {
        let response = AppError::Shopify(AdminShopifyError::RateLimited(4)).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(RETRY_AFTER).unwrap(), "4");
    }

    #[tokio::test]
    async fn test_json_body_hides_internal_details() {
        let response = AppError::Internal("connection refused to 10.0.0.3".to_string()).into_response();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"], "Internal server error");
    }

    #[tokio::test]
    async fn test_json_body_for_client_errors() {
        let response = AppError::BadRequest("variantIds is required".to_string()).into_response();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"], "Bad request: variantIds is required");
    }
}
