//! Shopify Admin API integration.
//!
//! # Architecture
//!
//! - [`AdminClient`] - per-shop GraphQL client built from the shop's offline token
//! - [`oauth`] - install flow (authorization URL, code exchange, query HMAC)
//! - [`webhook`] - `X-Shopify-Hmac-Sha256` verification
//! - [`session_token`] - App Bridge session token (JWT) verification
//!
//! Clients are created on demand by `AppState::shopify` and cached per shop.
//!
//! # Example
//!
//! ```rust,ignore
//! let client = state.shopify(&shop).await?;
//! let page = client.search_products(20, None, Some("title:shirt*".to_string())).await?;
//! let markets = client.get_markets().await?;
//! ```

mod admin;
pub mod oauth;
pub mod session_token;
pub mod types;
pub mod webhook;

pub use admin::{AdminClient, parse_bulk_orders};
pub use types::*;

use thiserror::Error;

use bundlewise_core::{Gid, GidError};

/// Errors that can occur when interacting with Shopify Admin API.
#[derive(Debug, Error)]
pub enum AdminShopifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// An `ID` returned by Shopify is not a global ID we understand.
    #[error("Invalid ID: {0}")]
    InvalidId(#[from] GidError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by Shopify.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Authentication/authorization failed.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User error from mutation (e.g., invalid input).
    #[error("User error: {0}")]
    UserError(String),

    /// OAuth handshake failed.
    #[error("OAuth error: {0}")]
    OAuth(String),

    /// Bulk operation finished without producing data.
    #[error("Bulk operation {id} ended as {status}{}", error_code.as_deref().map(|c| format!(" ({c})")).unwrap_or_default())]
    BulkOperationFailed {
        id: Gid,
        status: BulkOperationStatus,
        error_code: Option<String>,
    },

    /// Bulk operation did not finish in time.
    #[error("Bulk operation {0} timed out")]
    BulkOperationTimeout(Gid),

    /// A bulk result line could not be interpreted.
    #[error("Invalid bulk result line {line}: {message}")]
    Jsonl { line: usize, message: String },
}

/// A GraphQL error returned by the Shopify Admin API.
#[derive(Debug, Clone)]
pub struct GraphQLError {
    /// Error message.
    pub message: String,
    /// Source locations in the query.
    pub locations: Vec<GraphQLErrorLocation>,
    /// Path to the error in the response.
    pub path: Vec<serde_json::Value>,
}

/// Location in a GraphQL query where an error occurred.
#[derive(Debug, Clone)]
pub struct GraphQLErrorLocation {
    /// Line number (1-indexed).
    pub line: i64,
    /// Column number (1-indexed).
    pub column: i64,
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    errors
        .iter()
        .map(|e| e.message.clone())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Join mutation user errors into a single [`AdminShopifyError::UserError`].
pub(crate) fn user_errors(errors: &[UserError]) -> Option<AdminShopifyError> {
    if errors.is_empty() {
        return None;
    }
    Some(AdminShopifyError::UserError(
        errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; "),
    ))
}

#[cfg(test)]
mod tests {
    use bundlewise_core::ResourceKind;

    use super::*;

    #[test]
    fn test_admin_shopify_error_display() {
        let err = AdminShopifyError::NotFound("variant-123".to_string());
        assert_eq!(err.to_string(), "Not found: variant-123");
    }

    #[test]
    fn test_graphql_error_formatting() {
        let errors = vec![
            GraphQLError {
                message: "Field not found".to_string(),
                locations: vec![],
                path: vec![],
            },
            GraphQLError {
                message: "Invalid ID".to_string(),
                locations: vec![],
                path: vec![],
            },
        ];
        let err = AdminShopifyError::GraphQL(errors);
        assert_eq!(
            err.to_string(),
            "GraphQL errors: Field not found; Invalid ID"
        );
    }

    #[test]
    fn test_rate_limited_error() {
        let err = AdminShopifyError::RateLimited(60);
        assert_eq!(err.to_string(), "Rate limited, retry after 60 seconds");
    }

    #[test]
    fn test_bulk_failed_error() {
        let err = AdminShopifyError::BulkOperationFailed {
            id: Gid::new(ResourceKind::BulkOperation, 7),
            status: BulkOperationStatus::Failed,
            error_code: Some("ACCESS_DENIED".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Bulk operation gid://shopify/BulkOperation/7 ended as FAILED (ACCESS_DENIED)"
        );
    }

    #[test]
    fn test_user_errors_joined() {
        assert!(user_errors(&[]).is_none());
        let err = user_errors(&[
            UserError {
                field: Some(vec!["metafields".to_string(), "0".to_string()]),
                message: "Value is invalid".to_string(),
            },
            UserError {
                field: None,
                message: "Owner missing".to_string(),
            },
        ]);
        let Some(AdminShopifyError::UserError(message)) = err else {
            panic!("expected user error");
        };
        assert!(message.contains("Value is invalid"));
        assert!(message.contains("Owner missing"));
    }
}
