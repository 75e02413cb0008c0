//! Shopify Admin API GraphQL client.
//!
//! One client per installed shop, authenticated with the shop's offline
//! access token. Operations are split across submodules by resource.

use std::sync::Arc;

use graphql_client::GraphQLQuery;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, de::DeserializeOwned};

use bundlewise_core::ShopDomain;

use super::{AdminShopifyError, GraphQLError, GraphQLErrorLocation};

mod bulk;
mod cart_transform;
mod conversions;
mod inventory;
mod markets;
mod products;
pub mod queries;
mod webhooks;

pub use bulk::parse_bulk_orders;

/// Shopify Admin API GraphQL client.
///
/// Cheap to clone; clones share the HTTP connection pool.
#[derive(Clone)]
pub struct AdminClient {
    inner: Arc<AdminClientInner>,
}

struct AdminClientInner {
    client: reqwest::Client,
    shop: ShopDomain,
    endpoint: String,
    access_token: SecretString,
}

impl std::fmt::Debug for AdminClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminClient")
            .field("shop", &self.inner.shop)
            .field("endpoint", &self.inner.endpoint)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

/// GraphQL response wrapper.
#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLErrorResponse>>,
}

#[derive(Debug, Deserialize)]
struct GraphQLErrorResponse {
    message: String,
    #[serde(default)]
    locations: Vec<GraphQLErrorLocationResponse>,
    #[serde(default)]
    path: Vec<serde_json::Value>,
    #[serde(default)]
    extensions: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct GraphQLErrorLocationResponse {
    line: i64,
    column: i64,
}

impl AdminClient {
    /// Create a client for one shop.
    ///
    /// # Arguments
    ///
    /// * `client` - Shared HTTP client
    /// * `shop` - Shop the token belongs to
    /// * `api_version` - Admin API version, e.g. `2025-01`
    /// * `access_token` - Offline access token from the install flow
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        shop: ShopDomain,
        api_version: &str,
        access_token: SecretString,
    ) -> Self {
        let endpoint = format!("https://{shop}/admin/api/{api_version}/graphql.json");
        Self {
            inner: Arc::new(AdminClientInner {
                client,
                shop,
                endpoint,
                access_token,
            }),
        }
    }

    /// The shop this client talks to.
    #[must_use]
    pub fn shop(&self) -> &ShopDomain {
        &self.inner.shop
    }

    /// The underlying HTTP client.
    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.inner.client
    }

    // =========================================================================
    // GraphQL Execution
    // =========================================================================

    /// Execute a GraphQL operation.
    async fn execute<Q: GraphQLQuery>(
        &self,
        variables: Q::Variables,
    ) -> Result<Q::ResponseData, AdminShopifyError>
    where
        Q::ResponseData: DeserializeOwned,
    {
        let body = Q::build_query(variables);

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .header("X-Shopify-Access-Token", self.inner.access_token.expose_secret())
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        // Check for rate limiting
        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.split('.').next())
                .and_then(|s| s.trim().parse::<u64>().ok())
                .unwrap_or(2)
                .max(1);
            return Err(AdminShopifyError::RateLimited(retry_after));
        }

        // Check for unauthorized
        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(AdminShopifyError::Unauthorized(
                "Invalid or expired access token".to_string(),
            ));
        }

        let response = response.error_for_status()?;
        let bytes = response.bytes().await?;
        let graphql_response: GraphQLResponse<Q::ResponseData> = serde_json::from_slice(&bytes)?;

        into_data(graphql_response)
    }
}

/// Turn a GraphQL envelope into its data, surfacing `errors`.
///
/// Shopify reports cost throttling as a `THROTTLED` error on a 200 response.
fn into_data<T>(response: GraphQLResponse<T>) -> Result<T, AdminShopifyError> {
    if let Some(errors) = response.errors
        && !errors.is_empty()
    {
        if errors.iter().any(is_throttled) {
            return Err(AdminShopifyError::RateLimited(1));
        }
        let converted_errors: Vec<GraphQLError> = errors
            .into_iter()
            .map(|e| GraphQLError {
                message: e.message,
                locations: e
                    .locations
                    .into_iter()
                    .map(|l| GraphQLErrorLocation {
                        line: l.line,
                        column: l.column,
                    })
                    .collect(),
                path: e.path,
            })
            .collect();
        return Err(AdminShopifyError::GraphQL(converted_errors));
    }

    response.data.ok_or_else(|| {
        AdminShopifyError::GraphQL(vec![GraphQLError {
            message: "No data in response".to_string(),
            locations: vec![],
            path: vec![],
        }])
    })
}

fn is_throttled(error: &GraphQLErrorResponse) -> bool {
    error
        .extensions
        .as_ref()
        .and_then(|e| e.get("code"))
        .and_then(serde_json::Value::as_str)
        == Some("THROTTLED")
}

/// Error for a mutation payload that came back empty.
fn missing_payload(operation: &str) -> AdminShopifyError {
    AdminShopifyError::GraphQL(vec![GraphQLError {
        message: format!("No payload returned from {operation}"),
        locations: vec![],
        path: vec![],
    }])
}
