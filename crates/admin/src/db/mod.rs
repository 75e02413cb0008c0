//! Database operations for Bundlewise `PostgreSQL`.
//!
//! # Schema: `bundlewise`
//!
//! ## Tables
//!
//! - `widget` - Widget configuration (settings JSONB), scoped by shop
//! - `widget_product` - Parent products of a widget
//! - `child_product` - Products offered alongside parents (shared across widgets)
//! - `widget_child_product` - Join between parents and children
//! - `variant_details` - Cached Shopify variant snapshots
//! - `inventory_level` - Per-location availability of a cached variant
//! - `market_price` - Per-market pricing of a cached variant
//! - `widget_event` - Storefront impressions, clicks, add-to-carts
//! - `shopify_session` - Offline access token per installed shop
//!
//! # Migrations
//!
//! Migrations are stored in `crates/admin/migrations/` and run via:
//! ```bash
//! cargo run -p bundlewise-cli -- migrate
//! ```

pub mod analytics;
pub mod shopify;
pub mod variant_details;
pub mod widgets;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use analytics::AnalyticsRepository;
pub use shopify::{ShopifySession, ShopifySessionRepository};
pub use variant_details::{PriceUpdateResult, VariantDetailsRepository};
pub use widgets::WidgetRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate parent product).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Classify constraint violations so callers can answer 404/409 instead of 500.
    pub(crate) fn from_write(error: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &error {
            if db.is_unique_violation() {
                return Self::Conflict(db.message().to_string());
            }
            if db.is_foreign_key_violation() {
                return Self::NotFound;
            }
        }
        Self::Database(error)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Create a pool that connects on first use.
///
/// Lets the router start (and be tested) without a reachable database.
///
/// # Errors
///
/// Returns `sqlx::Error` if the URL cannot be parsed.
pub fn create_lazy_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect_lazy(database_url.expose_secret())
}

/// Parse a stored column with a domain parser, reporting corruption on failure.
pub(crate) fn decode<T, E: std::fmt::Display>(
    column: &str,
    raw: &str,
    parse: impl FnOnce(&str) -> Result<T, E>,
) -> Result<T, RepositoryError> {
    parse(raw).map_err(|e| RepositoryError::DataCorruption(format!("invalid {column} {raw:?}: {e}")))
}
