//! Shopify offline session repository.
//!
//! One row per installed shop, holding the offline access token obtained
//! during OAuth.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use tracing::instrument;

use bundlewise_core::ShopDomain;

use super::{RepositoryError, decode};

// =============================================================================
// Types
// =============================================================================

/// A shop's offline access token.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone)]
pub struct ShopifySession {
    /// Shop domain (e.g., your-store.myshopify.com).
    pub shop: ShopDomain,
    /// Offline access token (redacted in debug output).
    pub access_token: SecretString,
    /// Granted scopes.
    pub scopes: Vec<String>,
    /// When the token was obtained.
    pub obtained_at: DateTime<Utc>,
}

impl std::fmt::Debug for ShopifySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifySession")
            .field("shop", &self.shop)
            .field("access_token", &"[REDACTED]")
            .field("scopes", &self.scopes)
            .field("obtained_at", &self.obtained_at)
            .finish()
    }
}

/// Internal row type for `PostgreSQL` queries.
#[derive(Debug, sqlx::FromRow)]
struct ShopifySessionRow {
    shop: String,
    access_token: String,
    scope: String,
    obtained_at: DateTime<Utc>,
}

impl TryFrom<ShopifySessionRow> for ShopifySession {
    type Error = RepositoryError;

    fn try_from(row: ShopifySessionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            shop: decode("shop", &row.shop, ShopDomain::parse)?,
            access_token: SecretString::from(row.access_token),
            scopes: split_scopes(&row.scope),
            obtained_at: row.obtained_at,
        })
    }
}

fn split_scopes(scope: &str) -> Vec<String> {
    scope
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for Shopify session database operations.
pub struct ShopifySessionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ShopifySessionRepository<'a> {
    /// Create a new Shopify session repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the session of a shop.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(shop = %shop))]
    pub async fn get_by_shop(
        &self,
        shop: &ShopDomain,
    ) -> Result<Option<ShopifySession>, RepositoryError> {
        let row = sqlx::query_as::<_, ShopifySessionRow>(
            r"
            SELECT shop, access_token, scope, obtained_at
            FROM bundlewise.shopify_session
            WHERE shop = $1
            ",
        )
        .bind(shop.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(ShopifySession::try_from).transpose()
    }

    /// Save or replace the session of a shop.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, session), fields(shop = %session.shop))]
    pub async fn save(&self, session: &ShopifySession) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO bundlewise.shopify_session (shop, access_token, scope, obtained_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (shop) DO UPDATE SET
                access_token = EXCLUDED.access_token,
                scope = EXCLUDED.scope,
                obtained_at = EXCLUDED.obtained_at,
                updated_at = NOW()
            ",
        )
        .bind(session.shop.as_str())
        .bind(session.access_token.expose_secret())
        .bind(session.scopes.join(","))
        .bind(session.obtained_at)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Delete the session of a shop.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(shop = %shop))]
    pub async fn delete(&self, shop: &ShopDomain) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM bundlewise.shopify_session WHERE shop = $1")
            .bind(shop.as_str())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// All installed shops.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_shops(&self) -> Result<Vec<ShopDomain>, RepositoryError> {
        let shops: Vec<String> =
            sqlx::query_scalar("SELECT shop FROM bundlewise.shopify_session ORDER BY shop")
                .fetch_all(self.pool)
                .await?;

        shops
            .iter()
            .map(|raw| decode("shop", raw, ShopDomain::parse))
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_split_scopes() {
        assert_eq!(
            split_scopes("read_products, read_orders,,"),
            vec!["read_products".to_string(), "read_orders".to_string()]
        );
        assert!(split_scopes("").is_empty());
    }

    #[test]
    fn test_session_debug_redacts_token() {
        let session = ShopifySession {
            shop: ShopDomain::parse("demo.myshopify.com").unwrap(),
            access_token: SecretString::from("shpat_super_secret"),
            scopes: vec![],
            obtained_at: Utc::now(),
        };
        let debug = format!("{session:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("shpat_super_secret"));
    }
}
