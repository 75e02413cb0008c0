//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;

use bundlewise_core::ShopDomain;

use crate::config::AppConfig;
use crate::db::ShopifySessionRepository;
use crate::error::AppError;
use crate::services::ShopLocks;
use crate::shopify::{AdminClient, Market};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    pool: PgPool,
    http: reqwest::Client,
    /// Admin clients per shop, built from the stored offline token.
    clients: Cache<ShopDomain, AdminClient>,
    /// Markets per shop.
    markets: Cache<ShopDomain, Arc<Vec<Market>>>,
    /// OAuth `state` nonce -> shop that started the install.
    oauth_states: Cache<String, ShopDomain>,
    /// Serializes cart transform configuration writes per shop.
    config_syncs: ShopLocks,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Server configuration
    /// * `pool` - `PostgreSQL` connection pool
    #[must_use]
    pub fn new(config: AppConfig, pool: PgPool) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("bundlewise/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                http,
                clients: Cache::builder()
                    .max_capacity(10_000)
                    .time_to_live(Duration::from_secs(600)) // 10 minutes
                    .build(),
                markets: Cache::builder()
                    .max_capacity(10_000)
                    .time_to_live(Duration::from_secs(300)) // 5 minutes
                    .build(),
                oauth_states: Cache::builder()
                    .max_capacity(10_000)
                    .time_to_live(Duration::from_secs(600)) // 10 minutes
                    .build(),
                config_syncs: ShopLocks::new(),
            }),
        }
    }

    /// Per-shop locks held while the cart transform configuration is written.
    #[must_use]
    pub fn config_syncs(&self) -> &ShopLocks {
        &self.inner.config_syncs
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the shared HTTP client.
    #[must_use]
    pub fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }

    /// Admin API client for an installed shop.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Unauthorized` if the shop has not installed the app.
    /// Returns `AppError::Database` if the session cannot be loaded.
    pub async fn shopify(&self, shop: &ShopDomain) -> Result<AdminClient, AppError> {
        if let Some(client) = self.inner.clients.get(shop).await {
            return Ok(client);
        }

        let session = ShopifySessionRepository::new(self.pool())
            .get_by_shop(shop)
            .await?
            .ok_or_else(|| AppError::Unauthorized(format!("{shop} has not installed the app")))?;

        let client = AdminClient::new(
            self.http().clone(),
            session.shop,
            &self.config().shopify.api_version,
            session.access_token,
        );
        self.inner.clients.insert(shop.clone(), client.clone()).await;
        Ok(client)
    }

    /// Markets of a shop, cached for five minutes.
    ///
    /// # Errors
    ///
    /// Returns an error if the shop is not installed or Shopify fails.
    pub async fn markets(&self, shop: &ShopDomain) -> Result<Arc<Vec<Market>>, AppError> {
        if let Some(markets) = self.inner.markets.get(shop).await {
            return Ok(markets);
        }

        let markets = Arc::new(self.shopify(shop).await?.get_markets().await?);
        self.inner.markets.insert(shop.clone(), Arc::clone(&markets)).await;
        Ok(markets)
    }

    /// Remember the OAuth state issued to a shop.
    pub async fn remember_oauth_state(&self, state: String, shop: ShopDomain) {
        self.inner.oauth_states.insert(state, shop).await;
    }

    /// Consume an OAuth state, returning the shop it was issued to.
    pub async fn take_oauth_state(&self, state: &str) -> Option<ShopDomain> {
        self.inner.oauth_states.remove(state).await
    }

    /// Drop cached clients and markets of a shop (token changed or app removed).
    pub async fn forget_shop(&self, shop: &ShopDomain) {
        self.inner.clients.invalidate(shop).await;
        self.inner.markets.invalidate(shop).await;
    }
}
