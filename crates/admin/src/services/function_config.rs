//! Keeps the cart transform's configuration metafield in step with saved widgets.

use std::sync::Arc;
use std::time::Duration;

use bundlewise_core::cart_transform::FunctionConfig;
use bundlewise_core::{ShopDomain, WidgetId, WidgetSettings};
use moka::future::Cache;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::db::WidgetRepository;
use crate::error::AppError;
use crate::state::AppState;

/// Discount tiers per widget, as the checkout function reads them.
///
/// Widgets without tiers are left out; the function then falls back to the
/// `_bundle_discount` line attribute.
#[must_use]
pub fn build_config(settings: Vec<(WidgetId, WidgetSettings)>) -> FunctionConfig {
    FunctionConfig {
        widgets: settings
            .into_iter()
            .filter(|(_, s)| !s.discounts.is_empty())
            .map(|(id, s)| (id.to_string(), s.discounts))
            .collect(),
    }
}

/// One lock per shop, held across a configuration read and write.
///
/// Two widget saves in quick succession spawn two syncs. Holding the lock
/// from the settings read until the metafield write means the later sync
/// always reads after the earlier one has written, so the newest settings win.
#[derive(Clone)]
pub struct ShopLocks {
    locks: Cache<ShopDomain, Arc<Mutex<()>>>,
}

impl ShopLocks {
    #[must_use]
    pub fn new() -> Self {
        Self {
            locks: Cache::builder()
                .max_capacity(10_000)
                .time_to_idle(Duration::from_secs(600)) // 10 minutes
                .build(),
        }
    }

    /// Wait for the shop's lock.
    pub async fn lock(&self, shop: &ShopDomain) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .get_with(shop.clone(), async { Arc::new(Mutex::new(())) })
            .await;
        lock.lock_owned().await
    }
}

impl Default for ShopLocks {
    fn default() -> Self {
        Self::new()
    }
}

/// Push the shop's current widget tiers to its cart transforms.
///
/// Syncs for the same shop run one at a time.
///
/// # Errors
///
/// Returns an error if the widgets cannot be read or Shopify rejects the write.
pub async fn sync(state: &AppState, shop: &ShopDomain) -> Result<usize, AppError> {
    let _guard = state.config_syncs().lock(shop).await;
    let settings = WidgetRepository::new(state.pool())
        .settings_for_shop(shop)
        .await?;
    let config = build_config(settings);
    let client = state.shopify(shop).await?;
    Ok(client.sync_cart_transform_config(&config).await?)
}

/// Run [`sync`] in the background, logging failures.
///
/// Saving a widget must not fail because Shopify is slow or the function is
/// not activated yet.
pub fn spawn_sync(state: AppState, shop: ShopDomain) {
    tokio::spawn(async move {
        if let Err(e) = sync(&state, &shop).await {
            tracing::warn!(shop = %shop, error = %e, "Failed to sync cart transform configuration");
        }
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use serde_json::json;

    use super::*;

    #[test]
    fn test_build_config_skips_widgets_without_tiers() {
        let with_tiers =
            WidgetSettings::from_value(json!({ "discounts": [{ "2": 5 }, { "3": 10 }] })).unwrap();
        let without = WidgetSettings::default();

        let config = build_config(vec![
            (WidgetId::new(4), with_tiers),
            (WidgetId::new(5), without),
        ]);

        assert_eq!(config.widgets.len(), 1);
        assert_eq!(
            serde_json::to_value(&config).unwrap(),
            json!({ "widgets": { "4": [{ "2": 5 }, { "3": 10 }] } })
        );
    }

    #[tokio::test]
    async fn test_same_shop_syncs_run_in_order() {
        let locks = ShopLocks::new();
        let shop = ShopDomain::parse("first.myshopify.com").unwrap();
        let log = Arc::new(StdMutex::new(Vec::new()));

        let guard = locks.lock(&shop).await;
        let waiting = {
            let (locks, shop, log) = (locks.clone(), shop.clone(), Arc::clone(&log));
            tokio::spawn(async move {
                let _guard = locks.lock(&shop).await;
                log.lock().unwrap().push("second");
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        log.lock().unwrap().push("first");
        drop(guard);
        waiting.await.unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_other_shop_is_not_blocked() {
        let locks = ShopLocks::new();
        let first = ShopDomain::parse("first.myshopify.com").unwrap();
        let second = ShopDomain::parse("second.myshopify.com").unwrap();

        let _held = locks.lock(&first).await;
        let other = tokio::time::timeout(Duration::from_secs(1), locks.lock(&second)).await;
        assert!(other.is_ok());

        let same = tokio::time::timeout(Duration::from_millis(50), locks.lock(&first)).await;
        assert!(same.is_err());
    }
}
