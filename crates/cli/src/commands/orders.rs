//! Order export commands.
//!
//! # Usage
//!
//! ```bash
//! bw-cli orders export --shop my-shop.myshopify.com --since 2025-06-01
//! ```
//!
//! # Environment Variables
//!
//! The full server configuration is loaded (`DATABASE_URL`, `SHOPIFY_API_*`,
//! `BULK_POLL_*`) since the export uses the shop's stored access token.

use chrono::NaiveDate;
use serde::Serialize;

use bundlewise_admin::models::WidgetOrderStats;
use bundlewise_admin::services::order_analytics::aggregate_orders;
use bundlewise_admin::{AppConfig, AppState};
use bundlewise_core::ShopDomain;

use super::{CommandError, print_json};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderExport {
    shop: ShopDomain,
    since: Option<NaiveDate>,
    orders: usize,
    widgets: Vec<WidgetOrderStats>,
}

/// Run a bulk order export for a shop and print per-widget statistics.
pub async fn export(shop: &str, since: Option<NaiveDate>) -> Result<(), CommandError> {
    let shop = ShopDomain::parse(shop)?;
    let config = AppConfig::from_env()?;
    let pool = bundlewise_admin::db::create_pool(&config.database_url).await?;
    let state = AppState::new(config, pool);

    let client = state.shopify(&shop).await?;
    tracing::info!(shop = %shop, ?since, "Starting bulk order export");
    let orders = client
        .export_orders(since, &state.config().bulk)
        .await
        .map_err(bundlewise_admin::AppError::from)?;

    let mut widgets: Vec<WidgetOrderStats> = aggregate_orders(&orders).into_values().collect();
    widgets.sort_by_key(|stats| stats.widget_id.as_i32());

    print_json(&OrderExport {
        shop,
        since,
        orders: orders.len(),
        widgets,
    })
}
