//! Cached variant snapshots served to storefront widgets.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use bundlewise_core::Gid;

/// Price, inventory, and per-market pricing of one variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantSnapshot {
    pub variant_id: Gid,
    pub product_id: Gid,
    pub title: String,
    pub sku: Option<String>,
    pub price: Decimal,
    pub compare_at_price: Option<Decimal>,
    pub currency_code: String,
    #[serde(skip)]
    pub inventory_item_id: Option<Gid>,
    pub inventory_tracked: bool,
    pub available_for_sale: bool,
    pub inventory: Vec<InventoryLevel>,
    pub market_prices: Vec<MarketPrice>,
    pub updated_at: DateTime<Utc>,
}

impl VariantSnapshot {
    /// Price in a market, falling back to the shop price.
    #[must_use]
    pub fn price_in(&self, market_id: Option<&Gid>) -> (Decimal, Option<Decimal>, &str) {
        market_id
            .and_then(|id| self.market_prices.iter().find(|p| p.market_id == *id))
            .map_or(
                (self.price, self.compare_at_price, self.currency_code.as_str()),
                |p| (p.price, p.compare_at_price, p.currency_code.as_str()),
            )
    }

    /// Units available at a location, or across all locations.
    ///
    /// Returns `None` when inventory is not tracked.
    #[must_use]
    pub fn available(&self, location_id: Option<&Gid>) -> Option<i64> {
        if !self.inventory_tracked {
            return None;
        }
        Some(
            self.inventory
                .iter()
                .filter(|level| location_id.is_none_or(|id| level.location_id == *id))
                .map(|level| i64::from(level.available))
                .sum(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryLevel {
    pub location_id: Gid,
    pub available: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketPrice {
    pub market_id: Gid,
    pub price: Decimal,
    pub compare_at_price: Option<Decimal>,
    pub currency_code: String,
}

/// Fields written when a variant is fetched from Shopify.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantSnapshotInput {
    pub variant_id: Gid,
    pub product_id: Gid,
    pub title: String,
    pub sku: Option<String>,
    pub price: Decimal,
    pub compare_at_price: Option<Decimal>,
    pub currency_code: String,
    pub inventory_item_id: Option<Gid>,
    pub inventory_tracked: bool,
    pub available_for_sale: bool,
    pub inventory: Vec<InventoryLevel>,
    pub market_prices: Vec<MarketPrice>,
}

/// Fields a `products/update` webhook can change on a cached variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantPriceUpdate {
    pub variant_id: Gid,
    pub title: String,
    pub sku: Option<String>,
    pub price: Decimal,
    pub compare_at_price: Option<Decimal>,
    pub inventory_tracked: bool,
}
