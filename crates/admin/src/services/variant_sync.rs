//! Variant snapshot cache maintenance.
//!
//! Snapshots are filled read-through when the storefront asks for variants
//! we have not seen, and kept fresh by the `products/update` and
//! `inventory_levels/update` webhooks.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use bundlewise_core::{Gid, ResourceKind, ShopDomain};

use crate::db::{PriceUpdateResult, RepositoryError, VariantDetailsRepository};
use crate::error::AppError;
use crate::models::{
    InventoryLevel, MarketPrice, VariantPriceUpdate, VariantSnapshot, VariantSnapshotInput,
};
use crate::shopify::{ContextualPrice, Market, ShopifyVariant};
use crate::state::AppState;

/// What a webhook did to the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Nothing in the payload concerns a cached variant.
    NotApplicable,
    /// Number of snapshots updated or evicted.
    Updated(u64),
}

// =============================================================================
// Read-through
// =============================================================================

/// Cached snapshots for `variant_ids`, fetching and storing any that are missing.
///
/// Variants Shopify does not know are left out of the result.
///
/// # Errors
///
/// Returns an error if the database or the Shopify API fails.
#[instrument(skip(state, variant_ids), fields(shop = %shop, count = variant_ids.len()))]
pub async fn load_snapshots(
    state: &AppState,
    shop: &ShopDomain,
    variant_ids: &[Gid],
) -> Result<Vec<VariantSnapshot>, AppError> {
    let repo = VariantDetailsRepository::new(state.pool());
    let cached = repo.get_many(shop, variant_ids).await?;

    let known: HashSet<Gid> = cached.iter().map(|s| s.variant_id).collect();
    let mut missing: Vec<Gid> = variant_ids
        .iter()
        .filter(|id| !known.contains(id))
        .copied()
        .collect();
    missing.sort_unstable_by_key(Gid::numeric_id);
    missing.dedup();

    if missing.is_empty() {
        return Ok(in_request_order(cached, variant_ids));
    }

    let client = state.shopify(shop).await?;
    let variants = client.get_variants(&missing).await?;
    if variants.is_empty() {
        return Ok(in_request_order(cached, variant_ids));
    }

    let fetched: Vec<Gid> = variants.iter().map(|v| v.id).collect();
    let mut market_prices = Vec::new();
    for market in state.markets(shop).await?.iter().filter(|m| prices_apart(m)) {
        let Some(country) = market.country_code.as_deref() else {
            continue;
        };
        let prices = client.get_contextual_prices(&fetched, country).await?;
        market_prices.push((market.id, prices));
    }

    for variant in &variants {
        repo.upsert(shop, &snapshot_input(variant, &market_prices))
            .await?;
    }
    tracing::info!(fetched = variants.len(), "Cached variant snapshots");

    let snapshots = repo.get_many(shop, variant_ids).await?;
    Ok(in_request_order(snapshots, variant_ids))
}

/// Non-primary enabled markets carry their own price list.
fn prices_apart(market: &Market) -> bool {
    market.enabled && !market.primary && market.country_code.is_some()
}

fn in_request_order(mut snapshots: Vec<VariantSnapshot>, order: &[Gid]) -> Vec<VariantSnapshot> {
    snapshots.sort_by_key(|s| order.iter().position(|id| *id == s.variant_id));
    snapshots
}

/// Build the row written for a variant fetched from Shopify.
#[must_use]
pub fn snapshot_input(
    variant: &ShopifyVariant,
    market_prices: &[(Gid, Vec<ContextualPrice>)],
) -> VariantSnapshotInput {
    VariantSnapshotInput {
        variant_id: variant.id,
        product_id: variant.product_id,
        title: variant.title.clone(),
        sku: variant.sku.clone(),
        price: variant.price,
        compare_at_price: variant.compare_at_price,
        currency_code: variant.currency_code.clone(),
        inventory_item_id: variant.inventory_item_id,
        inventory_tracked: variant.tracked,
        available_for_sale: variant.available_for_sale,
        inventory: variant
            .levels
            .iter()
            .map(|level| InventoryLevel {
                location_id: level.location_id,
                available: level.available,
            })
            .collect(),
        market_prices: market_prices
            .iter()
            .filter_map(|(market_id, prices)| {
                let price = prices.iter().find(|p| p.variant_id == variant.id)?;
                Some(MarketPrice {
                    market_id: *market_id,
                    price: price.price.amount,
                    compare_at_price: price.compare_at_price.as_ref().map(|m| m.amount),
                    currency_code: price.price.currency_code.clone(),
                })
            })
            .collect(),
    }
}

// =============================================================================
// Webhooks
// =============================================================================

/// REST payload of a `products/update` webhook (fields we read).
#[derive(Debug, Clone, Deserialize)]
pub struct ProductUpdatePayload {
    pub id: u64,
    #[serde(default)]
    pub variants: Vec<ProductUpdateVariant>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductUpdateVariant {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub sku: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub compare_at_price: Option<Decimal>,
    /// `"shopify"` when Shopify tracks the variant's inventory.
    #[serde(default)]
    pub inventory_management: Option<String>,
}

impl ProductUpdateVariant {
    fn is_tracked(&self) -> bool {
        self.inventory_management
            .as_deref()
            .is_some_and(|m| m.eq_ignore_ascii_case("shopify"))
    }
}

/// REST payload of an `inventory_levels/update` webhook.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct InventoryLevelPayload {
    pub inventory_item_id: u64,
    pub location_id: u64,
    #[serde(default)]
    pub available: Option<i32>,
}

/// Cache updates carried by a `products/update` payload, one per variant.
#[must_use]
pub fn price_updates(payload: &ProductUpdatePayload) -> Vec<VariantPriceUpdate> {
    payload
        .variants
        .iter()
        .map(|v| VariantPriceUpdate {
            variant_id: Gid::new(ResourceKind::ProductVariant, v.id),
            title: v.title.clone(),
            sku: v.sku.clone().filter(|s| !s.is_empty()),
            price: v.price,
            compare_at_price: v.compare_at_price.filter(|p| !p.is_zero()),
            inventory_tracked: v.is_tracked(),
        })
        .collect()
}

/// Apply a `products/update` payload to the variants cached for a shop.
///
/// Variants that are not cached are skipped.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if an update fails.
#[instrument(skip(repo, payload), fields(shop = %shop, product_id = payload.id))]
pub async fn apply_product_update(
    repo: &VariantDetailsRepository<'_>,
    shop: &ShopDomain,
    payload: &ProductUpdatePayload,
) -> Result<SyncOutcome, RepositoryError> {
    let updates = price_updates(payload);
    if updates.is_empty() {
        return Ok(SyncOutcome::NotApplicable);
    }

    let mut updated = 0;
    for update in &updates {
        match repo.apply_price_update(shop, update).await? {
            PriceUpdateResult::NotCached => {}
            PriceUpdateResult::Updated => updated += 1,
            PriceUpdateResult::Evicted => {
                tracing::debug!(variant_id = %update.variant_id, "Evicted repriced variant");
                updated += 1;
            }
        }
    }

    if updated == 0 {
        return Ok(SyncOutcome::NotApplicable);
    }
    Ok(SyncOutcome::Updated(updated))
}

/// Apply an `inventory_levels/update` payload.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the lookup or upsert fails.
#[instrument(skip(repo), fields(shop = %shop))]
pub async fn apply_inventory_update(
    repo: &VariantDetailsRepository<'_>,
    shop: &ShopDomain,
    payload: InventoryLevelPayload,
) -> Result<SyncOutcome, RepositoryError> {
    let Some(available) = payload.available else {
        return Ok(SyncOutcome::NotApplicable);
    };
    let item = Gid::new(ResourceKind::InventoryItem, payload.inventory_item_id);
    let Some(id) = repo.find_by_inventory_item(shop, &item).await? else {
        return Ok(SyncOutcome::NotApplicable);
    };

    let location = Gid::new(ResourceKind::Location, payload.location_id);
    repo.upsert_inventory_level(id, &location, available).await?;
    Ok(SyncOutcome::Updated(1))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use super::*;
    use crate::shopify::{LocationAvailability, Money};

    fn variant() -> ShopifyVariant {
        ShopifyVariant {
            id: Gid::new(ResourceKind::ProductVariant, 11),
            product_id: Gid::new(ResourceKind::Product, 1),
            title: "Large".to_string(),
            sku: Some("TEE-L".to_string()),
            price: Decimal::new(2500, 2),
            compare_at_price: None,
            currency_code: "USD".to_string(),
            available_for_sale: true,
            inventory_item_id: Some(Gid::new(ResourceKind::InventoryItem, 91)),
            tracked: true,
            levels: vec![LocationAvailability {
                location_id: Gid::new(ResourceKind::Location, 5),
                available: 8,
            }],
        }
    }

    #[test]
    fn test_snapshot_input_picks_market_price() {
        let canada = Gid::new(ResourceKind::Market, 2);
        let prices = vec![(
            canada,
            vec![
                ContextualPrice {
                    variant_id: Gid::new(ResourceKind::ProductVariant, 99),
                    price: Money {
                        amount: Decimal::new(1, 0),
                        currency_code: "CAD".to_string(),
                    },
                    compare_at_price: None,
                },
                ContextualPrice {
                    variant_id: Gid::new(ResourceKind::ProductVariant, 11),
                    price: Money {
                        amount: Decimal::new(3400, 2),
                        currency_code: "CAD".to_string(),
                    },
                    compare_at_price: Some(Money {
                        amount: Decimal::new(4000, 2),
                        currency_code: "CAD".to_string(),
                    }),
                },
            ],
        )];

        let input = snapshot_input(&variant(), &prices);
        assert_eq!(input.inventory.len(), 1);
        let [price] = input.market_prices.as_slice() else {
            panic!("expected one market price");
        };
        assert_eq!(price.market_id, canada);
        assert_eq!(price.price, Decimal::new(3400, 2));
        assert_eq!(price.compare_at_price, Some(Decimal::new(4000, 2)));
        assert_eq!(price.currency_code, "CAD");
    }

    #[test]
    fn test_in_request_order() {
        let snapshot = |id| VariantSnapshot {
            variant_id: Gid::new(ResourceKind::ProductVariant, id),
            product_id: Gid::new(ResourceKind::Product, 1),
            title: String::new(),
            sku: None,
            price: Decimal::ZERO,
            compare_at_price: None,
            currency_code: "USD".to_string(),
            inventory_item_id: None,
            inventory_tracked: false,
            available_for_sale: true,
            inventory: vec![],
            market_prices: vec![],
            updated_at: Utc::now(),
        };
        let order = [
            Gid::new(ResourceKind::ProductVariant, 3),
            Gid::new(ResourceKind::ProductVariant, 1),
        ];
        let sorted = in_request_order(vec![snapshot(1), snapshot(3)], &order);
        let ids: Vec<u64> = sorted.iter().map(|s| s.variant_id.numeric_id()).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[test]
    fn test_price_updates_cover_every_variant() {
        let payload: ProductUpdatePayload = serde_json::from_value(json!({
            "id": 1,
            "title": "Tee",
            "variants": [
                { "id": 11, "title": "Large", "sku": "", "price": "25.00",
                  "compare_at_price": "30.00", "inventory_management": "shopify" },
                { "id": 12, "title": "Small", "price": "20.00",
                  "compare_at_price": null, "inventory_management": null }
            ]
        }))
        .unwrap();

        let updates = price_updates(&payload);
        let [tracked, untracked] = updates.as_slice() else {
            panic!("expected both variants");
        };
        assert_eq!(tracked.variant_id.to_string(), "gid://shopify/ProductVariant/11");
        assert_eq!(tracked.sku, None);
        assert_eq!(tracked.price, Decimal::new(2500, 2));
        assert_eq!(tracked.compare_at_price, Some(Decimal::new(3000, 2)));
        assert!(tracked.inventory_tracked);
        assert_eq!(untracked.variant_id.to_string(), "gid://shopify/ProductVariant/12");
        assert!(!untracked.inventory_tracked);
    }

    #[test]
    fn test_untracked_variant_is_updated() {
        let payload: ProductUpdatePayload = serde_json::from_value(json!({
            "id": 1,
            "variants": [{ "id": 12, "price": "15.00", "inventory_management": null }]
        }))
        .unwrap();

        let updates = price_updates(&payload);
        let [update] = updates.as_slice() else {
            panic!("expected one update");
        };
        assert_eq!(update.price, Decimal::new(1500, 2));
        assert!(!update.inventory_tracked);
    }

    #[test]
    fn test_product_without_variants_has_no_updates() {
        let payload: ProductUpdatePayload =
            serde_json::from_value(json!({ "id": 1, "variants": [] })).unwrap();
        assert!(price_updates(&payload).is_empty());
    }

    #[test]
    fn test_inventory_payload() {
        let payload: InventoryLevelPayload = serde_json::from_value(json!({
            "inventory_item_id": 91,
            "location_id": 5,
            "available": 3,
            "updated_at": "2024-05-01T10:00:00-04:00"
        }))
        .unwrap();
        assert_eq!(payload.available, Some(3));
        assert_eq!(payload.inventory_item_id, 91);
    }

    #[test]
    fn test_prices_apart() {
        let market = Market {
            id: Gid::new(ResourceKind::Market, 1),
            name: "Canada".to_string(),
            handle: "ca".to_string(),
            enabled: true,
            primary: false,
            currency_code: Some("CAD".to_string()),
            country_code: Some("CA".to_string()),
        };
        assert!(prices_apart(&market));
        assert!(!prices_apart(&Market {
            primary: true,
            ..market.clone()
        }));
        assert!(!prices_apart(&Market {
            country_code: None,
            ..market
        }));
    }
}
