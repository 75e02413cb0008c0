//! Variant snapshot repository.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

use bundlewise_core::{Gid, ShopDomain, VariantDetailsId};

use super::{RepositoryError, decode};
use crate::models::{
    InventoryLevel, MarketPrice, VariantPriceUpdate, VariantSnapshot, VariantSnapshotInput,
};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct VariantDetailsRow {
    id: VariantDetailsId,
    variant_id: String,
    product_id: String,
    title: String,
    sku: Option<String>,
    price: Decimal,
    compare_at_price: Option<Decimal>,
    currency_code: String,
    inventory_item_id: Option<String>,
    inventory_tracked: bool,
    available_for_sale: bool,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct InventoryLevelRow {
    variant_details_id: VariantDetailsId,
    location_id: String,
    available: i32,
}

#[derive(Debug, sqlx::FromRow)]
struct MarketPriceRow {
    variant_details_id: VariantDetailsId,
    market_id: String,
    price: Decimal,
    compare_at_price: Option<Decimal>,
    currency_code: String,
}

// =============================================================================
// Repository
// =============================================================================

/// What [`VariantDetailsRepository::apply_price_update`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceUpdateResult {
    /// The variant is not cached for the shop.
    NotCached,
    /// The cached row now matches the payload.
    Updated,
    /// The base price changed under cached market prices; the row was dropped.
    Evicted,
}

/// Repository for cached variant snapshots.
pub struct VariantDetailsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> VariantDetailsRepository<'a> {
    /// Create a new variant details repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Load cached snapshots for the given variants. Unknown variants are absent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    #[instrument(skip(self, variant_ids), fields(shop = %shop, count = variant_ids.len()))]
    pub async fn get_many(
        &self,
        shop: &ShopDomain,
        variant_ids: &[Gid],
    ) -> Result<Vec<VariantSnapshot>, RepositoryError> {
        if variant_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<String> = variant_ids.iter().map(ToString::to_string).collect();

        let rows = sqlx::query_as::<_, VariantDetailsRow>(
            r"
            SELECT id, variant_id, product_id, title, sku, price, compare_at_price,
                   currency_code, inventory_item_id, inventory_tracked,
                   available_for_sale, updated_at
            FROM bundlewise.variant_details
            WHERE shop = $1 AND variant_id = ANY($2)
            ORDER BY id
            ",
        )
        .bind(shop.as_str())
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let detail_ids: Vec<i32> = rows.iter().map(|r| r.id.as_i32()).collect();

        let levels = sqlx::query_as::<_, InventoryLevelRow>(
            r"
            SELECT variant_details_id, location_id, available
            FROM bundlewise.inventory_level
            WHERE variant_details_id = ANY($1)
            ORDER BY location_id
            ",
        )
        .bind(&detail_ids)
        .fetch_all(self.pool)
        .await?;

        let prices = sqlx::query_as::<_, MarketPriceRow>(
            r"
            SELECT variant_details_id, market_id, price, compare_at_price, currency_code
            FROM bundlewise.market_price
            WHERE variant_details_id = ANY($1)
            ORDER BY market_id
            ",
        )
        .bind(&detail_ids)
        .fetch_all(self.pool)
        .await?;

        let mut levels_by_id: HashMap<VariantDetailsId, Vec<InventoryLevel>> = HashMap::new();
        for level in levels {
            levels_by_id
                .entry(level.variant_details_id)
                .or_default()
                .push(InventoryLevel {
                    location_id: decode("location_id", &level.location_id, Gid::parse)?,
                    available: level.available,
                });
        }

        let mut prices_by_id: HashMap<VariantDetailsId, Vec<MarketPrice>> = HashMap::new();
        for price in prices {
            prices_by_id
                .entry(price.variant_details_id)
                .or_default()
                .push(MarketPrice {
                    market_id: decode("market_id", &price.market_id, Gid::parse)?,
                    price: price.price,
                    compare_at_price: price.compare_at_price,
                    currency_code: price.currency_code,
                });
        }

        rows.into_iter()
            .map(|row| {
                Ok(VariantSnapshot {
                    variant_id: decode("variant_id", &row.variant_id, Gid::parse)?,
                    product_id: decode("product_id", &row.product_id, Gid::parse)?,
                    title: row.title,
                    sku: row.sku,
                    price: row.price,
                    compare_at_price: row.compare_at_price,
                    currency_code: row.currency_code,
                    inventory_item_id: row
                        .inventory_item_id
                        .as_deref()
                        .map(|raw| decode("inventory_item_id", raw, Gid::parse))
                        .transpose()?,
                    inventory_tracked: row.inventory_tracked,
                    available_for_sale: row.available_for_sale,
                    inventory: levels_by_id.remove(&row.id).unwrap_or_default(),
                    market_prices: prices_by_id.remove(&row.id).unwrap_or_default(),
                    updated_at: row.updated_at,
                })
            })
            .collect()
    }

    /// Insert or refresh a snapshot, replacing its inventory levels and market prices.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    #[instrument(skip(self, snapshot), fields(shop = %shop, variant_id = %snapshot.variant_id))]
    pub async fn upsert(
        &self,
        shop: &ShopDomain,
        snapshot: &VariantSnapshotInput,
    ) -> Result<VariantDetailsId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let id: VariantDetailsId = sqlx::query_scalar(
            r"
            INSERT INTO bundlewise.variant_details (
                shop, variant_id, product_id, title, sku, price, compare_at_price,
                currency_code, inventory_item_id, inventory_tracked, available_for_sale
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (shop, variant_id) DO UPDATE SET
                product_id = EXCLUDED.product_id,
                title = EXCLUDED.title,
                sku = EXCLUDED.sku,
                price = EXCLUDED.price,
                compare_at_price = EXCLUDED.compare_at_price,
                currency_code = EXCLUDED.currency_code,
                inventory_item_id = EXCLUDED.inventory_item_id,
                inventory_tracked = EXCLUDED.inventory_tracked,
                available_for_sale = EXCLUDED.available_for_sale,
                updated_at = NOW()
            RETURNING id
            ",
        )
        .bind(shop.as_str())
        .bind(snapshot.variant_id.to_string())
        .bind(snapshot.product_id.to_string())
        .bind(&snapshot.title)
        .bind(snapshot.sku.as_deref())
        .bind(snapshot.price)
        .bind(snapshot.compare_at_price)
        .bind(&snapshot.currency_code)
        .bind(snapshot.inventory_item_id.map(|g| g.to_string()))
        .bind(snapshot.inventory_tracked)
        .bind(snapshot.available_for_sale)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM bundlewise.inventory_level WHERE variant_details_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        for level in &snapshot.inventory {
            sqlx::query(
                r"
                INSERT INTO bundlewise.inventory_level (variant_details_id, location_id, available)
                VALUES ($1, $2, $3)
                ",
            )
            .bind(id)
            .bind(level.location_id.to_string())
            .bind(level.available)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM bundlewise.market_price WHERE variant_details_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        for price in &snapshot.market_prices {
            sqlx::query(
                r"
                INSERT INTO bundlewise.market_price
                    (variant_details_id, market_id, price, compare_at_price, currency_code)
                VALUES ($1, $2, $3, $4, $5)
                ",
            )
            .bind(id)
            .bind(price.market_id.to_string())
            .bind(price.price)
            .bind(price.compare_at_price)
            .bind(&price.currency_code)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(id)
    }

    /// Apply a `products/update` change to a cached variant.
    ///
    /// Market prices are Shopify's conversions of the base price, so a change
    /// to `price` or `compare_at_price` makes them stale. Such a row is
    /// evicted instead of updated, and the next read-through refetches the
    /// variant with current market prices.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    #[instrument(skip(self, update), fields(shop = %shop, variant_id = %update.variant_id))]
    pub async fn apply_price_update(
        &self,
        shop: &ShopDomain,
        update: &VariantPriceUpdate,
    ) -> Result<PriceUpdateResult, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current: Option<(VariantDetailsId, Decimal, Option<Decimal>, bool)> = sqlx::query_as(
            r"
            SELECT vd.id, vd.price, vd.compare_at_price,
                   EXISTS (
                       SELECT 1 FROM bundlewise.market_price mp
                       WHERE mp.variant_details_id = vd.id
                   )
            FROM bundlewise.variant_details vd
            WHERE vd.shop = $1 AND vd.variant_id = $2
            FOR UPDATE
            ",
        )
        .bind(shop.as_str())
        .bind(update.variant_id.to_string())
        .fetch_optional(&mut *tx)
        .await?;

        let Some((id, price, compare_at_price, has_market_prices)) = current else {
            return Ok(PriceUpdateResult::NotCached);
        };

        let repriced = price != update.price || compare_at_price != update.compare_at_price;
        if repriced && has_market_prices {
            sqlx::query("DELETE FROM bundlewise.variant_details WHERE id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            return Ok(PriceUpdateResult::Evicted);
        }

        sqlx::query(
            r"
            UPDATE bundlewise.variant_details
            SET title = $2, sku = $3, price = $4, compare_at_price = $5,
                inventory_tracked = $6, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(&update.title)
        .bind(update.sku.as_deref())
        .bind(update.price)
        .bind(update.compare_at_price)
        .bind(update.inventory_tracked)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(PriceUpdateResult::Updated)
    }

    /// Find the snapshot tracking an inventory item.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_inventory_item(
        &self,
        shop: &ShopDomain,
        inventory_item_id: &Gid,
    ) -> Result<Option<VariantDetailsId>, RepositoryError> {
        let id = sqlx::query_scalar(
            r"
            SELECT id FROM bundlewise.variant_details
            WHERE shop = $1 AND inventory_item_id = $2
            LIMIT 1
            ",
        )
        .bind(shop.as_str())
        .bind(inventory_item_id.to_string())
        .fetch_optional(self.pool)
        .await?;

        Ok(id)
    }

    /// Insert or update the availability at one location.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(variant_details_id = %id, location_id = %location_id))]
    pub async fn upsert_inventory_level(
        &self,
        id: VariantDetailsId,
        location_id: &Gid,
        available: i32,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO bundlewise.inventory_level (variant_details_id, location_id, available)
            VALUES ($1, $2, $3)
            ON CONFLICT (variant_details_id, location_id) DO UPDATE SET
                available = EXCLUDED.available,
                updated_at = NOW()
            ",
        )
        .bind(id)
        .bind(location_id.to_string())
        .bind(available)
        .execute(self.pool)
        .await?;

        sqlx::query("UPDATE bundlewise.variant_details SET updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(())
    }

    /// Drop every cached snapshot of a shop.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(shop = %shop))]
    pub async fn delete_for_shop(&self, shop: &ShopDomain) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM bundlewise.variant_details WHERE shop = $1")
            .bind(shop.as_str())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
