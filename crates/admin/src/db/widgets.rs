//! Widget repository.
//!
//! A widget is written wholesale: its parent products and their children are
//! deleted and recreated inside the same transaction as the widget row, so a
//! reader never sees a half-saved widget. Child products are shared between
//! widgets and are removed once the last widget using them lets go.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use tracing::instrument;

use bundlewise_core::{
    ChildProductId, Gid, ShopDomain, WidgetId, WidgetProductId, WidgetSettings, WidgetType,
};

use super::{RepositoryError, decode};
use crate::models::{
    ChildProduct, NewWidget, NewWidgetProduct, Widget, WidgetProduct, WidgetSummary,
};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct WidgetRow {
    id: WidgetId,
    shop: String,
    name: String,
    widget_type: String,
    settings: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct WidgetSummaryRow {
    id: WidgetId,
    name: String,
    widget_type: String,
    product_count: i64,
    updated_at: DateTime<Utc>,
}

impl TryFrom<WidgetSummaryRow> for WidgetSummary {
    type Error = RepositoryError;

    fn try_from(row: WidgetSummaryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            widget_type: decode("widget_type", &row.widget_type, str::parse::<WidgetType>)?,
            product_count: row.product_count,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WidgetProductRow {
    id: WidgetProductId,
    product_id: String,
    position: i32,
}

#[derive(Debug, sqlx::FromRow)]
struct ChildProductRow {
    widget_product_id: WidgetProductId,
    id: ChildProductId,
    product_id: String,
    variant_id: Option<String>,
}

impl TryFrom<ChildProductRow> for ChildProduct {
    type Error = RepositoryError;

    fn try_from(row: ChildProductRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            product_id: decode("product_id", &row.product_id, Gid::parse)?,
            variant_id: row
                .variant_id
                .as_deref()
                .map(|raw| decode("variant_id", raw, Gid::parse))
                .transpose()?,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WidgetSettingsRow {
    id: WidgetId,
    settings: serde_json::Value,
}

const WIDGET_COLUMNS: &str =
    "w.id, w.shop, w.name, w.widget_type, w.settings, w.created_at, w.updated_at";

// =============================================================================
// Repository
// =============================================================================

/// Repository for widget database operations.
pub struct WidgetRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WidgetRepository<'a> {
    /// Create a new widget repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a shop's widgets, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(shop = %shop))]
    pub async fn list(&self, shop: &ShopDomain) -> Result<Vec<WidgetSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, WidgetSummaryRow>(
            r"
            SELECT w.id, w.name, w.widget_type, w.updated_at,
                   COUNT(wp.id) AS product_count
            FROM bundlewise.widget w
            LEFT JOIN bundlewise.widget_product wp ON wp.widget_id = w.id
            WHERE w.shop = $1
            GROUP BY w.id
            ORDER BY w.updated_at DESC, w.id DESC
            ",
        )
        .bind(shop.as_str())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get a shop's widget with its products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if stored data is invalid.
    #[instrument(skip(self), fields(shop = %shop, widget_id = %id))]
    pub async fn get(
        &self,
        shop: &ShopDomain,
        id: WidgetId,
    ) -> Result<Option<Widget>, RepositoryError> {
        let row = sqlx::query_as::<_, WidgetRow>(&format!(
            "SELECT {WIDGET_COLUMNS} FROM bundlewise.widget w WHERE w.id = $1 AND w.shop = $2"
        ))
        .bind(id)
        .bind(shop.as_str())
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(row) => self.hydrate(row).await.map(Some),
            None => Ok(None),
        }
    }

    /// Get a widget regardless of shop (CLI inspection).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(widget_id = %id))]
    pub async fn get_any(&self, id: WidgetId) -> Result<Option<Widget>, RepositoryError> {
        let row = sqlx::query_as::<_, WidgetRow>(&format!(
            "SELECT {WIDGET_COLUMNS} FROM bundlewise.widget w WHERE w.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(row) => self.hydrate(row).await.map(Some),
            None => Ok(None),
        }
    }

    /// Find a widget only if `product_id` is one of its parent products.
    ///
    /// When `shop` is given the widget must also belong to it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(widget_id = %id, product_id = %product_id))]
    pub async fn find_for_product(
        &self,
        id: WidgetId,
        product_id: &Gid,
        shop: Option<&ShopDomain>,
    ) -> Result<Option<Widget>, RepositoryError> {
        let row = sqlx::query_as::<_, WidgetRow>(&format!(
            r"
            SELECT {WIDGET_COLUMNS}
            FROM bundlewise.widget w
            WHERE w.id = $1
              AND ($3::text IS NULL OR w.shop = $3)
              AND EXISTS (
                  SELECT 1 FROM bundlewise.widget_product wp
                  WHERE wp.widget_id = w.id AND wp.product_id = $2
              )
            "
        ))
        .bind(id)
        .bind(product_id.to_string())
        .bind(shop.map(ShopDomain::as_str))
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(row) => self.hydrate(row).await.map(Some),
            None => Ok(None),
        }
    }

    /// Settings of every widget in a shop (for the cart transform configuration).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(shop = %shop))]
    pub async fn settings_for_shop(
        &self,
        shop: &ShopDomain,
    ) -> Result<Vec<(WidgetId, WidgetSettings)>, RepositoryError> {
        let rows = sqlx::query_as::<_, WidgetSettingsRow>(
            "SELECT id, settings FROM bundlewise.widget WHERE shop = $1 ORDER BY id",
        )
        .bind(shop.as_str())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|row| Ok((row.id, parse_settings(row.settings)?)))
            .collect()
    }

    /// Shop a widget belongs to.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn shop_of(&self, id: WidgetId) -> Result<Option<ShopDomain>, RepositoryError> {
        let shop: Option<String> =
            sqlx::query_scalar("SELECT shop FROM bundlewise.widget WHERE id = $1")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        shop.map(|raw| decode("shop", &raw, ShopDomain::parse))
            .transpose()
    }

    /// Create a widget with its products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::Conflict` if a parent product is duplicated.
    #[instrument(skip(self, widget), fields(shop = %shop, name = %widget.name))]
    pub async fn create(
        &self,
        shop: &ShopDomain,
        widget: &NewWidget,
    ) -> Result<Widget, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let id: WidgetId = sqlx::query_scalar(
            r"
            INSERT INTO bundlewise.widget (shop, name, widget_type, settings)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(shop.as_str())
        .bind(&widget.name)
        .bind(widget.widget_type.as_str())
        .bind(widget.settings.to_value())
        .fetch_one(&mut *tx)
        .await
        .map_err(RepositoryError::from_write)?;

        insert_products(&mut tx, id, &widget.products).await?;
        tx.commit().await?;

        tracing::info!(widget_id = %id, "Widget created");
        self.get(shop, id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Replace a widget and all of its products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the widget does not exist in the shop.
    /// Returns `RepositoryError::Conflict` if a parent product is duplicated.
    #[instrument(skip(self, widget), fields(shop = %shop, widget_id = %id))]
    pub async fn update(
        &self,
        shop: &ShopDomain,
        id: WidgetId,
        widget: &NewWidget,
    ) -> Result<Widget, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let updated: Option<WidgetId> = sqlx::query_scalar(
            r"
            UPDATE bundlewise.widget
            SET name = $3, widget_type = $4, settings = $5, updated_at = NOW()
            WHERE id = $1 AND shop = $2
            RETURNING id
            ",
        )
        .bind(id)
        .bind(shop.as_str())
        .bind(&widget.name)
        .bind(widget.widget_type.as_str())
        .bind(widget.settings.to_value())
        .fetch_optional(&mut *tx)
        .await?;

        if updated.is_none() {
            return Err(RepositoryError::NotFound);
        }

        let previous = child_ids(&mut tx, id).await?;
        sqlx::query("DELETE FROM bundlewise.widget_product WHERE widget_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        insert_products(&mut tx, id, &widget.products).await?;
        prune_children(&mut tx, &previous).await?;
        tx.commit().await?;

        tracing::info!("Widget updated");
        self.get(shop, id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Delete a widget. Products, joins, and events cascade; child products
    /// no other widget uses are removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(shop = %shop, widget_id = %id))]
    pub async fn delete(&self, shop: &ShopDomain, id: WidgetId) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let children = child_ids(&mut tx, id).await?;
        let result = sqlx::query("DELETE FROM bundlewise.widget WHERE id = $1 AND shop = $2")
            .bind(id)
            .bind(shop.as_str())
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        prune_children(&mut tx, &children).await?;
        tx.commit().await?;

        tracing::info!("Widget deleted");
        Ok(true)
    }

    async fn hydrate(&self, row: WidgetRow) -> Result<Widget, RepositoryError> {
        let products = sqlx::query_as::<_, WidgetProductRow>(
            r"
            SELECT id, product_id, position
            FROM bundlewise.widget_product
            WHERE widget_id = $1
            ORDER BY position, id
            ",
        )
        .bind(row.id)
        .fetch_all(self.pool)
        .await?;

        let child_rows = sqlx::query_as::<_, ChildProductRow>(
            r"
            SELECT wcp.widget_product_id, cp.id, cp.product_id, cp.variant_id
            FROM bundlewise.widget_child_product wcp
            JOIN bundlewise.child_product cp ON cp.id = wcp.child_product_id
            JOIN bundlewise.widget_product wp ON wp.id = wcp.widget_product_id
            WHERE wp.widget_id = $1
            ORDER BY wcp.widget_product_id, wcp.position
            ",
        )
        .bind(row.id)
        .fetch_all(self.pool)
        .await?;

        let mut children: HashMap<WidgetProductId, Vec<ChildProduct>> = HashMap::new();
        for child in child_rows {
            children
                .entry(child.widget_product_id)
                .or_default()
                .push(child.try_into()?);
        }

        let products = products
            .into_iter()
            .map(|p| {
                Ok(WidgetProduct {
                    id: p.id,
                    product_id: decode("product_id", &p.product_id, Gid::parse)?,
                    position: p.position,
                    children: children.remove(&p.id).unwrap_or_default(),
                })
            })
            .collect::<Result<Vec<_>, RepositoryError>>()?;

        Ok(Widget {
            id: row.id,
            shop: decode("shop", &row.shop, ShopDomain::parse)?,
            name: row.name,
            widget_type: decode("widget_type", &row.widget_type, str::parse::<WidgetType>)?,
            settings: parse_settings(row.settings)?,
            products,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn parse_settings(value: serde_json::Value) -> Result<WidgetSettings, RepositoryError> {
    WidgetSettings::from_value(value)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid widget settings: {e}")))
}

async fn insert_products(
    conn: &mut PgConnection,
    widget_id: WidgetId,
    products: &[NewWidgetProduct],
) -> Result<(), RepositoryError> {
    for (position, product) in products.iter().enumerate() {
        let widget_product_id: WidgetProductId = sqlx::query_scalar(
            r"
            INSERT INTO bundlewise.widget_product (widget_id, product_id, position)
            VALUES ($1, $2, $3)
            RETURNING id
            ",
        )
        .bind(widget_id)
        .bind(product.product_id.to_string())
        .bind(position_of(position))
        .fetch_one(&mut *conn)
        .await
        .map_err(RepositoryError::from_write)?;

        for (child_position, child) in product.children.iter().enumerate() {
            let child_id: ChildProductId = sqlx::query_scalar(
                r"
                INSERT INTO bundlewise.child_product (product_id, variant_id)
                VALUES ($1, $2)
                ON CONFLICT (product_id, (COALESCE(variant_id, '')))
                DO UPDATE SET product_id = EXCLUDED.product_id
                RETURNING id
                ",
            )
            .bind(child.product_id.to_string())
            .bind(child.variant_id.map(|v| v.to_string()))
            .fetch_one(&mut *conn)
            .await?;

            sqlx::query(
                r"
                INSERT INTO bundlewise.widget_child_product
                    (widget_product_id, child_product_id, position)
                VALUES ($1, $2, $3)
                ON CONFLICT DO NOTHING
                ",
            )
            .bind(widget_product_id)
            .bind(child_id)
            .bind(position_of(child_position))
            .execute(&mut *conn)
            .await?;
        }
    }
    Ok(())
}

async fn child_ids(
    conn: &mut PgConnection,
    widget_id: WidgetId,
) -> Result<Vec<i32>, RepositoryError> {
    let ids = sqlx::query_scalar(
        r"
        SELECT DISTINCT wcp.child_product_id
        FROM bundlewise.widget_child_product wcp
        JOIN bundlewise.widget_product wp ON wp.id = wcp.widget_product_id
        WHERE wp.widget_id = $1
        ",
    )
    .bind(widget_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(ids)
}

/// Delete the given child products that no widget references any more.
///
/// The rows are locked first so a concurrent save that upserts the same child
/// either commits its join before the check below or waits for this delete.
async fn prune_children(
    conn: &mut PgConnection,
    candidates: &[i32],
) -> Result<u64, RepositoryError> {
    if candidates.is_empty() {
        return Ok(0);
    }

    sqlx::query("SELECT id FROM bundlewise.child_product WHERE id = ANY($1) FOR UPDATE")
        .bind(candidates)
        .execute(&mut *conn)
        .await?;

    let result = sqlx::query(
        r"
        DELETE FROM bundlewise.child_product cp
        WHERE cp.id = ANY($1)
          AND NOT EXISTS (
              SELECT 1 FROM bundlewise.widget_child_product wcp
              WHERE wcp.child_product_id = cp.id
          )
        ",
    )
    .bind(candidates)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() > 0 {
        tracing::debug!(removed = result.rows_affected(), "Pruned unused child products");
    }
    Ok(result.rows_affected())
}

fn position_of(index: usize) -> i32 {
    i32::try_from(index).unwrap_or(i32::MAX)
}
