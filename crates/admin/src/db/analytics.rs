//! Widget event repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use bundlewise_core::{ShopDomain, WidgetEventId, WidgetId};

use super::RepositoryError;
use crate::models::{NewWidgetEvent, WidgetEventCounts};

#[derive(Debug, sqlx::FromRow)]
struct EventCountsRow {
    widget_id: WidgetId,
    name: String,
    impressions: i64,
    clicks: i64,
    add_to_carts: i64,
}

impl From<EventCountsRow> for WidgetEventCounts {
    fn from(row: EventCountsRow) -> Self {
        Self {
            widget_id: row.widget_id,
            name: row.name,
            impressions: row.impressions,
            clicks: row.clicks,
            add_to_carts: row.add_to_carts,
        }
    }
}

/// Repository for storefront widget events.
pub struct AnalyticsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AnalyticsRepository<'a> {
    /// Create a new analytics repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record an event.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the widget does not exist.
    /// Returns `RepositoryError::Database` if the insert fails.
    #[instrument(skip(self, event), fields(widget_id = %event.widget_id, event_type = %event.event_type))]
    pub async fn record(&self, event: &NewWidgetEvent) -> Result<WidgetEventId, RepositoryError> {
        sqlx::query_scalar(
            r"
            INSERT INTO bundlewise.widget_event (widget_id, event_type, product_id, session_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(event.widget_id)
        .bind(event.event_type.as_str())
        .bind(event.product_id.as_deref())
        .bind(event.session_id.as_deref())
        .fetch_one(self.pool)
        .await
        .map_err(RepositoryError::from_write)
    }

    /// Event totals per widget of a shop since a point in time.
    ///
    /// Widgets without events are included with zero counts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(shop = %shop))]
    pub async fn counts_since(
        &self,
        shop: &ShopDomain,
        since: DateTime<Utc>,
    ) -> Result<Vec<WidgetEventCounts>, RepositoryError> {
        let rows = sqlx::query_as::<_, EventCountsRow>(
            r"
            SELECT w.id AS widget_id, w.name,
                   COUNT(e.id) FILTER (WHERE e.event_type = 'impression') AS impressions,
                   COUNT(e.id) FILTER (WHERE e.event_type = 'click') AS clicks,
                   COUNT(e.id) FILTER (WHERE e.event_type = 'add_to_cart') AS add_to_carts
            FROM bundlewise.widget w
            LEFT JOIN bundlewise.widget_event e
                   ON e.widget_id = w.id AND e.created_at >= $2
            WHERE w.shop = $1
            GROUP BY w.id, w.name
            ORDER BY w.id
            ",
        )
        .bind(shop.as_str())
        .bind(since)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(WidgetEventCounts::from).collect())
    }
}
