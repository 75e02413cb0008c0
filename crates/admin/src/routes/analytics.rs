//! Admin analytics: widget events joined with bundle order statistics.

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::{Days, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::AnalyticsRepository;
use crate::error::AppError;
use crate::middleware::RequireShopSession;
use crate::models::WidgetAnalytics;
use crate::services::order_analytics;
use crate::state::AppState;

/// Window used when `since` is not given.
const DEFAULT_WINDOW_DAYS: u64 = 30;

#[derive(Debug, Default, Deserialize)]
pub struct AnalyticsQuery {
    /// First day included, `YYYY-MM-DD`.
    pub since: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsResponse {
    pub since: NaiveDate,
    pub widgets: Vec<WidgetAnalytics>,
}

/// Per-widget impressions, clicks, and attributed orders since a date.
///
/// Order statistics come from a Shopify bulk export, so this call can take
/// as long as the configured bulk poll timeout.
///
/// # Route
///
/// `GET /app/analytics?since=YYYY-MM-DD`
///
/// # Errors
///
/// Returns 400 for a malformed date, 502 if the bulk export fails.
pub async fn index(
    State(state): State<AppState>,
    RequireShopSession(session): RequireShopSession,
    Query(params): Query<AnalyticsQuery>,
) -> Result<Json<AnalyticsResponse>, AppError> {
    let since = parse_since(params.since.as_deref(), Utc::now().date_naive())?;

    let events = AnalyticsRepository::new(state.pool())
        .counts_since(&session.shop, since.and_time(NaiveTime::MIN).and_utc())
        .await?;

    let orders = state
        .shopify(&session.shop)
        .await?
        .export_orders(Some(since), &state.config().bulk)
        .await?;
    let stats = order_analytics::aggregate_orders(&orders);

    Ok(Json(AnalyticsResponse {
        since,
        widgets: order_analytics::combine(events, &stats),
    }))
}

fn parse_since(raw: Option<&str>, today: NaiveDate) -> Result<NaiveDate, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(today
            .checked_sub_days(Days::new(DEFAULT_WINDOW_DAYS))
            .unwrap_or(today)),
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|_| AppError::BadRequest(format!("invalid since date: {raw:?}"))),
    }
}
