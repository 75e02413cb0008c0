//! Storefront widget events.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use bundlewise_core::WidgetEventId;

use crate::db::AnalyticsRepository;
use crate::error::AppError;
use crate::models::NewWidgetEvent;
use crate::routes::JsonBody;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct Recorded {
    pub id: WidgetEventId,
}

/// Record an impression, click, or add-to-cart. `eventType` defaults to `click`.
///
/// # Route
///
/// `POST /api/analytics/widget-click`
///
/// # Errors
///
/// Returns 400 for a malformed body, 404 for an unknown widget.
pub async fn record(
    State(state): State<AppState>,
    JsonBody(event): JsonBody<NewWidgetEvent>,
) -> Result<(StatusCode, Json<Recorded>), AppError> {
    let id = AnalyticsRepository::new(state.pool())
        .record(&event)
        .await
        .map_err(|e| match e {
            crate::db::RepositoryError::NotFound => {
                AppError::NotFound(format!("widget {}", event.widget_id))
            }
            other => other.into(),
        })?;

    Ok((StatusCode::CREATED, Json(Recorded { id })))
}
