//! Widget CRUD for the embedded admin.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;

use crate::db::WidgetRepository;
use crate::error::AppError;
use crate::middleware::RequireShopSession;
use crate::models::{Widget, WidgetInput, WidgetSummary};
use crate::routes::{JsonBody, parse_widget_id};
use crate::services::{function_config, widgets};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct WidgetList {
    pub widgets: Vec<WidgetSummary>,
}

/// List the shop's widgets.
///
/// # Route
///
/// `GET /app/widgets`
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn index(
    State(state): State<AppState>,
    RequireShopSession(session): RequireShopSession,
) -> Result<Json<WidgetList>, AppError> {
    let widgets = WidgetRepository::new(state.pool())
        .list(&session.shop)
        .await?;
    Ok(Json(WidgetList { widgets }))
}

/// Get one widget with its products.
///
/// # Route
///
/// `GET /app/widgets/{id}`
///
/// # Errors
///
/// Returns 404 if the widget does not exist in the shop.
pub async fn show(
    State(state): State<AppState>,
    RequireShopSession(session): RequireShopSession,
    Path(id): Path<String>,
) -> Result<Json<Widget>, AppError> {
    let id = parse_widget_id(&id)?;
    WidgetRepository::new(state.pool())
        .get(&session.shop, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("widget {id}")))
}

/// Create a widget.
///
/// # Route
///
/// `POST /app/widgets`
///
/// # Errors
///
/// Returns 400 if the widget is invalid, 409 on a duplicate parent product.
pub async fn create(
    State(state): State<AppState>,
    RequireShopSession(session): RequireShopSession,
    JsonBody(input): JsonBody<WidgetInput>,
) -> Result<(StatusCode, Json<Widget>), AppError> {
    let widget = widgets::validate(input)?;
    let widget = WidgetRepository::new(state.pool())
        .create(&session.shop, &widget)
        .await?;

    function_config::spawn_sync(state, session.shop);
    Ok((StatusCode::CREATED, Json(widget)))
}

/// Replace a widget and its products.
///
/// # Route
///
/// `PUT /app/widgets/{id}`
///
/// # Errors
///
/// Returns 400 if the widget is invalid, 404 if it does not exist.
pub async fn update(
    State(state): State<AppState>,
    RequireShopSession(session): RequireShopSession,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<WidgetInput>,
) -> Result<Json<Widget>, AppError> {
    let id = parse_widget_id(&id)?;
    let widget = widgets::validate(input)?;
    let widget = WidgetRepository::new(state.pool())
        .update(&session.shop, id, &widget)
        .await?;

    function_config::spawn_sync(state, session.shop);
    Ok(Json(widget))
}

/// Delete a widget.
///
/// # Route
///
/// `DELETE /app/widgets/{id}`
///
/// # Errors
///
/// Returns 404 if the widget does not exist in the shop.
pub async fn destroy(
    State(state): State<AppState>,
    RequireShopSession(session): RequireShopSession,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_widget_id(&id)?;
    let deleted = WidgetRepository::new(state.pool())
        .delete(&session.shop, id)
        .await?;
    if !deleted {
        return Err(AppError::NotFound(format!("widget {id}")));
    }

    tracing::info!(widget_id = %id, shop = %session.shop, "Widget deleted");
    function_config::spawn_sync(state, session.shop);
    Ok(StatusCode::NO_CONTENT)
}
