//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness
//! GET  /health/ready                    - Readiness (database ping)
//!
//! # Embedded admin (Shopify session token)
//! GET  /app/widgets                     - List widgets
//! POST /app/widgets                     - Create widget
//! GET  /app/widgets/{id}                - Widget detail
//! PUT  /app/widgets/{id}                - Replace widget
//! DELETE /app/widgets/{id}              - Delete widget
//! GET  /app/products                    - Product picker search
//! GET  /app/locations                   - Shop locations
//! GET  /app/analytics                   - Widget events and bundle order stats
//!
//! # Install flow
//! GET  /auth                            - Redirect to Shopify grant screen
//! GET  /auth/callback                   - Token exchange
//!
//! # Webhooks (HMAC verified)
//! POST /webhooks/products/update
//! POST /webhooks/inventory_levels/update
//! POST /webhooks/app/uninstalled
//!
//! # Storefront API (CORS, rate limited)
//! GET  /api/widget/{id}                 - Widget config for a product page
//! POST /api/cart/calculate-discount     - Bundle discount quote
//! GET  /api/variant-details             - Variant price and inventory snapshots
//! GET  /api/markets                     - Shop markets
//! POST /api/analytics/widget-click      - Record a widget event
//! ```

pub mod analytics;
pub mod api;
pub mod auth;
pub mod products;
pub mod webhooks;
pub mod widgets;

use axum::{
    Json, Router,
    extract::{FromRequest, Request},
    routing::{get, post},
};
use serde::de::DeserializeOwned;

use bundlewise_core::WidgetId;

use crate::error::AppError;
use crate::state::AppState;

/// Embedded admin routes, nested under `/app`.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/widgets", get(widgets::index).post(widgets::create))
        .route(
            "/widgets/{id}",
            get(widgets::show)
                .put(widgets::update)
                .delete(widgets::destroy),
        )
        .route("/products", get(products::search))
        .route("/locations", get(products::locations))
        .route("/analytics", get(analytics::index))
}

/// OAuth install routes, nested under `/auth`.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(auth::install))
        .route("/callback", get(auth::callback))
}

/// Webhook routes, nested under `/webhooks`.
pub fn webhook_routes() -> Router<AppState> {
    Router::new()
        .route("/products/update", post(webhooks::products_update))
        .route(
            "/inventory_levels/update",
            post(webhooks::inventory_levels_update),
        )
        .route("/app/uninstalled", post(webhooks::app_uninstalled))
}

/// JSON body extractor that rejects with the app's `{ "error": ... }` shape.
pub struct JsonBody<T>(pub T);

impl<T: DeserializeOwned> FromRequest<AppState> for JsonBody<T> {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        Json::<T>::from_request(req, state)
            .await
            .map(|Json(value)| Self(value))
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
    }
}

/// Parse a widget ID from a path segment.
///
/// # Errors
///
/// Returns `AppError::BadRequest` if the segment is not an integer.
pub fn parse_widget_id(raw: &str) -> Result<WidgetId, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("invalid widget id: {raw:?}")))
}
