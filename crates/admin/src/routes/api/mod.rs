//! Storefront API.
//!
//! Read by the widget scripts injected into the merchant's theme and by the
//! checkout extension. Every route is CORS enabled and rate limited per IP in
//! `app::create_app`; none require authentication, so every response is
//! scoped by widget or by an explicit `shop` parameter.

pub mod cart;
pub mod events;
pub mod variants;
pub mod widget;

use axum::{
    Router,
    routing::{get, post},
};

use bundlewise_core::ShopDomain;

use crate::error::AppError;
use crate::state::AppState;

/// Build the storefront API router, nested under `/api`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/widget/{id}", get(widget::show))
        .route("/cart/calculate-discount", post(cart::calculate_discount))
        .route("/variant-details", get(variants::variant_details))
        .route("/markets", get(variants::markets))
        .route("/analytics/widget-click", post(events::record))
}

/// Parse the required `shop` query parameter.
fn require_shop(raw: Option<&str>) -> Result<ShopDomain, AppError> {
    let raw = raw
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("shop is required".to_string()))?;
    ShopDomain::parse(raw).map_err(|e| AppError::BadRequest(e.to_string()))
}
