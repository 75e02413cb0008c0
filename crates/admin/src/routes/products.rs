//! Shopify lookups backing the admin product picker.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::middleware::RequireShopSession;
use crate::shopify::{Location, PickerProductConnection};
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: i64 = 25;

/// Query parameters for the product picker.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    /// Shopify search syntax, e.g. `title:shirt*`.
    pub query: Option<String>,
    /// Cursor of the previous page.
    pub after: Option<String>,
    pub first: Option<i64>,
}

/// Search products with their variants.
///
/// # Route
///
/// `GET /app/products?query=&after=&first=`
///
/// # Errors
///
/// Returns 502 if Shopify fails, 429 if it is rate limiting the shop.
pub async fn search(
    State(state): State<AppState>,
    RequireShopSession(session): RequireShopSession,
    Query(params): Query<SearchQuery>,
) -> Result<Json<PickerProductConnection>, AppError> {
    let client = state.shopify(&session.shop).await?;
    let page = client
        .search_products(
            params.first.unwrap_or(DEFAULT_PAGE_SIZE),
            params.after,
            params.query,
        )
        .await?;
    Ok(Json(page))
}

#[derive(Debug, Serialize)]
pub struct LocationList {
    pub locations: Vec<Location>,
}

/// List the shop's locations.
///
/// # Route
///
/// `GET /app/locations`
///
/// # Errors
///
/// Returns 502 if Shopify fails.
pub async fn locations(
    State(state): State<AppState>,
    RequireShopSession(session): RequireShopSession,
) -> Result<Json<LocationList>, AppError> {
    let locations = state.shopify(&session.shop).await?.get_locations().await?;
    Ok(Json(LocationList { locations }))
}
