//! Variant snapshots and markets for storefront scripts.

use axum::{
    Json,
    extract::{Query, State},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bundlewise_core::{Gid, ResourceKind};

use super::require_shop;
use crate::error::AppError;
use crate::models::VariantSnapshot;
use crate::services::load_snapshots;
use crate::shopify::Market;
use crate::state::AppState;

/// Most variants accepted in one lookup.
const MAX_VARIANTS: usize = 250;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantDetailsQuery {
    pub shop: Option<String>,
    /// Comma separated numeric IDs or GIDs.
    pub variant_ids: Option<String>,
    pub market_id: Option<String>,
    pub location_id: Option<String>,
}

/// A snapshot with price and availability resolved for the request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantDetails {
    #[serde(flatten)]
    pub snapshot: VariantSnapshot,
    /// Price in the requested market, or the shop price.
    pub display_price: Decimal,
    pub display_compare_at_price: Option<Decimal>,
    pub display_currency_code: String,
    /// Units at the requested location (all locations if none); `None` when untracked.
    pub available: Option<i64>,
}

impl VariantDetails {
    fn resolve(snapshot: VariantSnapshot, market_id: Option<&Gid>, location_id: Option<&Gid>) -> Self {
        let (price, compare_at_price, currency_code) = snapshot.price_in(market_id);
        let currency_code = currency_code.to_string();
        let available = snapshot.available(location_id);
        Self {
            snapshot,
            display_price: price,
            display_compare_at_price: compare_at_price,
            display_currency_code: currency_code,
            available,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VariantDetailsResponse {
    pub variants: Vec<VariantDetails>,
}

/// Cached price and inventory of variants, filled from Shopify on a miss.
///
/// # Route
///
/// `GET /api/variant-details?shop=&variantIds=a,b[&marketId=][&locationId=]`
///
/// # Errors
///
/// Returns 400 for a missing shop or malformed IDs.
pub async fn variant_details(
    State(state): State<AppState>,
    Query(query): Query<VariantDetailsQuery>,
) -> Result<Json<VariantDetailsResponse>, AppError> {
    let shop = require_shop(query.shop.as_deref())?;
    let ids = parse_variant_ids(query.variant_ids.as_deref().unwrap_or_default())?;
    let market_id = optional_gid(query.market_id.as_deref(), ResourceKind::Market)?;
    let location_id = optional_gid(query.location_id.as_deref(), ResourceKind::Location)?;

    let variants = load_snapshots(&state, &shop, &ids)
        .await?
        .into_iter()
        .map(|s| VariantDetails::resolve(s, market_id.as_ref(), location_id.as_ref()))
        .collect();

    Ok(Json(VariantDetailsResponse { variants }))
}

#[derive(Debug, Default, Deserialize)]
pub struct MarketsQuery {
    pub shop: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MarketsResponse {
    pub markets: Vec<Market>,
}

/// Markets of a shop (cached for five minutes).
///
/// # Route
///
/// `GET /api/markets?shop=`
///
/// # Errors
///
/// Returns 400 for a missing shop, 502 if Shopify fails.
pub async fn markets(
    State(state): State<AppState>,
    Query(query): Query<MarketsQuery>,
) -> Result<Json<MarketsResponse>, AppError> {
    let shop = require_shop(query.shop.as_deref())?;
    let markets = state.markets(&shop).await?;
    Ok(Json(MarketsResponse {
        markets: markets.as_ref().clone(),
    }))
}

fn parse_variant_ids(raw: &str) -> Result<Vec<Gid>, AppError> {
    let mut ids = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let id = Gid::normalize(part, ResourceKind::ProductVariant)
            .map_err(|e| AppError::BadRequest(format!("invalid variant id {part:?}: {e}")))?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }

    if ids.is_empty() {
        return Err(AppError::BadRequest("variantIds is required".to_string()));
    }
    if ids.len() > MAX_VARIANTS {
        return Err(AppError::BadRequest(format!(
            "at most {MAX_VARIANTS} variantIds per request"
        )));
    }
    Ok(ids)
}

fn optional_gid(raw: Option<&str>, kind: ResourceKind) -> Result<Option<Gid>, AppError> {
    raw.map(str::trim)
        .filter(|r| !r.is_empty())
        .map(|r| {
            Gid::normalize(r, kind).map_err(|e| AppError::BadRequest(format!("invalid {kind} id: {e}")))
        })
        .transpose()
}
