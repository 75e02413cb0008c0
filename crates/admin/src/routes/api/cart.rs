//! Bundle discount quotes for the storefront cart.

use axum::{Json, extract::State};

use bundlewise_core::{Gid, ResourceKind};

use crate::db::WidgetRepository;
use crate::error::AppError;
use crate::models::VariantSnapshot;
use crate::routes::JsonBody;
use crate::services::{DiscountQuote, DiscountRequest, PricedLine, load_snapshots, quote};
use crate::state::AppState;

/// Most lines accepted in one quote.
const MAX_ITEMS: usize = 100;

/// Price the selected variants with the widget's discount tiers.
///
/// # Route
///
/// `POST /api/cart/calculate-discount`
///
/// ```json
/// { "widgetId": 12, "items": [{ "variantId": "gid://shopify/ProductVariant/1", "quantity": 1 }] }
/// ```
///
/// # Errors
///
/// Returns 400 for a malformed body or unknown variant, 404 for an unknown widget.
pub async fn calculate_discount(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<DiscountRequest>,
) -> Result<Json<DiscountQuote>, AppError> {
    if request.items.is_empty() {
        return Err(AppError::BadRequest("items must not be empty".to_string()));
    }
    if request.items.len() > MAX_ITEMS {
        return Err(AppError::BadRequest(format!(
            "at most {MAX_ITEMS} items can be quoted"
        )));
    }

    let selection = request
        .items
        .iter()
        .map(|item| {
            let variant_id = Gid::normalize(&item.variant_id, ResourceKind::ProductVariant)
                .map_err(|e| AppError::BadRequest(format!("invalid variantId: {e}")))?;
            match item.quantity {
                Some(0) => Err(AppError::BadRequest("quantity must be at least 1".to_string())),
                quantity => Ok((variant_id, quantity.unwrap_or(1))),
            }
        })
        .collect::<Result<Vec<_>, _>>()?;
    let selection = merge_duplicates(selection);
    let market_id = request
        .market_id
        .as_deref()
        .filter(|m| !m.trim().is_empty())
        .map(|raw| {
            Gid::normalize(raw, ResourceKind::Market)
                .map_err(|e| AppError::BadRequest(format!("invalid marketId: {e}")))
        })
        .transpose()?;

    let widget = WidgetRepository::new(state.pool())
        .get_any(request.widget_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("widget {}", request.widget_id)))?;

    let ids: Vec<Gid> = selection.iter().map(|(id, _)| *id).collect();
    let snapshots = load_snapshots(&state, &widget.shop, &ids).await?;

    let (lines, currency) = price_selection(&selection, &snapshots, market_id.as_ref())?;
    Ok(Json(quote(&widget.settings.discounts, &lines, &currency)))
}

/// Fold repeated variants into one line with the summed quantity.
///
/// Shopify merges identical cart lines, so a variant listed twice is one
/// line at checkout. Order of first appearance is kept.
fn merge_duplicates(selection: Vec<(Gid, u32)>) -> Vec<(Gid, u32)> {
    let mut merged: Vec<(Gid, u32)> = Vec::with_capacity(selection.len());
    for (variant_id, quantity) in selection {
        match merged.iter_mut().find(|(id, _)| *id == variant_id) {
            Some((_, total)) => *total = total.saturating_add(quantity),
            None => merged.push((variant_id, quantity)),
        }
    }
    merged
}

/// Attach unit prices to the selection.
///
/// All lines are priced in the currency of the first one.
fn price_selection(
    selection: &[(Gid, u32)],
    snapshots: &[VariantSnapshot],
    market_id: Option<&Gid>,
) -> Result<(Vec<PricedLine>, String), AppError> {
    let mut currency = None;
    let mut lines = Vec::with_capacity(selection.len());

    for (variant_id, quantity) in selection {
        let snapshot = snapshots
            .iter()
            .find(|s| s.variant_id == *variant_id)
            .ok_or_else(|| AppError::BadRequest(format!("unknown variant {variant_id}")))?;
        let (price, _, code) = snapshot.price_in(market_id);
        currency.get_or_insert_with(|| code.to_string());
        lines.push(PricedLine {
            variant_id: *variant_id,
            quantity: *quantity,
            unit_price: price,
        });
    }

    Ok((lines, currency.unwrap_or_default()))
}
