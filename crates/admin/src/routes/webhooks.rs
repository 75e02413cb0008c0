//! Shopify webhook receivers.
//!
//! Deliveries that do not concern anything we cache are acknowledged with
//! 200 so Shopify does not retry them.

use axum::{Json, extract::State};
use serde::Serialize;

use crate::db::{ShopifySessionRepository, VariantDetailsRepository};
use crate::error::AppError;
use crate::middleware::ShopifyWebhook;
use crate::services::SyncOutcome;
use crate::services::variant_sync::{self, InventoryLevelPayload, ProductUpdatePayload};
use crate::state::AppState;

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct WebhookAck {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<u64>,
}

impl From<SyncOutcome> for WebhookAck {
    fn from(outcome: SyncOutcome) -> Self {
        match outcome {
            SyncOutcome::NotApplicable => Self {
                status: "not applicable",
                updated: None,
            },
            SyncOutcome::Updated(count) => Self {
                status: "ok",
                updated: Some(count),
            },
        }
    }
}

/// Refresh cached prices of a product's variants.
///
/// # Route
///
/// `POST /webhooks/products/update`
///
/// # Errors
///
/// Returns 401 on a bad signature, 500 if the cache cannot be updated.
pub async fn products_update(
    State(state): State<AppState>,
    webhook: ShopifyWebhook,
) -> Result<Json<WebhookAck>, AppError> {
    let payload: ProductUpdatePayload = webhook.json()?;
    let repo = VariantDetailsRepository::new(state.pool());
    let outcome = variant_sync::apply_product_update(&repo, &webhook.shop, &payload).await?;

    tracing::info!(shop = %webhook.shop, product_id = payload.id, ?outcome, "products/update processed");
    Ok(Json(outcome.into()))
}

/// Update the cached availability of an inventory item at a location.
///
/// # Route
///
/// `POST /webhooks/inventory_levels/update`
///
/// # Errors
///
/// Returns 401 on a bad signature, 500 if the cache cannot be updated.
pub async fn inventory_levels_update(
    State(state): State<AppState>,
    webhook: ShopifyWebhook,
) -> Result<Json<WebhookAck>, AppError> {
    let payload: InventoryLevelPayload = webhook.json()?;
    let repo = VariantDetailsRepository::new(state.pool());
    let outcome = variant_sync::apply_inventory_update(&repo, &webhook.shop, payload).await?;

    tracing::info!(
        shop = %webhook.shop,
        inventory_item_id = payload.inventory_item_id,
        ?outcome,
        "inventory_levels/update processed"
    );
    Ok(Json(outcome.into()))
}

/// Forget a shop that removed the app.
///
/// Widgets are kept so a reinstall restores them; the token and the variant
/// cache are dropped.
///
/// # Route
///
/// `POST /webhooks/app/uninstalled`
///
/// # Errors
///
/// Returns 401 on a bad signature, 500 if the cleanup fails.
pub async fn app_uninstalled(
    State(state): State<AppState>,
    webhook: ShopifyWebhook,
) -> Result<Json<WebhookAck>, AppError> {
    let shop = &webhook.shop;
    ShopifySessionRepository::new(state.pool())
        .delete(shop)
        .await?;
    let removed = VariantDetailsRepository::new(state.pool())
        .delete_for_shop(shop)
        .await?;
    state.forget_shop(shop).await;

    tracing::info!(shop = %shop, removed, "App uninstalled");
    Ok(Json(WebhookAck {
        status: "ok",
        updated: Some(removed),
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_ack_shapes() {
        assert_eq!(
            serde_json::to_value(WebhookAck::from(SyncOutcome::NotApplicable)).unwrap(),
            json!({ "status": "not applicable" })
        );
        assert_eq!(
            serde_json::to_value(WebhookAck::from(SyncOutcome::Updated(2))).unwrap(),
            json!({ "status": "ok", "updated": 2 })
        );
    }
}
