//! Widget configuration for a product page.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use bundlewise_core::{
    AppearanceText, DiscountTiers, Gid, ResourceKind, ShopDomain, WidgetId, WidgetType,
};

use crate::db::WidgetRepository;
use crate::error::AppError;
use crate::models::{VariantSnapshot, Widget};
use crate::routes::parse_widget_id;
use crate::services::load_snapshots;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetQuery {
    /// Product page the widget is rendered on (numeric ID or GID).
    pub product_id: Option<String>,
    /// Optional guard: the widget must belong to this shop.
    pub shop: Option<String>,
    /// Storefront locale for appearance texts.
    pub locale: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicWidget {
    pub id: WidgetId,
    pub name: String,
    pub widget_type: WidgetType,
    pub product_id: Gid,
    pub discounts: DiscountTiers,
    pub appearance: Option<AppearanceText>,
    pub settings: Value,
    pub children: Vec<PublicChild>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicChild {
    pub product_id: Gid,
    pub variant_id: Option<Gid>,
    /// Cached price and inventory; `None` for "any variant" children.
    pub variant: Option<VariantSnapshot>,
}

/// Widget config with the children offered on `productId`.
///
/// # Route
///
/// `GET /api/widget/{id}?productId=&shop=&locale=`
///
/// # Errors
///
/// Returns 400 without `productId`, 404 if the widget does not exist or the
/// product is not one of its parents.
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<WidgetQuery>,
) -> Result<Json<PublicWidget>, AppError> {
    let id = parse_widget_id(&id)?;
    let product_id = query
        .product_id
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("productId is required".to_string()))
        .and_then(|raw| {
            Gid::normalize(raw, ResourceKind::Product)
                .map_err(|e| AppError::BadRequest(format!("invalid productId: {e}")))
        })?;
    let shop = query
        .shop
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(|raw| ShopDomain::parse(raw).map_err(|e| AppError::BadRequest(e.to_string())))
        .transpose()?;

    let widget = WidgetRepository::new(state.pool())
        .find_for_product(id, &product_id, shop.as_ref())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("widget {id} for product {product_id}")))?;

    let variant_ids = child_variant_ids(&widget, &product_id);
    let snapshots = if variant_ids.is_empty() {
        Vec::new()
    } else {
        load_snapshots(&state, &widget.shop, &variant_ids).await?
    };

    Ok(Json(public_widget(
        widget,
        product_id,
        query.locale.as_deref().unwrap_or("en"),
        snapshots,
    )))
}

fn child_variant_ids(widget: &Widget, product_id: &Gid) -> Vec<Gid> {
    widget
        .parent(product_id)
        .map(|parent| {
            parent
                .children
                .iter()
                .filter_map(|c| c.variant_id)
                .collect()
        })
        .unwrap_or_default()
}

fn public_widget(
    widget: Widget,
    product_id: Gid,
    locale: &str,
    snapshots: Vec<VariantSnapshot>,
) -> PublicWidget {
    let children = widget
        .parent(&product_id)
        .map(|parent| {
            parent
                .children
                .iter()
                .map(|child| PublicChild {
                    product_id: child.product_id,
                    variant_id: child.variant_id,
                    variant: child.variant_id.and_then(|variant_id| {
                        snapshots
                            .iter()
                            .find(|s| s.variant_id == variant_id)
                            .cloned()
                    }),
                })
                .collect()
        })
        .unwrap_or_default();

    PublicWidget {
        id: widget.id,
        name: widget.name,
        widget_type: widget.widget_type,
        product_id,
        appearance: widget.settings.appearance_for(locale).cloned(),
        settings: widget.settings.to_value(),
        discounts: widget.settings.discounts,
        children,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;
    use serde_json::json;

    use bundlewise_core::{ChildProductId, WidgetProductId, WidgetSettings};

    use super::*;
    use crate::models::{ChildProduct, WidgetProduct};

    fn widget() -> Widget {
        Widget {
            id: WidgetId::new(3),
            shop: ShopDomain::parse("demo.myshopify.com").unwrap(),
            name: "Complete the look".to_string(),
            widget_type: WidgetType::ProductsPage,
            settings: WidgetSettings::from_value(json!({
                "discounts": [{ "2": 10 }],
                "appearanceTexts": {
                    "en": { "title": "Bought together" },
                    "fr": { "title": "Achetés ensemble" }
                }
            }))
            .unwrap(),
            products: vec![WidgetProduct {
                id: WidgetProductId::new(1),
                product_id: Gid::new(ResourceKind::Product, 10),
                position: 0,
                children: vec![
                    ChildProduct {
                        id: ChildProductId::new(1),
                        product_id: Gid::new(ResourceKind::Product, 20),
                        variant_id: Some(Gid::new(ResourceKind::ProductVariant, 200)),
                    },
                    ChildProduct {
                        id: ChildProductId::new(2),
                        product_id: Gid::new(ResourceKind::Product, 21),
                        variant_id: None,
                    },
                ],
            }],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn snapshot(variant: u64) -> VariantSnapshot {
        VariantSnapshot {
            variant_id: Gid::new(ResourceKind::ProductVariant, variant),
            product_id: Gid::new(ResourceKind::Product, 20),
            title: "Blue".to_string(),
            sku: None,
            price: Decimal::new(1500, 2),
            compare_at_price: None,
            currency_code: "USD".to_string(),
            inventory_item_id: None,
            inventory_tracked: false,
            available_for_sale: true,
            inventory: vec![],
            market_prices: vec![],
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_child_variant_ids() {
        let parent = Gid::new(ResourceKind::Product, 10);
        assert_eq!(
            child_variant_ids(&widget(), &parent),
            vec![Gid::new(ResourceKind::ProductVariant, 200)]
        );
        assert!(child_variant_ids(&widget(), &Gid::new(ResourceKind::Product, 99)).is_empty());
    }

    #[test]
    fn test_public_widget() {
        let parent = Gid::new(ResourceKind::Product, 10);
        let public = public_widget(widget(), parent, "fr-CA", vec![snapshot(200)]);

        assert_eq!(
            public.appearance.as_ref().and_then(|a| a.title.as_deref()),
            Some("Achetés ensemble")
        );
        let [with_variant, any_variant] = public.children.as_slice() else {
            panic!("expected two children");
        };
        assert_eq!(
            with_variant.variant.as_ref().map(|v| v.price),
            Some(Decimal::new(1500, 2))
        );
        assert!(any_variant.variant.is_none());

        let json = serde_json::to_value(&public).unwrap();
        assert_eq!(json["productId"], "gid://shopify/Product/10");
        assert_eq!(json["discounts"], json!([{ "2": 10 }]));
        assert_eq!(json["widgetType"], "products-page");
    }
}
