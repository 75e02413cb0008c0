//! Widget domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use bundlewise_core::{
    ChildProductId, Gid, ShopDomain, WidgetId, WidgetProductId, WidgetSettings, WidgetType,
};

/// A widget with its products, as stored.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Widget {
    pub id: WidgetId,
    pub shop: ShopDomain,
    pub name: String,
    pub widget_type: WidgetType,
    pub settings: WidgetSettings,
    pub products: Vec<WidgetProduct>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Widget {
    /// The parent entry for a product, if the product is one of this widget's parents.
    #[must_use]
    pub fn parent(&self, product_id: &Gid) -> Option<&WidgetProduct> {
        self.products.iter().find(|p| p.product_id == *product_id)
    }
}

/// A parent product of a widget.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetProduct {
    pub id: WidgetProductId,
    pub product_id: Gid,
    pub position: i32,
    pub children: Vec<ChildProduct>,
}

/// A product offered alongside a parent.
///
/// `variant_id` of `None` means any variant of the product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildProduct {
    pub id: ChildProductId,
    pub product_id: Gid,
    pub variant_id: Option<Gid>,
}

/// Row shown in the admin widget list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetSummary {
    pub id: WidgetId,
    pub name: String,
    pub widget_type: WidgetType,
    pub product_count: i64,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Input
// =============================================================================

/// Widget blob submitted by the admin UI.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub widget_type: Option<String>,
    #[serde(default)]
    pub settings: Value,
    #[serde(default)]
    pub products: Vec<WidgetProductInput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetProductInput {
    pub product_id: String,
    #[serde(default)]
    pub children: Vec<ChildProductInput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildProductInput {
    pub product_id: String,
    #[serde(default)]
    pub variant_id: Option<String>,
}

/// A validated widget ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewWidget {
    pub name: String,
    pub widget_type: WidgetType,
    pub settings: WidgetSettings,
    pub products: Vec<NewWidgetProduct>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWidgetProduct {
    pub product_id: Gid,
    pub children: Vec<NewChildProduct>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NewChildProduct {
    pub product_id: Gid,
    pub variant_id: Option<Gid>,
}
