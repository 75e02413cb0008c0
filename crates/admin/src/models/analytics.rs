//! Analytics models: storefront events and bundle order statistics.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bundlewise_core::{WidgetEventType, WidgetId};

/// A storefront interaction to record.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWidgetEvent {
    #[serde(deserialize_with = "super::flexible_id")]
    pub widget_id: WidgetId,
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub event_type: WidgetEventType,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Event totals for one widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetEventCounts {
    pub widget_id: WidgetId,
    pub name: String,
    pub impressions: i64,
    pub clicks: i64,
    pub add_to_carts: i64,
}

/// Orders attributed to one widget through the `_bundle_widget_id` line attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetOrderStats {
    pub widget_id: WidgetId,
    pub orders: u64,
    pub items: u64,
    pub revenue: Decimal,
    pub currency_code: Option<String>,
}

impl WidgetOrderStats {
    #[must_use]
    pub const fn empty(widget_id: WidgetId) -> Self {
        Self {
            widget_id,
            orders: 0,
            items: 0,
            revenue: Decimal::ZERO,
            currency_code: None,
        }
    }
}

/// Row of the admin analytics table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetAnalytics {
    #[serde(flatten)]
    pub events: WidgetEventCounts,
    pub orders: u64,
    pub items: u64,
    pub revenue: Decimal,
    pub currency_code: Option<String>,
    /// Clicks per impression, rounded to 4 places. `None` without impressions.
    pub click_through_rate: Option<Decimal>,
    /// Orders per click, rounded to 4 places. `None` without clicks.
    pub conversion_rate: Option<Decimal>,
}
