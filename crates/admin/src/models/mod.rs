//! Domain models for the admin server.

pub mod analytics;
pub mod session;
pub mod variant;
pub mod widget;

use serde::{Deserialize, Deserializer, de::Error as _};

pub use analytics::{
    NewWidgetEvent, WidgetAnalytics, WidgetEventCounts, WidgetOrderStats,
};
pub use session::ShopSession;
pub use variant::{
    InventoryLevel, MarketPrice, VariantPriceUpdate, VariantSnapshot, VariantSnapshotInput,
};
pub use widget::{
    ChildProduct, ChildProductInput, NewChildProduct, NewWidget, NewWidgetProduct, Widget,
    WidgetInput, WidgetProduct, WidgetProductInput, WidgetSummary,
};

/// Accept an integer ID sent either as a JSON number or a numeric string.
///
/// Storefront scripts read IDs from `data-*` attributes, which are strings.
pub(crate) fn flexible_id<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: From<i32>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i32),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(id) => Ok(T::from(id)),
        Raw::Text(text) => text
            .trim()
            .parse::<i32>()
            .map(T::from)
            .map_err(|_| D::Error::custom(format!("invalid id: {text:?}"))),
    }
}
