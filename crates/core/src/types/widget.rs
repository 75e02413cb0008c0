//! Widget placement and analytics event enums.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a stored or submitted enum value is unknown.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct WidgetTypeError {
    kind: &'static str,
    value: String,
}

/// Where a widget renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum WidgetType {
    /// Product detail page selector.
    #[default]
    ProductsPage,
    /// Cart drawer / cart page upsell.
    Cart,
    /// Checkout UI extension.
    Checkout,
}

impl WidgetType {
    /// All widget types, in display order.
    pub const ALL: [Self; 3] = [Self::ProductsPage, Self::Cart, Self::Checkout];

    /// Database / wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ProductsPage => "products-page",
            Self::Cart => "cart",
            Self::Checkout => "checkout",
        }
    }
}

impl fmt::Display for WidgetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WidgetType {
    type Err = WidgetTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| WidgetTypeError {
                kind: "widget type",
                value: s.to_string(),
            })
    }
}

/// Storefront interaction recorded for analytics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WidgetEventType {
    Impression,
    #[default]
    Click,
    AddToCart,
}

impl WidgetEventType {
    pub const ALL: [Self; 3] = [Self::Impression, Self::Click, Self::AddToCart];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Impression => "impression",
            Self::Click => "click",
            Self::AddToCart => "add_to_cart",
        }
    }
}

impl fmt::Display for WidgetEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WidgetEventType {
    type Err = WidgetTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| WidgetTypeError {
                kind: "event type",
                value: s.to_string(),
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_widget_type_wire_format() {
        for t in WidgetType::ALL {
            let json = serde_json::to_string(&t).unwrap();
            assert_eq!(json, format!("\"{}\"", t.as_str()));
            assert_eq!(t.as_str().parse::<WidgetType>().unwrap(), t);
        }
    }

    #[test]
    fn test_unknown_widget_type() {
        let err = "sidebar".parse::<WidgetType>().unwrap_err();
        assert_eq!(err.to_string(), "unknown widget type: sidebar");
    }

    #[test]
    fn test_event_type_parse() {
        assert_eq!(
            "add_to_cart".parse::<WidgetEventType>().unwrap(),
            WidgetEventType::AddToCart
        );
        assert!("purchase".parse::<WidgetEventType>().is_err());
    }
}
