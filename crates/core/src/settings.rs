//! Persisted widget settings.
//!
//! Stored as JSON alongside each widget:
//!
//! ```json
//! {
//!   "discounts": [{ "1": 0 }, { "2": 5 }],
//!   "appearanceTexts": {
//!     "en": { "title": "Bought together", "buttonText": "Add all", "titleColor": "#222222" }
//!   }
//! }
//! ```
//!
//! Keys the server does not model are kept verbatim so that storefront
//! scripts can evolve their settings without a migration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::discount::{DiscountTiers, TierError};

const FALLBACK_LOCALE: &str = "en";

/// Errors produced while validating widget settings.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("settings must be a JSON object")]
    NotAnObject,
    #[error(transparent)]
    Discounts(#[from] TierError),
    #[error("invalid appearance texts: {0}")]
    Appearance(String),
    #[error("invalid color for {locale}.{field}: {value:?}")]
    InvalidColor {
        locale: String,
        field: &'static str,
        value: String,
    },
}

/// Texts and colors for one storefront locale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppearanceText {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_badge: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button_text_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl AppearanceText {
    fn colors(&self) -> [(&'static str, Option<&str>); 5] {
        [
            ("titleColor", self.title_color.as_deref()),
            ("textColor", self.text_color.as_deref()),
            ("buttonColor", self.button_color.as_deref()),
            ("buttonTextColor", self.button_text_color.as_deref()),
            ("backgroundColor", self.background_color.as_deref()),
        ]
    }
}

/// Settings blob attached to a widget.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetSettings {
    #[serde(default)]
    pub discounts: DiscountTiers,
    #[serde(default)]
    pub appearance_texts: BTreeMap<String, AppearanceText>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WidgetSettings {
    /// Parse and validate settings submitted by the admin UI.
    ///
    /// `null` is treated as empty settings.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] if the discounts or appearance texts are malformed.
    pub fn from_value(value: Value) -> Result<Self, SettingsError> {
        let mut object = match value {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            _ => return Err(SettingsError::NotAnObject),
        };

        let discounts = match object.remove("discounts") {
            None | Some(Value::Null) => DiscountTiers::default(),
            Some(raw) => DiscountTiers::from_json(&raw)?,
        };
        let appearance_texts = match object.remove("appearanceTexts") {
            None | Some(Value::Null) => BTreeMap::new(),
            Some(raw) => serde_json::from_value(raw)
                .map_err(|e| SettingsError::Appearance(e.to_string()))?,
        };

        let settings = Self {
            discounts,
            appearance_texts,
            extra: object,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Check every configured color.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidColor`] for the first malformed color.
    pub fn validate(&self) -> Result<(), SettingsError> {
        for (locale, texts) in &self.appearance_texts {
            for (field, color) in texts.colors() {
                if let Some(value) = color
                    && !is_hex_color(value)
                {
                    return Err(SettingsError::InvalidColor {
                        locale: locale.clone(),
                        field,
                        value: value.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Texts for a storefront locale.
    ///
    /// Falls back from `fr-CA` to `fr`, then to `en`, then to any configured locale.
    #[must_use]
    pub fn appearance_for(&self, locale: &str) -> Option<&AppearanceText> {
        let locale = locale.trim().to_ascii_lowercase();
        let language = locale.split(['-', '_']).next().unwrap_or_default();

        self.appearance_texts
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(&locale))
            .or_else(|| {
                self.appearance_texts
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(language))
            })
            .map(|(_, texts)| texts)
            .or_else(|| self.appearance_texts.get(FALLBACK_LOCALE))
            .or_else(|| self.appearance_texts.values().next())
    }

    /// Serialize back to the persisted JSON shape.
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

fn is_hex_color(value: &str) -> bool {
    value.strip_prefix('#').is_some_and(|hex| {
        matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit())
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::*;

    fn sample() -> Value {
        json!({
            "discounts": [{ "1": 0 }, { "2": 5 }, { "4": 10 }],
            "appearanceTexts": {
                "en": { "title": "Bought together", "buttonText": "Add all", "titleColor": "#222" },
                "fr": { "title": "Souvent achetés ensemble", "layout": "grid" }
            },
            "showPrices": true
        })
    }

    #[test]
    fn test_parse_full_settings() {
        let settings = WidgetSettings::from_value(sample()).unwrap();
        assert_eq!(settings.discounts.resolve(3), Decimal::from(5));
        assert_eq!(settings.appearance_texts.len(), 2);
        assert_eq!(settings.extra.get("showPrices"), Some(&json!(true)));
        let fr = settings.appearance_texts.get("fr").unwrap();
        assert_eq!(fr.extra.get("layout"), Some(&json!("grid")));
    }

    #[test]
    fn test_null_is_empty() {
        let settings = WidgetSettings::from_value(Value::Null).unwrap();
        assert!(settings.discounts.is_empty());
        assert!(settings.appearance_texts.is_empty());
    }

    #[test]
    fn test_non_object_rejected() {
        assert_eq!(
            WidgetSettings::from_value(json!([1, 2])),
            Err(SettingsError::NotAnObject)
        );
    }

    #[test]
    fn test_invalid_discounts_surface_tier_error() {
        let err = WidgetSettings::from_value(json!({ "discounts": [{ "x": 1 }] })).unwrap_err();
        assert!(matches!(err, SettingsError::Discounts(TierError::InvalidThreshold(_))));
    }

    #[test]
    fn test_invalid_color_rejected() {
        let err = WidgetSettings::from_value(json!({
            "appearanceTexts": { "en": { "buttonColor": "red" } }
        }))
        .unwrap_err();
        assert_eq!(
            err,
            SettingsError::InvalidColor {
                locale: "en".to_string(),
                field: "buttonColor",
                value: "red".to_string(),
            }
        );
    }

    #[test]
    fn test_locale_fallback() {
        let settings = WidgetSettings::from_value(sample()).unwrap();
        let fr_ca = settings.appearance_for("fr-CA").unwrap();
        assert_eq!(fr_ca.title.as_deref(), Some("Souvent achetés ensemble"));
        let de = settings.appearance_for("de").unwrap();
        assert_eq!(de.title.as_deref(), Some("Bought together"));
        assert!(WidgetSettings::default().appearance_for("en").is_none());
    }

    #[test]
    fn test_round_trips_unknown_keys() {
        let settings = WidgetSettings::from_value(sample()).unwrap();
        let value = settings.to_value();
        assert_eq!(value["showPrices"], json!(true));
        assert_eq!(value["appearanceTexts"]["fr"]["layout"], json!("grid"));
        assert_eq!(value["discounts"], json!([{ "1": 0 }, { "2": 5 }, { "4": 10 }]));
    }

    #[test]
    fn test_hex_colors() {
        assert!(is_hex_color("#fff"));
        assert!(is_hex_color("#A0b1C2"));
        assert!(!is_hex_color("fff"));
        assert!(!is_hex_color("#ffff"));
        assert!(!is_hex_color("#ggg"));
    }
}
