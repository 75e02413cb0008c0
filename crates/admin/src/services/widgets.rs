//! Widget blob validation.
//!
//! The admin UI submits a widget as one denormalised JSON document. This
//! module turns it into a [`NewWidget`] the repository can write, or explains
//! what is wrong with it.

use std::collections::HashSet;

use thiserror::Error;

use bundlewise_core::{
    Gid, GidError, ResourceKind, SettingsError, WidgetSettings, WidgetType, WidgetTypeError,
};

use crate::models::{
    ChildProductInput, NewChildProduct, NewWidget, NewWidgetProduct, WidgetInput,
};

/// Longest accepted widget name, in characters.
pub const MAX_NAME_LEN: usize = 255;

/// Reasons a submitted widget is rejected.
#[derive(Debug, Error)]
pub enum WidgetValidationError {
    #[error("name is required")]
    MissingName,

    #[error("name must be at most {MAX_NAME_LEN} characters")]
    NameTooLong,

    #[error("at least one product is required")]
    NoProducts,

    #[error("product {0} is listed more than once")]
    DuplicateProduct(Gid),

    #[error("invalid product id {value:?}: {source}")]
    InvalidProductId { value: String, source: GidError },

    #[error("invalid variant id {value:?}: {source}")]
    InvalidVariantId { value: String, source: GidError },

    #[error(transparent)]
    WidgetType(#[from] WidgetTypeError),

    #[error("invalid settings: {0}")]
    Settings(#[from] SettingsError),
}

/// Validate a submitted widget.
///
/// Product IDs may be bare numbers or GIDs; both are stored as GIDs.
/// A missing or empty widget type defaults to `products-page`.
///
/// # Errors
///
/// Returns the first [`WidgetValidationError`] found.
pub fn validate(input: WidgetInput) -> Result<NewWidget, WidgetValidationError> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(WidgetValidationError::MissingName);
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(WidgetValidationError::NameTooLong);
    }

    let widget_type = match input.widget_type.as_deref().map(str::trim) {
        None | Some("") => WidgetType::default(),
        Some(raw) => raw.parse()?,
    };

    let settings = WidgetSettings::from_value(input.settings)?;

    if input.products.is_empty() {
        return Err(WidgetValidationError::NoProducts);
    }

    let mut seen = HashSet::new();
    let mut products = Vec::with_capacity(input.products.len());
    for product in input.products {
        let product_id = product_gid(&product.product_id)?;
        if !seen.insert(product_id) {
            return Err(WidgetValidationError::DuplicateProduct(product_id));
        }
        products.push(NewWidgetProduct {
            product_id,
            children: children(product.children)?,
        });
    }

    Ok(NewWidget {
        name: name.to_string(),
        widget_type,
        settings,
        products,
    })
}

/// Normalise children, dropping exact repeats while keeping order.
fn children(
    inputs: Vec<ChildProductInput>,
) -> Result<Vec<NewChildProduct>, WidgetValidationError> {
    let mut seen = HashSet::new();
    let mut children = Vec::with_capacity(inputs.len());
    for child in inputs {
        let variant_id = match child.variant_id.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(Gid::normalize(raw, ResourceKind::ProductVariant).map_err(
                |source| WidgetValidationError::InvalidVariantId {
                    value: raw.to_string(),
                    source,
                },
            )?),
        };
        let child = NewChildProduct {
            product_id: product_gid(&child.product_id)?,
            variant_id,
        };
        if seen.insert(child) {
            children.push(child);
        }
    }
    Ok(children)
}

fn product_gid(raw: &str) -> Result<Gid, WidgetValidationError> {
    Gid::normalize(raw, ResourceKind::Product).map_err(|source| {
        WidgetValidationError::InvalidProductId {
            value: raw.to_string(),
            source,
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::*;

    fn input(value: serde_json::Value) -> WidgetInput {
        serde_json::from_value(value).unwrap()
    }

    fn valid() -> serde_json::Value {
        json!({
            "name": "  Summer bundle ",
            "widgetType": "cart",
            "settings": { "discounts": [{ "1": 0 }, { "2": "5" }] },
            "products": [{
                "productId": "101",
                "children": [
                    { "productId": "gid://shopify/Product/202" },
                    { "productId": "203", "variantId": "303" },
                    { "productId": "203", "variantId": "gid://shopify/ProductVariant/303" }
                ]
            }]
        })
    }

    #[test]
    fn test_validate_normalises_ids() {
        let widget = validate(input(valid())).unwrap();
        assert_eq!(widget.name, "Summer bundle");
        assert_eq!(widget.widget_type, WidgetType::Cart);
        assert_eq!(widget.settings.discounts.resolve(2), Decimal::new(5, 0));

        let [parent] = widget.products.as_slice() else {
            panic!("expected one parent");
        };
        assert_eq!(parent.product_id.to_string(), "gid://shopify/Product/101");
        let [first, second] = parent.children.as_slice() else {
            panic!("expected duplicate child to be dropped");
        };
        assert_eq!(first.variant_id, None);
        assert_eq!(
            second.variant_id.map(|v| v.to_string()).as_deref(),
            Some("gid://shopify/ProductVariant/303")
        );
    }

    #[test]
    fn test_widget_type_defaults() {
        let mut value = valid();
        value["widgetType"] = json!(null);
        assert_eq!(
            validate(input(value)).unwrap().widget_type,
            WidgetType::ProductsPage
        );
    }

    #[test]
    fn test_rejects_missing_name() {
        let mut value = valid();
        value["name"] = json!("   ");
        assert!(matches!(
            validate(input(value)),
            Err(WidgetValidationError::MissingName)
        ));
    }

    #[test]
    fn test_rejects_long_name() {
        let mut value = valid();
        value["name"] = json!("x".repeat(MAX_NAME_LEN + 1));
        assert!(matches!(
            validate(input(value)),
            Err(WidgetValidationError::NameTooLong)
        ));
    }

    #[test]
    fn test_rejects_no_products() {
        let mut value = valid();
        value["products"] = json!([]);
        assert!(matches!(
            validate(input(value)),
            Err(WidgetValidationError::NoProducts)
        ));
    }

    #[test]
    fn test_rejects_duplicate_parent() {
        let mut value = valid();
        value["products"] = json!([
            { "productId": "101" },
            { "productId": "gid://shopify/Product/101" }
        ]);
        let err = validate(input(value)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "product gid://shopify/Product/101 is listed more than once"
        );
    }

    #[test]
    fn test_rejects_wrong_kind() {
        let mut value = valid();
        value["products"] = json!([{ "productId": "gid://shopify/ProductVariant/1" }]);
        assert!(matches!(
            validate(input(value)),
            Err(WidgetValidationError::InvalidProductId { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_settings() {
        let mut value = valid();
        value["settings"] = json!({ "discounts": [{ "2": 150 }] });
        assert!(matches!(
            validate(input(value)),
            Err(WidgetValidationError::Settings(_))
        ));

        let mut value = valid();
        value["settings"] = json!({
            "appearanceTexts": { "en": { "titleColor": "red" } }
        });
        assert!(matches!(
            validate(input(value)),
            Err(WidgetValidationError::Settings(_))
        ));
    }

    #[test]
    fn test_rejects_unknown_type() {
        let mut value = valid();
        value["widgetType"] = json!("sidebar");
        assert!(matches!(
            validate(input(value)),
            Err(WidgetValidationError::WidgetType(_))
        ));
    }
}
