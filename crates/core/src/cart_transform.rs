//! Cart Transform Function logic.
//!
//! Shopify invokes the function with the cart lines selected by its input
//! query and applies the returned price operations at checkout. Lines added
//! by a bundle widget carry three attributes:
//!
//! - `_bundle_id` - groups the lines added together
//! - `_bundle_widget_id` - the widget that produced the group
//! - `_bundle_discount` - percent computed by `calculate-discount`
//!
//! When the function's metafield configuration carries tiers for the widget,
//! the percent is recomputed from the group size so a shopper cannot edit the
//! attribute to get a bigger discount. Malformed input never fails checkout;
//! the affected lines are just left at their original price.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::discount::{DiscountTiers, apply_percent, parse_percent};

/// Line attribute holding the bundle group key.
pub const BUNDLE_ID_ATTRIBUTE: &str = "_bundle_id";
/// Line attribute holding the widget ID.
pub const WIDGET_ID_ATTRIBUTE: &str = "_bundle_widget_id";
/// Line attribute holding the percent quoted to the shopper.
pub const DISCOUNT_ATTRIBUTE: &str = "_bundle_discount";

// =============================================================================
// Input
// =============================================================================

/// A cart line as read by the function's input query.
///
/// Attribute values are passed through as received; blank values count as
/// missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleLine {
    pub id: String,
    /// Unit cost before any bundle adjustment.
    pub amount_per_quantity: Decimal,
    pub bundle_id: Option<String>,
    pub widget_id: Option<String>,
    pub discount: Option<String>,
}

/// Configuration stored in the cart transform's metafield.
///
/// ```json
/// { "widgets": { "12": [{ "2": 5 }, { "3": 10 }] } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionConfig {
    #[serde(default)]
    pub widgets: BTreeMap<String, DiscountTiers>,
}

impl FunctionConfig {
    /// Parse the metafield value, treating malformed JSON as "no configuration".
    #[must_use]
    pub fn from_metafield(value: Option<&str>) -> Self {
        value
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or_default()
    }
}

// =============================================================================
// Output
// =============================================================================

/// Fixed per-unit price for one cart line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceUpdate {
    pub cart_line_id: String,
    pub amount: Decimal,
}

// =============================================================================
// Run
// =============================================================================

/// Compute the discounted unit price of every bundled line in the cart.
///
/// Lines are grouped by `_bundle_id`; lines without one are left alone.
/// Updates come out ordered by bundle ID, then by cart order within a bundle.
#[must_use]
pub fn run(lines: &[BundleLine], config: &FunctionConfig) -> Vec<PriceUpdate> {
    let mut groups: BTreeMap<&str, Vec<&BundleLine>> = BTreeMap::new();
    for line in lines {
        if let Some(bundle_id) = attribute_value(line.bundle_id.as_deref()) {
            groups.entry(bundle_id).or_default().push(line);
        }
    }

    groups
        .values()
        .flat_map(|lines| {
            let percent = group_percent(lines, config);
            lines
                .iter()
                .filter(move |_| percent > Decimal::ZERO)
                .map(move |line| PriceUpdate {
                    cart_line_id: line.id.clone(),
                    amount: apply_percent(line.amount_per_quantity, percent),
                })
        })
        .collect()
}

fn group_percent(lines: &[&BundleLine], config: &FunctionConfig) -> Decimal {
    let widget_id = lines
        .iter()
        .find_map(|line| attribute_value(line.widget_id.as_deref()));

    if let Some(tiers) = widget_id.and_then(|id| config.widgets.get(id)) {
        let count = u32::try_from(lines.len()).unwrap_or(u32::MAX);
        return tiers.resolve(count);
    }

    lines
        .iter()
        .find_map(|line| attribute_value(line.discount.as_deref()))
        .and_then(|raw| parse_percent(&serde_json::Value::String(raw.to_string())).ok())
        .map_or(Decimal::ZERO, |p| p.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED))
}

fn attribute_value(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
