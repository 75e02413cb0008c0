//! Server-side bundle discount quotes.
//!
//! Uses the same tier resolution and rounding as the cart transform
//! function, so the price a shopper is shown is the price checkout charges.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bundlewise_core::{DiscountTiers, Gid, WidgetId, apply_percent};

/// Body of `POST /api/cart/calculate-discount`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountRequest {
    #[serde(deserialize_with = "crate::models::flexible_id")]
    pub widget_id: WidgetId,
    pub items: Vec<DiscountRequestItem>,
    /// Price the items in this market instead of the shop currency.
    #[serde(default)]
    pub market_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountRequestItem {
    pub variant_id: String,
    #[serde(default)]
    pub quantity: Option<u32>,
}

/// A selected variant with its unit price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedLine {
    pub variant_id: Gid,
    pub quantity: u32,
    pub unit_price: Decimal,
}

/// Per-item result; prices are per unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotedItem {
    pub variant_id: Gid,
    pub quantity: u32,
    pub original_price: Decimal,
    pub discounted_price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountQuote {
    pub discount_percent: Decimal,
    pub items: Vec<QuotedItem>,
    pub total_original: Decimal,
    pub total_discounted: Decimal,
    pub currency_code: String,
}

/// Price a selection against a widget's tiers.
///
/// The tier is chosen by the number of selected lines, not their quantities:
/// the checkout function counts cart lines of a bundle the same way.
#[must_use]
pub fn quote(tiers: &DiscountTiers, lines: &[PricedLine], currency_code: &str) -> DiscountQuote {
    let count = u32::try_from(lines.len()).unwrap_or(u32::MAX);
    let percent = tiers.resolve(count);

    let items: Vec<QuotedItem> = lines
        .iter()
        .map(|line| QuotedItem {
            variant_id: line.variant_id,
            quantity: line.quantity,
            original_price: line.unit_price,
            discounted_price: apply_percent(line.unit_price, percent),
        })
        .collect();

    let total_original = items
        .iter()
        .map(|i| i.original_price * Decimal::from(i.quantity))
        .sum();
    let total_discounted = items
        .iter()
        .map(|i| i.discounted_price * Decimal::from(i.quantity))
        .sum();

    DiscountQuote {
        discount_percent: percent,
        items,
        total_original,
        total_discounted,
        currency_code: currency_code.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bundlewise_core::ResourceKind;
    use serde_json::json;

    use super::*;

    fn tiers() -> DiscountTiers {
        DiscountTiers::from_json(&json!([{ "1": 0 }, { "2": 5 }, { "4": 10 }])).unwrap()
    }

    fn line(id: u64, quantity: u32, cents: i64) -> PricedLine {
        PricedLine {
            variant_id: Gid::new(ResourceKind::ProductVariant, id),
            quantity,
            unit_price: Decimal::new(cents, 2),
        }
    }

    #[test]
    fn test_quote_uses_line_count() {
        let quote = quote(
            &tiers(),
            &[line(1, 1, 2000), line(2, 3, 1000), line(3, 1, 999)],
            "USD",
        );
        assert_eq!(quote.discount_percent, Decimal::new(5, 0));
        assert_eq!(quote.total_original, Decimal::new(5999, 2));

        let [a, b, c] = quote.items.as_slice() else {
            panic!("expected three items");
        };
        assert_eq!(a.discounted_price, Decimal::new(1900, 2));
        assert_eq!(b.discounted_price, Decimal::new(950, 2));
        assert_eq!(c.discounted_price, Decimal::new(949, 2));
        // 19.00 + 3 * 9.50 + 9.49
        assert_eq!(quote.total_discounted, Decimal::new(5699, 2));
        assert_eq!(quote.currency_code, "USD");
    }

    #[test]
    fn test_single_item_gets_no_discount() {
        let quote = quote(&tiers(), &[line(1, 2, 1500)], "EUR");
        assert_eq!(quote.discount_percent, Decimal::ZERO);
        assert_eq!(quote.total_original, quote.total_discounted);
    }

    #[test]
    fn test_empty_selection() {
        let quote = quote(&DiscountTiers::default(), &[], "USD");
        assert_eq!(quote.discount_percent, Decimal::ZERO);
        assert!(quote.items.is_empty());
        assert_eq!(quote.total_original, Decimal::ZERO);
    }

    #[test]
    fn test_request_accepts_string_widget_id() {
        let request: DiscountRequest = serde_json::from_value(json!({
            "widgetId": "12",
            "items": [{ "variantId": "gid://shopify/ProductVariant/1" }, { "variantId": "2", "quantity": 3 }]
        }))
        .unwrap();
        assert_eq!(request.widget_id, WidgetId::new(12));
        let [first, second] = request.items.as_slice() else {
            panic!("expected two items");
        };
        assert_eq!(first.quantity, None);
        assert_eq!(second.quantity, Some(3));
    }

    #[test]
    fn test_quote_serializes_camel_case() {
        let value = serde_json::to_value(quote(&tiers(), &[line(1, 1, 1000), line(2, 1, 1000)], "USD")).unwrap();
        assert_eq!(value["discountPercent"], "5");
        assert_eq!(value["totalDiscounted"], "19.00");
        assert_eq!(value["items"][0]["variantId"], "gid://shopify/ProductVariant/1");
    }
}
