//! Variant and location conversion functions.

use crate::shopify::AdminShopifyError;
use crate::shopify::types::{
    ContextualPrice, Location, LocationAvailability, Money, ShopifyVariant,
};

use super::super::queries::{
    get_locations::GetLocationsLocations,
    get_variant_contextual_prices::{
        self, GetVariantContextualPricesNodes,
        GetVariantContextualPricesNodesOnProductVariantContextualPricingCompareAtPrice as CompareAtPrice,
        GetVariantContextualPricesNodesOnProductVariantContextualPricingPrice as Price,
    },
    get_variants::{self, GetVariantsNodes, GetVariantsNodesOnProductVariant},
};
use super::{enum_name, gid};

/// Name of the inventory quantity counted as sellable stock.
const AVAILABLE: &str = "available";

// =============================================================================
// GetVariants conversions
// =============================================================================

/// Flatten variant nodes, dropping IDs that did not resolve to a variant.
pub fn convert_variants(
    response: get_variants::ResponseData,
) -> Result<Vec<ShopifyVariant>, AdminShopifyError> {
    let currency_code = enum_name(&response.shop.currency_code);

    response
        .nodes
        .into_iter()
        .filter_map(|node| match node {
            Some(GetVariantsNodes::ProductVariant(variant)) => {
                Some(convert_variant(variant, &currency_code))
            }
            _ => None,
        })
        .collect()
}

fn convert_variant(
    variant: GetVariantsNodesOnProductVariant,
    currency_code: &str,
) -> Result<ShopifyVariant, AdminShopifyError> {
    let item = variant.inventory_item;

    let levels = item
        .inventory_levels
        .nodes
        .into_iter()
        .map(|level| {
            Ok(LocationAvailability {
                location_id: gid(&level.location.id)?,
                available: level
                    .quantities
                    .iter()
                    .find(|q| q.name == AVAILABLE)
                    .map_or(0, |q| i32::try_from(q.quantity).unwrap_or(i32::MAX)),
            })
        })
        .collect::<Result<_, AdminShopifyError>>()?;

    Ok(ShopifyVariant {
        id: gid(&variant.id)?,
        product_id: gid(&variant.product.id)?,
        title: variant.title,
        sku: variant.sku.filter(|s| !s.is_empty()),
        price: variant.price,
        compare_at_price: variant.compare_at_price,
        currency_code: currency_code.to_string(),
        available_for_sale: variant.available_for_sale,
        inventory_item_id: Some(gid(&item.id)?),
        tracked: item.tracked,
        levels,
    })
}

// =============================================================================
// GetVariantContextualPrices conversions
// =============================================================================

/// Country variable of a contextual pricing query.
pub fn country_code(code: &str) -> get_variant_contextual_prices::CountryCode {
    get_variant_contextual_prices::CountryCode::Other(code.to_ascii_uppercase())
}

pub fn convert_contextual_prices(
    response: get_variant_contextual_prices::ResponseData,
) -> Result<Vec<ContextualPrice>, AdminShopifyError> {
    response
        .nodes
        .into_iter()
        .filter_map(|node| match node {
            Some(GetVariantContextualPricesNodes::ProductVariant(v)) => Some(v),
            _ => None,
        })
        .map(|v| {
            Ok(ContextualPrice {
                variant_id: gid(&v.id)?,
                price: price(v.contextual_pricing.price),
                compare_at_price: v.contextual_pricing.compare_at_price.map(compare_at_price),
            })
        })
        .collect()
}

fn price(money: Price) -> Money {
    Money {
        amount: money.amount,
        currency_code: enum_name(&money.currency_code),
    }
}

fn compare_at_price(money: CompareAtPrice) -> Money {
    Money {
        amount: money.amount,
        currency_code: enum_name(&money.currency_code),
    }
}

// =============================================================================
// GetLocations conversions
// =============================================================================

pub fn convert_locations(locations: GetLocationsLocations) -> Result<Vec<Location>, AdminShopifyError> {
    locations
        .nodes
        .into_iter()
        .map(|l| {
            Ok(Location {
                id: gid(&l.id)?,
                name: l.name,
                is_active: l.is_active,
            })
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_convert_variants_reads_available_quantity() {
        let response: get_variants::ResponseData = serde_json::from_value(json!({
            "shop": { "currencyCode": "USD" },
            "nodes": [{
                "__typename": "ProductVariant",
                "id": "gid://shopify/ProductVariant/11",
                "title": "Blue",
                "sku": "TEE-BLUE",
                "price": "18.00",
                "compareAtPrice": null,
                "availableForSale": true,
                "product": { "id": "gid://shopify/Product/1" },
                "inventoryItem": {
                    "id": "gid://shopify/InventoryItem/21",
                    "tracked": true,
                    "inventoryLevels": { "nodes": [
                        {
                            "location": { "id": "gid://shopify/Location/5" },
                            "quantities": [{ "name": "available", "quantity": 7 }]
                        },
                        {
                            "location": { "id": "gid://shopify/Location/6" },
                            "quantities": []
                        }
                    ]}
                }
            }, null, { "__typename": "Product" }]
        }))
        .unwrap();

        let variants = convert_variants(response).unwrap();
        assert_eq!(variants.len(), 1);
        let variant = variants.first().unwrap();
        assert_eq!(variant.currency_code, "USD");
        assert_eq!(variant.sku.as_deref(), Some("TEE-BLUE"));
        assert!(variant.tracked);
        let available: Vec<i32> = variant.levels.iter().map(|l| l.available).collect();
        assert_eq!(available, vec![7, 0]);
    }

    #[test]
    fn test_convert_contextual_prices() {
        let response: get_variant_contextual_prices::ResponseData =
            serde_json::from_value(json!({
                "nodes": [{
                    "__typename": "ProductVariant",
                    "id": "gid://shopify/ProductVariant/11",
                    "contextualPricing": {
                        "price": { "amount": "24.00", "currencyCode": "CAD" },
                        "compareAtPrice": null
                    }
                }]
            }))
            .unwrap();

        let prices = convert_contextual_prices(response).unwrap();
        let price = prices.first().unwrap();
        assert_eq!(price.price.currency_code, "CAD");
        assert_eq!(price.price.amount, "24.00".parse().unwrap());
        assert!(price.compare_at_price.is_none());
    }

    #[test]
    fn test_country_code_is_uppercased() {
        let value = serde_json::to_value(country_code("de")).unwrap();
        assert_eq!(value, "DE");
    }
}
