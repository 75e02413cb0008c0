//! GraphQL query definitions for Shopify Admin API.
//!
//! Uses `graphql_client` to generate type-safe Rust code from the documents
//! under `graphql/admin/queries/`, checked against `graphql/admin/schema.graphql`.

use graphql_client::GraphQLQuery;

// =============================================================================
// Custom scalar type aliases (used by graphql_client)
// =============================================================================

/// Decimal number, parsed from its string form.
type Decimal = rust_decimal::Decimal;

/// Money amount, parsed from its decimal string form.
type Money = rust_decimal::Decimal;

/// URL string.
#[allow(clippy::upper_case_acronyms)]
type URL = String;

/// Unsigned 64-bit integer as string.
type UnsignedInt64 = String;

// =============================================================================
// Product queries
// =============================================================================

#[derive(GraphQLQuery)]
#[graphql(
    schema_path = "graphql/admin/schema.graphql",
    query_path = "graphql/admin/queries/products.graphql",
    response_derives = "Debug, Clone"
)]
pub struct SearchProducts;

// =============================================================================
// Variant queries
// =============================================================================

#[derive(GraphQLQuery)]
#[graphql(
    schema_path = "graphql/admin/schema.graphql",
    query_path = "graphql/admin/queries/variants.graphql",
    response_derives = "Debug, Clone"
)]
pub struct GetVariants;

#[derive(GraphQLQuery)]
#[graphql(
    schema_path = "graphql/admin/schema.graphql",
    query_path = "graphql/admin/queries/variants.graphql",
    response_derives = "Debug, Clone"
)]
pub struct GetVariantContextualPrices;

// =============================================================================
// Market and location queries
// =============================================================================

#[derive(GraphQLQuery)]
#[graphql(
    schema_path = "graphql/admin/schema.graphql",
    query_path = "graphql/admin/queries/markets.graphql",
    response_derives = "Debug, Clone"
)]
pub struct GetMarkets;

#[derive(GraphQLQuery)]
#[graphql(
    schema_path = "graphql/admin/schema.graphql",
    query_path = "graphql/admin/queries/markets.graphql",
    response_derives = "Debug, Clone"
)]
pub struct GetLocations;

// =============================================================================
// Webhook mutations
// =============================================================================

#[derive(GraphQLQuery)]
#[graphql(
    schema_path = "graphql/admin/schema.graphql",
    query_path = "graphql/admin/queries/webhooks.graphql",
    response_derives = "Debug, Clone"
)]
pub struct WebhookSubscriptionCreate;

// =============================================================================
// Bulk operations
// =============================================================================

#[derive(GraphQLQuery)]
#[graphql(
    schema_path = "graphql/admin/schema.graphql",
    query_path = "graphql/admin/queries/bulk.graphql",
    response_derives = "Debug, Clone"
)]
pub struct BulkOperationRunQuery;

#[derive(GraphQLQuery)]
#[graphql(
    schema_path = "graphql/admin/schema.graphql",
    query_path = "graphql/admin/queries/bulk.graphql",
    response_derives = "Debug, Clone"
)]
pub struct GetBulkOperation;

// =============================================================================
// Cart transform configuration
// =============================================================================

#[derive(GraphQLQuery)]
#[graphql(
    schema_path = "graphql/admin/schema.graphql",
    query_path = "graphql/admin/queries/cart_transform.graphql",
    response_derives = "Debug, Clone"
)]
pub struct GetCartTransforms;

#[derive(GraphQLQuery)]
#[graphql(
    schema_path = "graphql/admin/schema.graphql",
    query_path = "graphql/admin/queries/cart_transform.graphql",
    response_derives = "Debug, Clone"
)]
pub struct MetafieldsSet;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_build_query_body() {
        let body = GetLocations::build_query(get_locations::Variables { first: 50 });
        assert_eq!(body.operation_name, "GetLocations");
        assert!(body.query.contains("locations(first: $first)"));

        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["variables"]["first"], 50);
        assert_eq!(value["operationName"], "GetLocations");
    }

    #[test]
    fn test_nodes_keep_typename() {
        let data: get_variants::ResponseData = serde_json::from_value(json!({
            "shop": { "currencyCode": "EUR" },
            "nodes": [
                null,
                { "__typename": "Product" },
                {
                    "__typename": "ProductVariant",
                    "id": "gid://shopify/ProductVariant/11",
                    "title": "Small",
                    "sku": null,
                    "price": "12.50",
                    "compareAtPrice": null,
                    "availableForSale": true,
                    "product": { "id": "gid://shopify/Product/1" },
                    "inventoryItem": {
                        "id": "gid://shopify/InventoryItem/21",
                        "tracked": true,
                        "inventoryLevels": { "nodes": [] }
                    }
                }
            ]
        }))
        .unwrap();

        assert!(matches!(data.shop.currency_code, get_variants::CurrencyCode::EUR));
        let [missing, product, variant] = data.nodes.as_slice() else {
            panic!("expected three nodes");
        };
        assert!(missing.is_none());
        assert!(matches!(product, Some(get_variants::GetVariantsNodes::Product)));
        let Some(get_variants::GetVariantsNodes::ProductVariant(variant)) = variant else {
            panic!("expected a variant");
        };
        assert_eq!(variant.price, "12.50".parse().unwrap());
    }

    #[test]
    fn test_metafield_input_type_key() {
        let input = metafields_set::MetafieldsSetInput {
            owner_id: "gid://shopify/CartTransform/1".to_string(),
            namespace: Some("$app:bundlewise".to_string()),
            key: "config".to_string(),
            type_: Some("json".to_string()),
            value: "{}".to_string(),
            compare_digest: None,
        };
        let value = serde_json::to_value(&input).unwrap();
        assert_eq!(value["type"], "json");
        assert_eq!(value["ownerId"], "gid://shopify/CartTransform/1");
    }

    #[test]
    fn test_country_variable_serializes_as_code() {
        let variables = get_variant_contextual_prices::Variables {
            ids: vec!["gid://shopify/ProductVariant/1".to_string()],
            country: get_variant_contextual_prices::CountryCode::CA,
        };
        let value = serde_json::to_value(&variables).unwrap();
        assert_eq!(value["country"], "CA");
    }
}
