//! Locations and variant inventory.

use rust_decimal::Decimal;
use serde::Serialize;

use bundlewise_core::Gid;

use super::common::Money;

/// A stock location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: Gid,
    pub name: String,
    pub is_active: bool,
}

/// Units available at one location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationAvailability {
    pub location_id: Gid,
    pub available: i32,
}

/// A variant as fetched from the Admin API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopifyVariant {
    pub id: Gid,
    pub product_id: Gid,
    pub title: String,
    pub sku: Option<String>,
    pub price: Decimal,
    pub compare_at_price: Option<Decimal>,
    /// Shop currency, which `price` is expressed in.
    pub currency_code: String,
    pub available_for_sale: bool,
    pub inventory_item_id: Option<Gid>,
    pub tracked: bool,
    pub levels: Vec<LocationAvailability>,
}

/// Price of a variant in a market's pricing context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextualPrice {
    pub variant_id: Gid,
    pub price: Money,
    pub compare_at_price: Option<Money>,
}
