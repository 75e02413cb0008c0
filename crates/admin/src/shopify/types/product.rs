//! Product domain types for the widget product picker.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bundlewise_core::Gid;

use super::common::PageInfo;

/// Product status in the admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductStatus {
    /// Product is visible on the storefront.
    Active,
    /// Product is not visible (work in progress).
    Draft,
    /// Product is hidden/archived.
    Archived,
    /// Product is unlisted (not shown in search/collections but accessible via URL).
    Unlisted,
}

/// A product variant offered in the picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PickerVariant {
    pub id: Gid,
    pub title: String,
    pub sku: Option<String>,
    pub price: Decimal,
    pub compare_at_price: Option<Decimal>,
    pub available_for_sale: bool,
}

/// A product offered in the picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PickerProduct {
    pub id: Gid,
    pub title: String,
    pub handle: String,
    pub status: ProductStatus,
    pub image_url: Option<String>,
    pub image_alt: Option<String>,
    pub variants: Vec<PickerVariant>,
}

/// Page of picker products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PickerProductConnection {
    pub products: Vec<PickerProduct>,
    pub page_info: PageInfo,
}
