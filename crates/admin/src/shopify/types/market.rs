//! Shopify Markets.

use serde::Serialize;

use bundlewise_core::Gid;

/// A market the shop sells into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Market {
    pub id: Gid,
    pub name: String,
    pub handle: String,
    pub enabled: bool,
    pub primary: bool,
    /// Base currency of the market.
    pub currency_code: Option<String>,
    /// First country region, used as the pricing context for the market.
    pub country_code: Option<String>,
}
