//! Identity of the merchant behind an admin request.

use serde::Serialize;

use bundlewise_core::ShopDomain;

/// Verified claims of a Shopify session token.
///
/// Built by the `RequireShopSession` extractor; handlers scope every query by
/// `shop`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopSession {
    /// Shop the embedded admin is open in (from the token's `dest`).
    pub shop: ShopDomain,
    /// Staff member ID (the token's `sub`).
    pub user_id: Option<String>,
    /// Shopify session ID (the token's `sid`).
    pub session_id: Option<String>,
}
