//! Type conversions from GraphQL response shapes to domain types.

mod inventory;
mod markets;
mod products;

pub use inventory::{
    convert_contextual_prices, convert_locations, convert_variants, country_code,
};
pub use markets::convert_markets;
pub use products::convert_product_connection;

use bundlewise_core::Gid;

use crate::shopify::AdminShopifyError;

/// Parse an `ID` scalar into a [`Gid`].
pub fn gid(id: &str) -> Result<Gid, AdminShopifyError> {
    Ok(Gid::parse(id)?)
}

/// GraphQL name of a generated enum value.
///
/// Values the schema did not know about come through as `Other(name)`.
pub fn enum_name(value: &impl std::fmt::Debug) -> String {
    let name = format!("{value:?}");
    name.strip_prefix("Other(\"")
        .and_then(|rest| rest.strip_suffix("\")"))
        .map_or_else(|| name.clone(), str::to_string)
}
