//! Market type conversion functions.

use crate::shopify::AdminShopifyError;
use crate::shopify::types::Market;

use super::super::queries::get_markets::{GetMarketsMarkets, GetMarketsMarketsNodesRegionsNodes};
use super::{enum_name, gid};

pub fn convert_markets(markets: GetMarketsMarkets) -> Result<Vec<Market>, AdminShopifyError> {
    markets
        .nodes
        .into_iter()
        .map(|m| {
            Ok(Market {
                id: gid(&m.id)?,
                name: m.name,
                handle: m.handle,
                enabled: m.enabled,
                primary: m.primary,
                currency_code: Some(enum_name(&m.currency_settings.base_currency.currency_code)),
                country_code: m.regions.nodes.into_iter().find_map(|r| match r {
                    GetMarketsMarketsNodesRegionsNodes::MarketRegionCountry(country) => {
                        Some(enum_name(&country.code))
                    }
                }),
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
    fn test_convert_markets() {
        let markets: GetMarketsMarkets = serde_json::from_value(json!({
            "nodes": [{
                "id": "gid://shopify/Market/1",
                "name": "Canada",
                "handle": "ca",
                "enabled": true,
                "primary": false,
                "currencySettings": { "baseCurrency": { "currencyCode": "CAD" } },
                "regions": { "nodes": [{ "__typename": "MarketRegionCountry", "code": "CA" }] }
            }]
        }))
        .unwrap();

        let converted = convert_markets(markets).unwrap();
        let canada = converted.first().unwrap();
        assert_eq!(canada.currency_code.as_deref(), Some("CAD"));
        assert_eq!(canada.country_code.as_deref(), Some("CA"));
        assert!(!canada.primary);
    }
}
