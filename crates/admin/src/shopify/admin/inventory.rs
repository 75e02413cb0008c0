//! Locations, variants, and per-market variant pricing.

use tracing::instrument;

use bundlewise_core::Gid;

use super::{
    AdminClient, AdminShopifyError,
    conversions::{convert_contextual_prices, convert_locations, convert_variants, country_code},
    queries::{GetLocations, GetVariantContextualPrices, GetVariants},
};
use crate::shopify::types::{ContextualPrice, Location, ShopifyVariant};

/// Maximum IDs accepted by a single `nodes(ids:)` lookup.
const NODES_BATCH: usize = 250;

impl AdminClient {
    /// Get all locations.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(shop = %self.shop()))]
    pub async fn get_locations(&self) -> Result<Vec<Location>, AdminShopifyError> {
        let variables = super::queries::get_locations::Variables { first: 100 };

        let response = self.execute::<GetLocations>(variables).await?;

        convert_locations(response.locations)
    }

    /// Fetch variants with inventory levels. IDs that are not variants are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, ids), fields(shop = %self.shop(), count = ids.len()))]
    pub async fn get_variants(&self, ids: &[Gid]) -> Result<Vec<ShopifyVariant>, AdminShopifyError> {
        let mut variants = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(NODES_BATCH) {
            let variables = super::queries::get_variants::Variables {
                ids: chunk.iter().map(ToString::to_string).collect(),
            };
            let response = self.execute::<GetVariants>(variables).await?;
            variants.extend(convert_variants(response)?);
        }
        Ok(variants)
    }

    /// Fetch variant prices in the pricing context of a country.
    ///
    /// # Arguments
    ///
    /// * `ids` - Variant IDs
    /// * `country` - ISO 3166 country code of the market's region
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, ids), fields(shop = %self.shop(), count = ids.len()))]
    pub async fn get_contextual_prices(
        &self,
        ids: &[Gid],
        country: &str,
    ) -> Result<Vec<ContextualPrice>, AdminShopifyError> {
        let mut prices = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(NODES_BATCH) {
            let variables = super::queries::get_variant_contextual_prices::Variables {
                ids: chunk.iter().map(ToString::to_string).collect(),
                country: country_code(country),
            };
            let response = self.execute::<GetVariantContextualPrices>(variables).await?;
            prices.extend(convert_contextual_prices(response)?);
        }
        Ok(prices)
    }
}
