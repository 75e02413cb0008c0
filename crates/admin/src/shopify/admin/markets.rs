//! Shopify Markets.

use tracing::instrument;

use super::{AdminClient, AdminShopifyError, conversions::convert_markets, queries::GetMarkets};
use crate::shopify::types::Market;

impl AdminClient {
    /// List the shop's markets.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(shop = %self.shop()))]
    pub async fn get_markets(&self) -> Result<Vec<Market>, AdminShopifyError> {
        let variables = super::queries::get_markets::Variables { first: 50 };

        let response = self.execute::<GetMarkets>(variables).await?;

        convert_markets(response.markets)
    }
}
