//! Product search for the widget product picker.

use tracing::instrument;

use super::{
    AdminClient, AdminShopifyError, conversions::convert_product_connection,
    queries::SearchProducts,
};
use crate::shopify::types::PickerProductConnection;

/// Largest page the picker may request.
pub const MAX_PAGE_SIZE: i64 = 50;

impl AdminClient {
    /// Search products by title (or any Shopify search syntax), sorted by title.
    ///
    /// # Arguments
    ///
    /// * `first` - Page size, clamped to `1..=50`
    /// * `after` - Cursor from the previous page
    /// * `query` - Optional Shopify search query
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(shop = %self.shop()))]
    pub async fn search_products(
        &self,
        first: i64,
        after: Option<String>,
        query: Option<String>,
    ) -> Result<PickerProductConnection, AdminShopifyError> {
        let variables = super::queries::search_products::Variables {
            first: first.clamp(1, MAX_PAGE_SIZE),
            after: after.filter(|a| !a.is_empty()),
            query: query.filter(|q| !q.trim().is_empty()),
        };

        let response = self.execute::<SearchProducts>(variables).await?;

        convert_product_connection(response.products)
    }
}
