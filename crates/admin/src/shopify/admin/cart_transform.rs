//! Cart Transform Function configuration.
//!
//! The checkout function reads discount tiers per widget from a JSON
//! metafield on its `CartTransform` owner; this keeps that metafield in step
//! with the widgets stored in the database.

use tracing::instrument;

use bundlewise_core::cart_transform::FunctionConfig;

use super::{
    AdminClient, AdminShopifyError, missing_payload,
    queries::{GetCartTransforms, MetafieldsSet, get_cart_transforms, metafields_set},
};
use crate::shopify::{UserError, user_errors};

/// Metafield namespace owned by the app.
pub const CONFIG_NAMESPACE: &str = "$app:bundlewise";
/// Metafield key holding the serialized [`FunctionConfig`].
pub const CONFIG_KEY: &str = "config";

impl AdminClient {
    /// Write the function configuration to every cart transform of the shop.
    ///
    /// Returns the number of cart transforms updated. Transforms already holding
    /// this configuration are skipped, and a shop without an activated
    /// function has none.
    ///
    /// # Errors
    ///
    /// Returns `AdminShopifyError::UserError` if Shopify rejects the metafield.
    #[instrument(skip(self, config), fields(shop = %self.shop(), widgets = config.widgets.len()))]
    pub async fn sync_cart_transform_config(
        &self,
        config: &FunctionConfig,
    ) -> Result<usize, AdminShopifyError> {
        let response = self
            .execute::<GetCartTransforms>(get_cart_transforms::Variables)
            .await?;

        let value = serde_json::to_string(config)?;

        let metafields: Vec<_> = response
            .cart_transforms
            .nodes
            .into_iter()
            .filter(|t| t.metafield.as_ref().is_none_or(|m| m.value != value))
            .map(|t| metafields_set::MetafieldsSetInput {
                owner_id: t.id,
                namespace: Some(CONFIG_NAMESPACE.to_string()),
                key: CONFIG_KEY.to_string(),
                type_: Some("json".to_string()),
                value: value.clone(),
                compare_digest: None,
            })
            .collect();

        if metafields.is_empty() {
            tracing::debug!("Cart transform configuration already current");
            return Ok(0);
        }

        let count = metafields.len();
        let response = self
            .execute::<MetafieldsSet>(metafields_set::Variables { metafields })
            .await?;
        let payload = response
            .metafields_set
            .ok_or_else(|| missing_payload("metafieldsSet"))?;

        let errors: Vec<UserError> = payload
            .user_errors
            .into_iter()
            .map(|e| UserError {
                field: e.field,
                message: e.message,
            })
            .collect();
        if let Some(err) = user_errors(&errors) {
            return Err(err);
        }

        tracing::info!(count, "Updated cart transform configuration");
        Ok(count)
    }
}
