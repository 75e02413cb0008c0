//! Webhook subscription management.

use tracing::instrument;

use super::{
    AdminClient, AdminShopifyError, missing_payload,
    queries::{
        WebhookSubscriptionCreate,
        webhook_subscription_create::{self, WebhookSubscriptionTopic},
    },
};
use crate::shopify::{UserError, user_errors};

/// Topics the app subscribes to after install, with their callback paths.
pub const WEBHOOK_SUBSCRIPTIONS: &[(&str, &str)] = &[
    ("PRODUCTS_UPDATE", "/webhooks/products/update"),
    ("INVENTORY_LEVELS_UPDATE", "/webhooks/inventory_levels/update"),
    ("APP_UNINSTALLED", "/webhooks/app/uninstalled"),
];

fn webhook_topic(topic: &str) -> WebhookSubscriptionTopic {
    match topic {
        "PRODUCTS_UPDATE" => WebhookSubscriptionTopic::PRODUCTS_UPDATE,
        "PRODUCTS_DELETE" => WebhookSubscriptionTopic::PRODUCTS_DELETE,
        "INVENTORY_LEVELS_UPDATE" => WebhookSubscriptionTopic::INVENTORY_LEVELS_UPDATE,
        "APP_UNINSTALLED" => WebhookSubscriptionTopic::APP_UNINSTALLED,
        "BULK_OPERATIONS_FINISH" => WebhookSubscriptionTopic::BULK_OPERATIONS_FINISH,
        other => WebhookSubscriptionTopic::Other(other.to_string()),
    }
}

impl AdminClient {
    /// Subscribe to a webhook topic.
    ///
    /// Returns the subscription ID. An existing subscription for the same
    /// address is reported by Shopify as a user error.
    ///
    /// # Errors
    ///
    /// Returns `AdminShopifyError::UserError` if Shopify rejects the subscription.
    #[instrument(skip(self), fields(shop = %self.shop()))]
    pub async fn register_webhook(
        &self,
        topic: &str,
        callback_url: &str,
    ) -> Result<String, AdminShopifyError> {
        let variables = webhook_subscription_create::Variables {
            topic: webhook_topic(topic),
            callback_url: callback_url.to_string(),
        };

        let response = self.execute::<WebhookSubscriptionCreate>(variables).await?;
        let payload = response
            .webhook_subscription_create
            .ok_or_else(|| missing_payload("webhookSubscriptionCreate"))?;

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

        payload
            .webhook_subscription
            .map(|s| s.id)
            .ok_or_else(|| missing_payload("webhookSubscriptionCreate"))
    }

    /// Subscribe to every topic the app handles.
    ///
    /// Failures are logged per topic; returns how many subscriptions succeeded.
    pub async fn register_webhooks(&self, base_url: &str) -> usize {
        let mut registered = 0;
        for (topic, path) in WEBHOOK_SUBSCRIPTIONS {
            let callback_url = format!("{base_url}{path}");
            match self.register_webhook(topic, &callback_url).await {
                Ok(id) => {
                    tracing::info!(topic, subscription_id = %id, "Registered webhook");
                    registered += 1;
                }
                Err(e) => {
                    tracing::warn!(topic, error = %e, "Failed to register webhook");
                }
            }
        }
        registered
    }
}
