//! Verified Shopify webhook extractor.

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::HeaderMap,
};

use bundlewise_core::ShopDomain;

use crate::error::{AppError, set_sentry_shop};
use crate::shopify::webhook::{HMAC_HEADER, SHOP_DOMAIN_HEADER, TOPIC_HEADER, verify_hmac};
use crate::state::AppState;

/// A webhook delivery whose HMAC matched the app secret.
///
/// Rejects with 401 when the signature is missing or wrong, and with 400 when
/// the shop header is not a shop domain.
#[derive(Debug)]
pub struct ShopifyWebhook {
    pub shop: ShopDomain,
    pub topic: Option<String>,
    pub body: Bytes,
}

impl ShopifyWebhook {
    /// Deserialize the payload.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if the body is not the expected JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, AppError> {
        serde_json::from_slice(&self.body)
            .map_err(|e| AppError::BadRequest(format!("invalid webhook payload: {e}")))
    }
}

impl FromRequest<AppState> for ShopifyWebhook {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let headers = req.headers().clone();
        let body = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        let signature = header(&headers, HMAC_HEADER)
            .ok_or_else(|| AppError::Unauthorized("missing webhook signature".to_string()))?;
        if !verify_hmac(&body, signature, &state.config().shopify.api_secret) {
            tracing::warn!("Webhook HMAC verification failed");
            return Err(AppError::Unauthorized("invalid webhook signature".to_string()));
        }

        let shop = header(&headers, SHOP_DOMAIN_HEADER)
            .ok_or_else(|| AppError::BadRequest("missing shop domain header".to_string()))
            .and_then(|raw| {
                ShopDomain::parse(raw).map_err(|e| AppError::BadRequest(e.to_string()))
            })?;
        set_sentry_shop(shop.as_str());

        Ok(Self {
            shop,
            topic: header(&headers, TOPIC_HEADER).map(String::from),
            body,
        })
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
