//! Shopify OAuth install flow.
//!
//! 1. `GET /auth?shop=` redirects to [`authorization_url`] with a random state.
//! 2. Shopify calls back with `code`, `shop`, `state`, `timestamp`, `hmac`.
//! 3. The callback checks [`verify_query_hmac`] and the state, then
//!    [`exchange_code`] trades the code for an offline token.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::Sha256;
use tracing::instrument;

use bundlewise_core::ShopDomain;

use super::AdminShopifyError;
use crate::config::ShopifyAppConfig;

type HmacSha256 = Hmac<Sha256>;

/// Offline token returned by the code exchange.
#[derive(Clone)]
pub struct OAuthToken {
    pub shop: ShopDomain,
    pub access_token: SecretString,
    pub scopes: Vec<String>,
    pub obtained_at: DateTime<Utc>,
}

impl std::fmt::Debug for OAuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthToken")
            .field("shop", &self.shop)
            .field("access_token", &"[REDACTED]")
            .field("scopes", &self.scopes)
            .field("obtained_at", &self.obtained_at)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct OAuthTokenResponse {
    access_token: String,
    scope: String,
}

/// Build the URL the merchant is redirected to for granting access.
#[must_use]
pub fn authorization_url(
    config: &ShopifyAppConfig,
    shop: &ShopDomain,
    redirect_uri: &str,
    state: &str,
) -> String {
    format!(
        "https://{shop}/admin/oauth/authorize?client_id={}&scope={}&redirect_uri={}&state={}",
        urlencoding::encode(&config.api_key),
        urlencoding::encode(&config.scopes.join(",")),
        urlencoding::encode(redirect_uri),
        urlencoding::encode(state)
    )
}

/// Verify the `hmac` parameter of a request signed by Shopify.
///
/// The message is every other parameter (except `signature`) sorted by key
/// and joined as `key=value&...`, signed with the app secret, hex encoded.
#[must_use]
pub fn verify_query_hmac(params: &[(String, String)], secret: &SecretString) -> bool {
    let Some(provided) = params
        .iter()
        .find(|(k, _)| k == "hmac")
        .map(|(_, v)| v.as_str())
    else {
        return false;
    };
    let Ok(provided) = hex::decode(provided) else {
        return false;
    };

    let mut pairs: Vec<&(String, String)> = params
        .iter()
        .filter(|(k, _)| k != "hmac" && k != "signature")
        .collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    let message = pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.expose_secret().as_bytes()) else {
        return false;
    };
    mac.update(message.as_bytes());

    // Constant-time comparison
    mac.verify_slice(&provided).is_ok()
}

/// Exchange an authorization code for an offline access token.
///
/// # Errors
///
/// Returns `AdminShopifyError::OAuth` if Shopify rejects the exchange.
/// Returns `AdminShopifyError::Http` if the HTTP request fails.
#[instrument(skip(http, config, code), fields(shop = %shop))]
pub async fn exchange_code(
    http: &reqwest::Client,
    config: &ShopifyAppConfig,
    shop: &ShopDomain,
    code: &str,
) -> Result<OAuthToken, AdminShopifyError> {
    let url = format!("https://{shop}/admin/oauth/access_token");

    let params = [
        ("client_id", config.api_key.as_str()),
        ("client_secret", config.api_secret.expose_secret()),
        ("code", code),
    ];

    let response = http.post(&url).form(&params).send().await?;

    if !response.status().is_success() {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        return Err(AdminShopifyError::OAuth(format!(
            "token exchange failed ({status}): {text}"
        )));
    }

    let token: OAuthTokenResponse = response.json().await?;

    Ok(OAuthToken {
        shop: shop.clone(),
        access_token: SecretString::from(token.access_token),
        scopes: token
            .scope
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        obtained_at: Utc::now(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sign(message: &str, secret: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(message.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn config() -> ShopifyAppConfig {
        ShopifyAppConfig {
            api_version: "2025-01".to_string(),
            api_key: "key123".to_string(),
            api_secret: SecretString::from("hush"),
            scopes: vec!["read_products".to_string(), "read_orders".to_string()],
        }
    }

    #[test]
    fn test_verify_query_hmac_sorted_params() {
        let secret = SecretString::from("hush");
        let signature = sign(
            "code=abc&shop=demo.myshopify.com&state=xyz&timestamp=1700000000",
            "hush",
        );
        let params = pairs(&[
            ("timestamp", "1700000000"),
            ("state", "xyz"),
            ("hmac", &signature),
            ("shop", "demo.myshopify.com"),
            ("code", "abc"),
        ]);
        assert!(verify_query_hmac(&params, &secret));
    }

    #[test]
    fn test_verify_query_hmac_rejects_tampering() {
        let secret = SecretString::from("hush");
        let signature = sign("code=abc&shop=demo.myshopify.com", "hush");
        let params = pairs(&[
            ("code", "abd"),
            ("shop", "demo.myshopify.com"),
            ("hmac", &signature),
        ]);
        assert!(!verify_query_hmac(&params, &secret));
    }

    #[test]
    fn test_verify_query_hmac_requires_hmac() {
        let secret = SecretString::from("hush");
        assert!(!verify_query_hmac(&pairs(&[("shop", "demo.myshopify.com")]), &secret));
        assert!(!verify_query_hmac(&pairs(&[("hmac", "not-hex")]), &secret));
    }

    #[test]
    fn test_authorization_url() {
        let shop = ShopDomain::parse("demo.myshopify.com").unwrap();
        let url = authorization_url(
            &config(),
            &shop,
            "https://app.example.com/auth/callback",
            "nonce",
        );
        assert!(url.starts_with("https://demo.myshopify.com/admin/oauth/authorize?"));
        assert!(url.contains("client_id=key123"));
        assert!(url.contains("scope=read_products%2Cread_orders"));
        assert!(url.contains("redirect_uri=https%3A%2F%2Fapp.example.com%2Fauth%2Fcallback"));
        assert!(url.contains("state=nonce"));
    }
}
