//! Webhook signature verification.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

/// Header carrying the base64 HMAC of the raw body.
pub const HMAC_HEADER: &str = "x-shopify-hmac-sha256";
/// Header carrying the sending shop.
pub const SHOP_DOMAIN_HEADER: &str = "x-shopify-shop-domain";
/// Header carrying the webhook topic.
pub const TOPIC_HEADER: &str = "x-shopify-topic";

/// Verify `X-Shopify-Hmac-Sha256` against the raw request body.
#[must_use]
pub fn verify_hmac(body: &[u8], header: &str, secret: &SecretString) -> bool {
    let Ok(provided) = STANDARD.decode(header.trim()) else {
        return false;
    };
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(secret.expose_secret().as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&provided).is_ok()
}
