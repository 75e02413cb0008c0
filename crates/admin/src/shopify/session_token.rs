//! App Bridge session tokens.
//!
//! The embedded admin UI sends `Authorization: Bearer <jwt>`. The token is
//! HS256 signed with the app secret, its `aud` is the app's API key, and
//! `dest` is the shop's admin URL.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

use bundlewise_core::ShopDomain;

use crate::models::ShopSession;

/// Errors that can occur when verifying a session token.
#[derive(Debug, Error)]
pub enum SessionTokenError {
    #[error("invalid session token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),

    #[error("session token has no valid shop: {0}")]
    InvalidShop(String),
}

/// Claims carried by a session token.
#[derive(Debug, Deserialize)]
pub struct SessionClaims {
    pub iss: String,
    pub dest: String,
    pub aud: String,
    pub sub: Option<String>,
    pub exp: i64,
    pub nbf: Option<i64>,
    pub sid: Option<String>,
}

/// Verify a session token and extract the shop it was issued for.
///
/// # Errors
///
/// Returns `SessionTokenError::Invalid` for a bad signature, audience, or expiry.
/// Returns `SessionTokenError::InvalidShop` if `dest` is not a shop domain.
pub fn verify(
    token: &str,
    api_key: &str,
    secret: &SecretString,
) -> Result<ShopSession, SessionTokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[api_key]);
    validation.set_required_spec_claims(&["exp", "aud"]);
    validation.validate_nbf = true;
    validation.leeway = 5;

    let data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.expose_secret().as_bytes()),
        &validation,
    )?;
    let claims = data.claims;

    let shop = ShopDomain::parse(&claims.dest)
        .map_err(|e| SessionTokenError::InvalidShop(format!("{}: {e}", claims.dest)))?;

    // `iss` is `https://{shop}/admin`
    if !claims.iss.starts_with(&format!("https://{shop}")) {
        return Err(SessionTokenError::InvalidShop(claims.iss));
    }

    Ok(ShopSession {
        shop,
        user_id: claims.sub,
        session_id: claims.sid,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::json;

    use super::*;

    fn token(claims: &serde_json::Value, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn claims(exp_offset: i64) -> serde_json::Value {
        let now = chrono::Utc::now().timestamp();
        json!({
            "iss": "https://demo.myshopify.com/admin",
            "dest": "https://demo.myshopify.com",
            "aud": "key123",
            "sub": "42",
            "exp": now + exp_offset,
            "nbf": now - 10,
            "iat": now - 10,
            "jti": "abc",
            "sid": "session-1"
        })
    }

    #[test]
    fn test_valid_token() {
        let secret = SecretString::from("hush");
        let session = verify(&token(&claims(60), "hush"), "key123", &secret).unwrap();
        assert_eq!(session.shop.as_str(), "demo.myshopify.com");
        assert_eq!(session.user_id.as_deref(), Some("42"));
        assert_eq!(session.session_id.as_deref(), Some("session-1"));
    }

    #[test]
    fn test_wrong_secret() {
        let secret = SecretString::from("hush");
        assert!(verify(&token(&claims(60), "other"), "key123", &secret).is_err());
    }

    #[test]
    fn test_wrong_audience() {
        let secret = SecretString::from("hush");
        assert!(verify(&token(&claims(60), "hush"), "another-app", &secret).is_err());
    }

    #[test]
    fn test_expired() {
        let secret = SecretString::from("hush");
        assert!(verify(&token(&claims(-120), "hush"), "key123", &secret).is_err());
    }

    #[test]
    fn test_issuer_must_match_shop() {
        let secret = SecretString::from("hush");
        let mut c = claims(60);
        c["iss"] = json!("https://evil.myshopify.com/admin");
        let err = verify(&token(&c, "hush"), "key123", &secret).unwrap_err();
        assert!(matches!(err, SessionTokenError::InvalidShop(_)));
    }
}
