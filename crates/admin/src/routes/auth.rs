//! Shopify OAuth install flow.
//!
//! - Install: validates the shop and redirects to Shopify's grant screen
//! - Callback: checks the HMAC and state, exchanges the code for an offline
//!   token, stores it, and registers webhooks

use axum::{
    extract::{Query, State},
    response::Redirect,
};
use serde::Deserialize;
use uuid::Uuid;

use bundlewise_core::ShopDomain;

use crate::db::{ShopifySession, ShopifySessionRepository};
use crate::error::AppError;
use crate::services::function_config;
use crate::shopify::oauth;
use crate::state::AppState;

const CALLBACK_PATH: &str = "/auth/callback";

#[derive(Debug, Deserialize)]
pub struct InstallQuery {
    pub shop: Option<String>,
}

/// Start the install flow.
///
/// # Route
///
/// `GET /auth?shop=example.myshopify.com`
///
/// # Errors
///
/// Returns 400 if `shop` is missing or not a shop domain.
pub async fn install(
    State(state): State<AppState>,
    Query(query): Query<InstallQuery>,
) -> Result<Redirect, AppError> {
    let shop = parse_shop(query.shop.as_deref())?;
    let nonce = Uuid::new_v4().simple().to_string();
    state.remember_oauth_state(nonce.clone(), shop.clone()).await;

    let config = state.config();
    let url = oauth::authorization_url(
        &config.shopify,
        &shop,
        &config.url_for(CALLBACK_PATH),
        &nonce,
    );

    tracing::info!(shop = %shop, "Redirecting to Shopify for install");
    Ok(Redirect::to(&url))
}

/// Finish the install flow.
///
/// # Route
///
/// `GET /auth/callback?code=&hmac=&shop=&state=&timestamp=`
///
/// # Errors
///
/// Returns 401 on a bad HMAC or an unknown/mismatched state, 502 if the token
/// exchange fails.
pub async fn callback(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Redirect, AppError> {
    let config = state.config();
    if !oauth::verify_query_hmac(&params, &config.shopify.api_secret) {
        tracing::warn!("OAuth callback HMAC verification failed");
        return Err(AppError::Unauthorized("invalid hmac".to_string()));
    }

    let param = |name: &str| {
        params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    };

    let shop = parse_shop(param("shop"))?;
    let code = param("code")
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::BadRequest("missing code".to_string()))?;
    let nonce = param("state").unwrap_or_default();

    // One-time use: the nonce is consumed even when it does not match.
    match state.take_oauth_state(nonce).await {
        Some(expected) if expected == shop => {}
        _ => {
            tracing::warn!(shop = %shop, "OAuth state mismatch");
            return Err(AppError::Unauthorized("invalid state".to_string()));
        }
    }

    let token = oauth::exchange_code(state.http(), &config.shopify, &shop, code).await?;
    ShopifySessionRepository::new(state.pool())
        .save(&ShopifySession {
            shop: token.shop,
            access_token: token.access_token,
            scopes: token.scopes,
            obtained_at: token.obtained_at,
        })
        .await?;
    state.forget_shop(&shop).await;
    tracing::info!(shop = %shop, "App installed");

    let client = state.shopify(&shop).await?;
    let registered = client.register_webhooks(&config.base_url).await;
    tracing::info!(shop = %shop, registered, "Webhooks registered");

    function_config::spawn_sync(state.clone(), shop.clone());

    Ok(Redirect::to(&format!(
        "https://{shop}/admin/apps/{}",
        config.shopify.api_key
    )))
}

fn parse_shop(raw: Option<&str>) -> Result<ShopDomain, AppError> {
    let raw = raw.ok_or_else(|| AppError::BadRequest("missing shop".to_string()))?;
    ShopDomain::parse(raw).map_err(|e| AppError::BadRequest(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shop() {
        assert_eq!(
            parse_shop(Some("demo.myshopify.com")).unwrap().as_str(),
            "demo.myshopify.com"
        );
        assert!(matches!(parse_shop(None), Err(AppError::BadRequest(_))));
        assert!(matches!(
            parse_shop(Some("evil.example.com")),
            Err(AppError::BadRequest(_))
        ));
    }
}
