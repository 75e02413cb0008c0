//! Authentication extractors for the embedded admin API.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::Span;

use crate::error::{AppError, set_sentry_shop};
use crate::models::ShopSession;
use crate::shopify::session_token;
use crate::state::AppState;

/// Extractor that requires a valid App Bridge session token.
///
/// Reads `Authorization: Bearer <jwt>`, verifies it with the app secret, and
/// yields the shop the admin is open in. Rejects with 401 otherwise.
///
/// # Example
///
/// ```rust,ignore
/// async fn list_widgets(
///     State(state): State<AppState>,
///     RequireShopSession(session): RequireShopSession,
/// ) -> Result<Json<Vec<WidgetSummary>>, AppError> {
///     let widgets = WidgetRepository::new(state.pool()).list(&session.shop).await?;
///     Ok(Json(widgets))
/// }
/// ```
pub struct RequireShopSession(pub ShopSession);

impl FromRequestParts<AppState> for RequireShopSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::Unauthorized("missing session token".to_string()))?;

        let shopify = &state.config().shopify;
        let session = session_token::verify(token, &shopify.api_key, &shopify.api_secret)
            .map_err(|e| {
                tracing::debug!(error = %e, "Rejected session token");
                AppError::Unauthorized("invalid session token".to_string())
            })?;

        Span::current().record("shop", session.shop.as_str());
        set_sentry_shop(session.shop.as_str());

        Ok(Self(session))
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer ").or_else(|| v.strip_prefix("bearer ")))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
