//! Router assembly.
//!
//! Kept separate from `main` so integration tests can drive the exact router
//! the server runs through `tower::ServiceExt::oneshot`.

use std::time::Duration;

use axum::{
    Router,
    extract::State,
    http::{HeaderName, Method, Request, Response, StatusCode, header},
    middleware::from_fn,
    routing::get,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::{DefaultOnResponse, OnResponse, TraceLayer},
};
use tracing::Span;

use crate::error::method_not_allowed;
use crate::middleware::{auth_rate_limiter, public_api_rate_limiter, request_id_middleware};
use crate::middleware::request_id::REQUEST_ID_HEADER;
use crate::routes;
use crate::state::AppState;

/// Build the application router with all middleware.
pub fn create_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config().cors_allowed_origins);

    let public_api = routes::api::router()
        .method_not_allowed_fallback(method_not_allowed)
        .layer(public_api_rate_limiter())
        .layer(cors);

    let install = routes::auth_routes()
        .method_not_allowed_fallback(method_not_allowed)
        .layer(auth_rate_limiter());

    let admin = routes::admin_routes().method_not_allowed_fallback(method_not_allowed);
    let webhooks = routes::webhook_routes().method_not_allowed_fallback(method_not_allowed);

    let health = Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .method_not_allowed_fallback(method_not_allowed);

    Router::new()
        .merge(health)
        .nest("/api", public_api)
        .nest("/app", admin)
        .nest("/auth", install)
        .nest("/webhooks", webhooks)
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri().path(),
                        request_id = tracing::field::Empty,
                        shop = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &Response<_>, latency: Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// CORS for the storefront API. An empty origin list allows any origin.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins.iter().filter_map(|o| o.parse().ok()))
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
        .max_age(Duration::from_secs(3600))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
