//! Storefront API: validation, CORS, and rate limiting.
//!
//! Every case here is answered before the database is reached.

#![allow(clippy::unwrap_used)]

use axum::{body::Body, http::Request, http::StatusCode};
use serde_json::json;

use bundlewise_integration_tests::{CLIENT_IP, app, get, post_json, send};

// =============================================================================
// CORS
// =============================================================================

#[tokio::test]
async fn test_cors_preflight() {
    let app = app();
    let request = Request::options("/api/cart/calculate-discount")
        .header("origin", "https://bundlewise-test.myshopify.com")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type")
        .header("x-forwarded-for", CLIENT_IP)
        .body(Body::empty())
        .unwrap();
    let resp = send(&app, request).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.header("access-control-allow-origin"), Some("*"));
    let methods = resp.header("access-control-allow-methods").unwrap();
    assert!(methods.contains("POST"), "{methods}");
    assert_eq!(resp.header("access-control-max-age"), Some("3600"));
}

#[tokio::test]
async fn test_cors_headers_on_errors() {
    let app = app();
    let request = Request::get("/api/markets")
        .header("origin", "https://shop.example.com")
        .header("x-forwarded-for", CLIENT_IP)
        .body(Body::empty())
        .unwrap();
    let resp = send(&app, request).await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.header("access-control-allow-origin"), Some("*"));
}

#[tokio::test]
async fn test_cors_not_applied_to_admin_routes() {
    let app = app();
    let request = Request::get("/app/widgets")
        .header("origin", "https://shop.example.com")
        .body(Body::empty())
        .unwrap();
    let resp = send(&app, request).await;

    assert!(resp.header("access-control-allow-origin").is_none());
}

// =============================================================================
// Calculate discount
// =============================================================================

#[tokio::test]
async fn test_calculate_discount_malformed_json() {
    let app = app();
    let resp = send(&app, post_json("/api/cart/calculate-discount", "{not json")).await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert!(resp.json()["error"].is_string());
}

#[tokio::test]
async fn test_calculate_discount_missing_widget_id() {
    let app = app();
    let body = json!({ "items": [{ "variantId": "1", "quantity": 1 }] }).to_string();
    let resp = send(&app, post_json("/api/cart/calculate-discount", body)).await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_calculate_discount_empty_items() {
    let app = app();
    let body = json!({ "widgetId": 1, "items": [] }).to_string();
    let resp = send(&app, post_json("/api/cart/calculate-discount", body)).await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.json()["error"], "Bad request: items must not be empty");
}

#[tokio::test]
async fn test_calculate_discount_zero_quantity() {
    let app = app();
    let body = json!({ "widgetId": "1", "items": [{ "variantId": "5", "quantity": 0 }] }).to_string();
    let resp = send(&app, post_json("/api/cart/calculate-discount", body)).await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_calculate_discount_wrong_resource() {
    let app = app();
    let body = json!({
        "widgetId": 1,
        "items": [{ "variantId": "gid://shopify/Product/5", "quantity": 1 }]
    })
    .to_string();
    let resp = send(&app, post_json("/api/cart/calculate-discount", body)).await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_calculate_discount_too_many_items() {
    let app = app();
    let items: Vec<_> = (1..=101)
        .map(|i| json!({ "variantId": i.to_string(), "quantity": 1 }))
        .collect();
    let body = json!({ "widgetId": 1, "items": items }).to_string();
    let resp = send(&app, post_json("/api/cart/calculate-discount", body)).await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_calculate_discount_wrong_method() {
    let app = app();
    let resp = send(&app, get("/api/cart/calculate-discount")).await;

    assert_eq!(resp.status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(resp.json()["error"], "Method not allowed");
}

// =============================================================================
// Widget, variants, markets, events
// =============================================================================

#[tokio::test]
async fn test_widget_requires_product_id() {
    let app = app();
    let resp = send(&app, get("/api/widget/12")).await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.json()["error"], "Bad request: productId is required");
}

#[tokio::test]
async fn test_widget_invalid_id() {
    let app = app();
    let resp = send(&app, get("/api/widget/abc?productId=1")).await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_widget_invalid_shop() {
    let app = app();
    let resp = send(&app, get("/api/widget/12?productId=1&shop=not%20a%20shop")).await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_variant_details_requires_shop() {
    let app = app();
    let resp = send(&app, get("/api/variant-details?variantIds=1,2")).await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.json()["error"], "Bad request: shop is required");
}

#[tokio::test]
async fn test_variant_details_requires_ids() {
    let app = app();
    let resp = send(
        &app,
        get("/api/variant-details?shop=bundlewise-test.myshopify.com"),
    )
    .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_markets_requires_shop() {
    let app = app();
    let resp = send(&app, get("/api/markets")).await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_widget_click_malformed_body() {
    let app = app();
    let body = json!({ "widgetId": "twelve" }).to_string();
    let resp = send(&app, post_json("/api/analytics/widget-click", body)).await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_widget_click_unknown_event_type() {
    let app = app();
    let body = json!({ "widgetId": 1, "eventType": "hover" }).to_string();
    let resp = send(&app, post_json("/api/analytics/widget-click", body)).await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Rate limiting
// =============================================================================

#[tokio::test]
async fn test_public_api_rate_limit() {
    let app = app();

    // Burst of 100, refilled one every 600 ms
    let mut limited = None;
    for attempt in 0..200 {
        let resp = send(&app, get("/api/markets")).await;
        if resp.status == StatusCode::TOO_MANY_REQUESTS {
            limited = Some(attempt);
            break;
        }
        assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    }
    let attempt = limited.expect("rate limit never reached");
    assert!(attempt >= 100, "limited after {attempt} requests");

    // Another client has its own budget
    let request = Request::get("/api/markets")
        .header("x-forwarded-for", "198.51.100.1")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, request).await.status, StatusCode::BAD_REQUEST);
}
