//! Embedded admin authentication and the OAuth install flow.

#![allow(clippy::unwrap_used)]

use axum::{body::Body, http::Request, http::StatusCode};
use serde_json::json;

use bundlewise_integration_tests::{
    API_KEY, SHOP, admin_request, app, get, send, session_token_with, signed_query,
};

// =============================================================================
// Session tokens
// =============================================================================

#[tokio::test]
async fn test_admin_requires_session_token() {
    let app = app();
    let resp = send(&app, Request::get("/app/widgets").body(Body::empty()).unwrap()).await;

    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.json()["error"], "Unauthorized: missing session token");
}

#[tokio::test]
async fn test_admin_rejects_garbage_token() {
    let app = app();
    let request = Request::get("/app/analytics")
        .header("authorization", "Bearer not.a.jwt")
        .body(Body::empty())
        .unwrap();
    let resp = send(&app, request).await;

    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.json()["error"], "Unauthorized: invalid session token");
}

#[tokio::test]
async fn test_admin_rejects_token_signed_with_other_secret() {
    let app = app();
    let token = session_token_with(SHOP, "a-different-app-secret-entirely");
    let request = Request::get("/app/locations")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let resp = send(&app, request).await;

    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_validates_widget_before_saving() {
    let app = app();
    let body = json!({ "name": "  ", "products": [] });
    let resp = send(&app, admin_request("POST", "/app/widgets", Some(&body))).await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert!(resp.json()["error"].as_str().unwrap().starts_with("Invalid widget"));
}

#[tokio::test]
async fn test_admin_rejects_invalid_discount_tiers() {
    let app = app();
    let body = json!({
        "name": "Summer bundle",
        "settings": { "discounts": [{ "2": 150 }] },
        "products": [{ "productId": "1", "children": [{ "productId": "2" }] }]
    });
    let resp = send(&app, admin_request("POST", "/app/widgets", Some(&body))).await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_invalid_widget_id() {
    let app = app();
    let resp = send(&app, admin_request("GET", "/app/widgets/abc", None)).await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_analytics_invalid_since() {
    let app = app();
    let resp = send(&app, admin_request("GET", "/app/analytics?since=yesterday", None)).await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_wrong_method() {
    let app = app();
    let resp = send(&app, admin_request("PATCH", "/app/widgets", None)).await;

    assert_eq!(resp.status, StatusCode::METHOD_NOT_ALLOWED);
}

// =============================================================================
// OAuth
// =============================================================================

#[tokio::test]
async fn test_install_redirects_to_shopify() {
    let app = app();
    let resp = send(&app, get(&format!("/auth?shop={SHOP}"))).await;

    assert!(resp.status.is_redirection());
    let location = resp.header("location").unwrap();
    assert!(
        location.starts_with(&format!("https://{SHOP}/admin/oauth/authorize?")),
        "{location}"
    );
    assert!(location.contains(&format!("client_id={API_KEY}")));
    assert!(location.contains("scope=read_products%2Cread_orders"));
    assert!(location.contains(
        "redirect_uri=https%3A%2F%2Fbundles.example.dev%2Fauth%2Fcallback"
    ));
}

#[tokio::test]
async fn test_install_requires_shop() {
    let app = app();

    let resp = send(&app, get("/auth")).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    let resp = send(&app, get("/auth?shop=example.com")).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_callback_rejects_bad_hmac() {
    let app = app();
    let uri = format!("/auth/callback?code=abc&shop={SHOP}&state=n1&timestamp=1&hmac=00ff");
    let resp = send(&app, get(&uri)).await;

    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.json()["error"], "Unauthorized: invalid hmac");
}

#[tokio::test]
async fn test_callback_rejects_unknown_state() {
    let app = app();
    let query = signed_query(&[
        ("code", "abc"),
        ("shop", SHOP),
        ("state", "never-issued"),
        ("timestamp", "1700000000"),
    ]);
    let resp = send(&app, get(&format!("/auth/callback?{query}"))).await;

    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.json()["error"], "Unauthorized: invalid state");
}

#[tokio::test]
async fn test_callback_rejects_state_for_other_shop() {
    let app = app();

    let resp = send(&app, get(&format!("/auth?shop={SHOP}"))).await;
    let location = resp.header("location").unwrap();
    let nonce = location
        .split("state=")
        .nth(1)
        .expect("authorize URL carries a state")
        .to_string();

    let query = signed_query(&[
        ("code", "abc"),
        ("shop", "someone-else.myshopify.com"),
        ("state", &nonce),
        ("timestamp", "1700000000"),
    ]);
    let resp = send(&app, get(&format!("/auth/callback?{query}"))).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

    // The nonce was consumed by the failed attempt
    let query = signed_query(&[
        ("code", "abc"),
        ("shop", SHOP),
        ("state", &nonce),
        ("timestamp", "1700000000"),
    ]);
    let resp = send(&app, get(&format!("/auth/callback?{query}"))).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_rate_limit() {
    let app = app();

    // Burst of 10, refilled one every 6 s
    let mut statuses = Vec::new();
    for _ in 0..11 {
        statuses.push(send(&app, get("/auth")).await.status);
    }

    assert!(statuses.iter().take(10).all(|s| *s == StatusCode::BAD_REQUEST));
    assert_eq!(statuses.last(), Some(&StatusCode::TOO_MANY_REQUESTS));

    let request = Request::get("/auth")
        .header("x-forwarded-for", "198.51.100.2")
        .body(Body::empty())
        .unwrap();
    assert_ne!(send(&app, request).await.status, StatusCode::TOO_MANY_REQUESTS);
}
