//! Liveness, request IDs, and routing basics.

#![allow(clippy::unwrap_used)]

use axum::{body::Body, http::Request, http::StatusCode};

use bundlewise_integration_tests::{app, send};

#[tokio::test]
async fn test_health_is_ok_without_database() {
    let app = app();
    let resp = send(&app, Request::get("/health").body(Body::empty()).unwrap()).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body.as_ref(), b"ok");
}

#[tokio::test]
async fn test_request_id_is_generated() {
    let app = app();
    let resp = send(&app, Request::get("/health").body(Body::empty()).unwrap()).await;

    let id = resp.header("x-request-id").unwrap();
    assert_eq!(id.len(), 36, "expected a UUID, got {id}");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = app();
    let request = Request::get("/health")
        .header("x-request-id", "edge-1234_abc")
        .body(Body::empty())
        .unwrap();
    let resp = send(&app, request).await;

    assert_eq!(resp.header("x-request-id"), Some("edge-1234_abc"));
}

#[tokio::test]
async fn test_unacceptable_request_id_is_replaced() {
    let app = app();
    let request = Request::get("/health")
        .header("x-request-id", "spaces are not allowed")
        .body(Body::empty())
        .unwrap();
    let resp = send(&app, request).await;

    assert_ne!(resp.header("x-request-id"), Some("spaces are not allowed"));
}

#[tokio::test]
async fn test_health_wrong_method() {
    let app = app();
    let resp = send(&app, Request::post("/health").body(Body::empty()).unwrap()).await;

    assert_eq!(resp.status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(resp.json()["error"], "Method not allowed");
}

#[tokio::test]
async fn test_unknown_route() {
    let app = app();
    let resp = send(&app, Request::get("/nope").body(Body::empty()).unwrap()).await;

    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}
