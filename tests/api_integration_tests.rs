//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycle for each endpoint against a cache
//! rooted in a temporary directory.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, Response, StatusCode},
    Router,
};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;
use url_cache::{api::create_router, AppState, CacheConfig, UrlCache};

// == Helper Functions ==

fn create_test_app(dir: &TempDir) -> Router {
    let cache = UrlCache::new(CacheConfig {
        cache_path: dir.path().to_path_buf(),
        ..CacheConfig::default()
    })
    .unwrap();
    create_router(AppState::new(Arc::new(cache)))
}

fn encode(url: &str) -> String {
    urlencoding::encode(url).into_owned()
}

async fn send(app: &Router, method: &str, uri: &str, body: Body) -> Response<Body> {
    app.clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(body)
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn send_json(app: &Router, uri: &str, json: Value) -> Response<Body> {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn put(app: &Router, url: &str, payload: &'static [u8]) -> Response<Body> {
    send(
        app,
        "PUT",
        &format!("/data?url={}", encode(url)),
        Body::from(payload),
    )
    .await
}

async fn get(app: &Router, url: &str) -> Response<Body> {
    send(app, "GET", &format!("/data?url={}", encode(url)), Body::empty()).await
}

async fn body_bytes(body: Body) -> Vec<u8> {
    axum::body::to_bytes(body, usize::MAX).await.unwrap().to_vec()
}

async fn body_to_json(body: Body) -> Value {
    serde_json::from_slice(&body_bytes(body).await).unwrap()
}

// == Data Endpoint Tests ==

#[tokio::test]
async fn test_put_then_get_returns_bytes_and_timestamp() {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(&dir);
    let url = "http://example.com/a.png";

    let response = put(&app, url, b"image-bytes").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["url"], url);
    assert_eq!(json["key"].as_str().unwrap().len(), 64);

    let response = get(&app, url).await;
    assert_eq!(response.status(), StatusCode::OK);
    let timestamp = response
        .headers()
        .get("x-cache-timestamp")
        .expect("timestamp header")
        .to_str()
        .unwrap()
        .to_string();
    assert!(chrono::DateTime::parse_from_rfc3339(&timestamp).is_ok());
    assert_eq!(body_bytes(response.into_body()).await, b"image-bytes");
}

#[tokio::test]
async fn test_put_overwrites_previous_bytes() {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(&dir);
    let url = "http://example.com/b";

    put(&app, url, b"first").await;
    put(&app, url, b"second").await;

    let response = get(&app, url).await;
    assert_eq!(body_bytes(response.into_body()).await, b"second");
}

#[tokio::test]
async fn test_get_missing_url_is_not_found() {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(&dir);

    let response = get(&app, "http://example.com/missing").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = body_to_json(response.into_body()).await;
    assert!(json["error"].as_str().unwrap().contains("missing"));
}

#[tokio::test]
async fn test_get_without_url_is_bad_request() {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(&dir);

    let response = send(&app, "GET", "/data?url=", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_negative_expires_is_bad_request() {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(&dir);
    let url = "http://example.com/c";
    put(&app, url, b"x").await;

    let response = send(
        &app,
        "GET",
        &format!("/data?url={}&expires=-5", encode(url)),
        Body::empty(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_from_disk_removes_entry() {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(&dir);
    let url = "http://example.com/d";
    put(&app, url, b"bytes").await;

    let response = send(
        &app,
        "DELETE",
        &format!("/data?url={}&from_disk=true", encode(url)),
        Body::empty(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(get(&app, url).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_memory_only_keeps_disk_entry() {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(&dir);
    let url = "http://example.com/e";
    put(&app, url, b"bytes").await;

    let response = send(
        &app,
        "DELETE",
        &format!("/data?url={}", encode(url)),
        Body::empty(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(get(&app, url).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_url_with_query_string_round_trips() {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(&dir);
    let url = "http://example.com/img?size=large&fmt=png#frag";

    assert_eq!(put(&app, url, b"q").await.status(), StatusCode::OK);

    let response = get(&app, url).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response.into_body()).await, b"q");
    assert_eq!(
        get(&app, "http://example.com/img?size=large").await.status(),
        StatusCode::NOT_FOUND
    );
}

// == Exists Endpoint Tests ==

#[tokio::test]
async fn test_exists_reflects_stored_state() {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(&dir);
    let url = "http://example.com/f";
    let uri = format!("/exists?url={}", encode(url));

    let json = body_to_json(send(&app, "GET", &uri, Body::empty()).await.into_body()).await;
    assert_eq!(json["cached"], false);

    put(&app, url, b"bytes").await;

    let json = body_to_json(send(&app, "GET", &uri, Body::empty()).await.into_body()).await;
    assert_eq!(json["cached"], true);
    assert_eq!(json["url"], url);
}

// == Temporary and Move Endpoint Tests ==

#[tokio::test]
async fn test_temporary_then_move_to_permanent_url() {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(&dir);

    let response = send(&app, "POST", "/temporary", Body::from("pending-upload")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    let temp_url = json["url"].as_str().unwrap().to_string();
    assert!(temp_url.starts_with("temp:"));

    assert_eq!(get(&app, &temp_url).await.status(), StatusCode::OK);

    let permanent = "http://example.com/uploaded.png";
    let response = send_json(
        &app,
        "/move",
        serde_json::json!({ "from": temp_url, "to": permanent }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(get(&app, &temp_url).await.status(), StatusCode::NOT_FOUND);
    let response = get(&app, permanent).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response.into_body()).await, b"pending-upload");
}

#[tokio::test]
async fn test_move_missing_source_is_not_an_error() {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(&dir);

    let response = send_json(
        &app,
        "/move",
        serde_json::json!({ "from": "http://a/none", "to": "http://a/other" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(get(&app, "http://a/other").await.status(), StatusCode::NOT_FOUND);
}

// == Invalidation Endpoint Tests ==

#[tokio::test]
async fn test_invalidate_makes_entry_stale_for_expiring_reads() {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(&dir);
    let url = "http://example.com/g";
    put(&app, url, b"bytes").await;

    let fresh_uri = format!("/data?url={}&expires=60", encode(url));
    assert_eq!(
        send(&app, "GET", &fresh_uri, Body::empty()).await.status(),
        StatusCode::OK
    );

    let response = send_json(&app, "/invalidate", serde_json::json!({ "url": url })).await;
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(
        send(&app, "GET", &fresh_uri, Body::empty()).await.status(),
        StatusCode::NOT_FOUND
    );
    // Invalidated entries are still served when no expiry is requested.
    assert_eq!(get(&app, url).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_invalidate_all_marks_every_entry_stale() {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(&dir);
    put(&app, "http://example.com/h1", b"1").await;
    put(&app, "http://example.com/h2", b"2").await;

    let response = send(&app, "POST", "/invalidate-all", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::OK);

    for url in ["http://example.com/h1", "http://example.com/h2"] {
        let uri = format!("/data?url={}&expires=3600", encode(url));
        assert_eq!(
            send(&app, "GET", &uri, Body::empty()).await.status(),
            StatusCode::NOT_FOUND
        );
    }
}

// == Remove All Endpoint Tests ==

#[tokio::test]
async fn test_remove_all_from_disk_clears_entries() {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(&dir);
    put(&app, "http://example.com/i1", b"1").await;
    put(&app, "http://example.com/i2", b"2").await;

    let response = send(&app, "DELETE", "/all?from_disk=true", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(
        get(&app, "http://example.com/i1").await.status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        get(&app, "http://example.com/i2").await.status(),
        StatusCode::NOT_FOUND
    );
    assert!(dir.path().exists());
}

#[tokio::test]
async fn test_remove_all_memory_only_keeps_disk() {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(&dir);
    put(&app, "http://example.com/j", b"1").await;

    let response = send(&app, "DELETE", "/all", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(get(&app, "http://example.com/j").await.status(), StatusCode::OK);
}

// == Stats and Health Endpoint Tests ==

#[tokio::test]
async fn test_stats_endpoint_reports_budget() {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(&dir);

    let response = send(&app, "GET", "/stats", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["max_pixel_count"], 530_000);
    assert_eq!(json["total_entries"], 0);
    assert_eq!(json["disk_cache_enabled"], true);
}

#[tokio::test]
async fn test_health_endpoint() {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(&dir);

    let response = send(&app, "GET", "/health", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "healthy");
    assert!(json.get("timestamp").is_some());
}

#[tokio::test]
async fn test_unknown_route_returns_404() {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(&dir);

    let response = send(&app, "GET", "/nonexistent", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
