// Rate-limit gate in front of /api/.

use axum::http::StatusCode;
use serde_json::json;

use crate::config;
use crate::support::{get, post_json, record, send, with_peer, TestApp};

#[tokio::test]
async fn test_31st_request_in_window_is_rejected() {
    let t = TestApp::new(vec![]);
    let router = t.router();

    for i in 0..30 {
        let resp = send(&router, get("/api/servers")).await;
        assert_eq!(resp.status, StatusCode::OK, "request {}", i + 1);
    }

    let resp = send(&router, get("/api/servers")).await;
    assert_eq!(resp.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(resp.body["error"], "Rate limit exceeded");
    assert_eq!(resp.body["retry_after"], 10);
    assert_eq!(resp.headers["retry-after"], "10");
}

#[tokio::test]
async fn test_clients_are_limited_independently() {
    let t = TestApp::new(vec![]);
    let router = t.router();

    for _ in 0..30 {
        send(&router, get("/api/servers")).await;
    }
    assert_eq!(
        send(&router, get("/api/servers")).await.status,
        StatusCode::TOO_MANY_REQUESTS
    );

    let other = with_peer(get("/api/servers"), "10.0.0.2:5555");
    assert_eq!(send(&router, other).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_non_api_routes_are_not_limited() {
    let t = TestApp::new(vec![]);
    let router = t.router();

    for _ in 0..31 {
        send(&router, get("/api/servers")).await;
    }
    for _ in 0..5 {
        assert_eq!(send(&router, get("/mboxd/config")).await.status, StatusCode::OK);
    }
}

#[tokio::test]
async fn test_rejected_requests_reach_no_handler() {
    let t = TestApp::new(vec![record("abc", 25565)]);
    let router = t.router();

    for _ in 0..30 {
        send(&router, get("/api/servers/abc")).await;
    }
    let calls_before = t.runtime.calls().len();
    let resp = send(&router, get("/api/servers/abc")).await;

    assert_eq!(resp.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(t.runtime.calls().len(), calls_before);
}

#[tokio::test]
async fn test_disabled_limiter_admits_everything() {
    let mut cfg = config::new_test_config();
    if let Some(rl) = cfg.mboxd.rate_limit.as_mut() {
        rl.enabled = false;
    }
    let t = TestApp::with_config(cfg, vec![]);
    let router = t.router();

    for _ in 0..40 {
        assert_eq!(send(&router, get("/api/servers")).await.status, StatusCode::OK);
    }
    assert!(t.app.limiter().is_none());
}

#[tokio::test]
async fn test_start_and_stop_share_the_api_budget() {
    let t = TestApp::new(vec![record("abc", 25565)]);
    let router = t.router();

    for _ in 0..30 {
        send(&router, post_json("/api/servers/abc/stop", &json!({}))).await;
    }
    let resp = send(&router, post_json("/api/servers/abc/start", &json!({}))).await;

    assert_eq!(resp.status, StatusCode::TOO_MANY_REQUESTS);
    assert!(!t.runtime.calls().iter().any(|c| c.starts_with("run:")));
}
