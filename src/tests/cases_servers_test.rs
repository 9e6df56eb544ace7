// Server lookup, listing and the non-API endpoints.

use axum::http::StatusCode;

use crate::runtime::ContainerStatus;
use crate::support::{get, record, send, TestApp};

#[tokio::test]
async fn test_get_server_without_container_is_stopped() {
    let t = TestApp::new(vec![record("abc", 25565)]);

    let resp = send(&t.router(), get("/api/servers/abc")).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["id"], "abc");
    assert_eq!(resp.body["name"], "server-abc");
    assert_eq!(resp.body["version"], "latest");
    assert_eq!(resp.body["port"], 25565);
    assert_eq!(resp.body["status"], "stopped");
    assert_eq!(resp.headers["content-type"], "application/json");
}

#[tokio::test]
async fn test_get_unknown_server_is_404() {
    let t = TestApp::new(vec![]);

    let resp = send(&t.router(), get("/api/servers/nope")).await;

    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.body["error"], "Server not found");
    assert!(t.runtime.calls().is_empty());
}

#[tokio::test]
async fn test_list_reports_live_status_per_server() {
    let t = TestApp::new(vec![record("a", 25565), record("b", 25566)]);
    t.runtime.add_container("mc_b", ContainerStatus::Running);

    let resp = send(&t.router(), get("/api/servers")).await;

    assert_eq!(resp.status, StatusCode::OK);
    let servers = resp.body.as_array().unwrap();
    assert_eq!(servers.len(), 2);
    assert_eq!(servers[0]["id"], "a");
    assert_eq!(servers[0]["status"], "stopped");
    assert_eq!(servers[1]["id"], "b");
    assert_eq!(servers[1]["status"], "running");
}

#[tokio::test]
async fn test_list_of_empty_store() {
    let t = TestApp::new(vec![]);

    let resp = send(&t.router(), get("/api/servers")).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body, serde_json::json!([]));
}

#[tokio::test]
async fn test_probe_fails_until_the_app_serves() {
    let t = TestApp::new(vec![]);

    let resp = send(&t.router(), get("/k8s/probe")).await;

    assert_eq!(resp.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(resp.body["status"], 503);
}

#[tokio::test]
async fn test_config_endpoint_shows_effective_config() {
    let t = TestApp::new(vec![]);

    let resp = send(&t.router(), get("/mboxd/config")).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["mboxd"]["env"], "test");
    assert_eq!(resp.body["mboxd"]["runtime"]["kind"], "mock");
    assert_eq!(resp.body["mboxd"]["rate_limit"]["max_requests"], 30);
}

#[tokio::test]
async fn test_metrics_endpoint_is_plain_text() {
    let t = TestApp::new(vec![]);

    let resp = send(&t.router(), get("/metrics")).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.headers["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
}
