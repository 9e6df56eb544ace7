// Start and stop of a server's container.

use axum::http::StatusCode;
use serde_json::json;

use crate::orchestrator::ServerState;
use crate::runtime::ContainerStatus;
use crate::support::{get, post_json, record, send, TestApp};

#[tokio::test]
async fn test_stop_then_start_keeps_the_world() {
    let t = TestApp::new(vec![record("abc", 25565)]);
    let router = t.router();
    send(&router, post_json("/api/servers/abc/start", &json!({}))).await;

    let stopped = send(&router, post_json("/api/servers/abc/stop", &json!({}))).await;
    assert_eq!(stopped.status, StatusCode::OK);
    assert_eq!(stopped.body["id"], "abc");
    assert_eq!(stopped.body["status"], "exited");
    assert_eq!(t.runtime.container_count(), 1);
    assert_eq!(t.runtime.volumes(), vec!["mc_data_abc".to_string()]);
    assert_eq!(t.app.orchestrator().lifecycle().state("abc"), ServerState::Stopped);

    let started = send(&router, post_json("/api/servers/abc/start", &json!({}))).await;
    assert_eq!(started.status, StatusCode::OK);
    assert_eq!(started.body["status"], "running");

    let view = send(&router, get("/api/servers/abc")).await;
    assert_eq!(view.body["status"], "running");
    assert!(!t.runtime.calls().iter().any(|c| c.starts_with("remove:")));
}

#[tokio::test]
async fn test_start_provisions_missing_container_from_record() {
    let t = TestApp::new(vec![record("abc", 25570)]);

    let resp = send(&t.router(), post_json("/api/servers/abc/start", &json!({}))).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["status"], "running");
    let spec = t.runtime.container_spec("mc_abc").unwrap();
    assert_eq!(spec.image, "itzg/minecraft-server");
    assert_eq!(spec.port.host_port, 25570);
    assert!(spec.env.contains(&("MEMORY".to_string(), "2G".to_string())));
}

#[tokio::test]
async fn test_stop_without_container_is_404() {
    let t = TestApp::new(vec![record("abc", 25565)]);

    let resp = send(&t.router(), post_json("/api/servers/abc/stop", &json!({}))).await;

    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.body["error"], "Server container not found");
}

#[tokio::test]
async fn test_unknown_server_never_touches_runtime() {
    let t = TestApp::new(vec![]);
    let router = t.router();

    for path in ["/api/servers/ghost/start", "/api/servers/ghost/stop"] {
        let resp = send(&router, post_json(path, &json!({}))).await;
        assert_eq!(resp.status, StatusCode::NOT_FOUND, "{}", path);
        assert_eq!(resp.body["error"], "Server not found");
    }
    assert!(t.runtime.calls().is_empty());
}

#[tokio::test]
async fn test_start_failure_is_500_and_marks_failed() {
    let t = TestApp::new(vec![record("abc", 25565)]);
    t.runtime.fail_pulls("registry down");

    let resp = send(&t.router(), post_json("/api/servers/abc/start", &json!({}))).await;

    assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(resp.body["error"].as_str().unwrap().contains("registry down"));
    assert_eq!(t.app.orchestrator().lifecycle().state("abc"), ServerState::Failed);
}

#[tokio::test]
async fn test_stop_of_exited_container_is_a_no_op() {
    let t = TestApp::new(vec![record("abc", 25565)]);
    t.runtime.add_container("mc_abc", ContainerStatus::Exited);

    let resp = send(&t.router(), post_json("/api/servers/abc/stop", &json!({}))).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["status"], "exited");
    assert!(!t.runtime.calls().iter().any(|c| c.starts_with("stop:")));
}
