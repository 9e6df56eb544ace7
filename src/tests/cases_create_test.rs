// Server creation.

use axum::http::StatusCode;
use serde_json::json;

use crate::store::ServerStore;
use crate::support::{get, post_json, record, send, TestApp};

#[tokio::test]
async fn test_create_provisions_new_server() {
    let t = TestApp::new(vec![]);
    let router = t.router();

    let resp = send(
        &router,
        post_json("/api/servers", &json!({ "name": "survival", "port": 25570 })),
    )
    .await;

    assert_eq!(resp.status, StatusCode::CREATED);
    assert_eq!(resp.body["name"], "survival");
    assert_eq!(resp.body["version"], "latest");
    assert_eq!(resp.body["port"], 25570);
    assert_eq!(resp.body["status"], "running");

    let id = resp.body["id"].as_str().unwrap().to_string();
    assert!(uuid::Uuid::parse_str(&id).is_ok());

    let spec = t.runtime.container_spec(&format!("mc_{}", id)).unwrap();
    assert_eq!(spec.image, "itzg/minecraft-server");
    assert_eq!(spec.port.host_port, 25570);

    let fetched = send(&router, get(&format!("/api/servers/{}", id))).await;
    assert_eq!(fetched.body["status"], "running");
}

#[tokio::test]
async fn test_create_rejects_invalid_input() {
    let t = TestApp::new(vec![record("abc", 25565)]);
    let router = t.router();

    let cases = [
        json!({ "name": "", "port": 25570 }),
        json!({ "name": "x", "port": 0 }),
        json!({ "name": "x", "port": 70000 }),
        json!({ "name": "x", "port": 25565 }),
        json!({ "name": "x", "port": 25570, "memory": "big" }),
        json!({ "port": 25570 }),
    ];
    for body in cases {
        let resp = send(&router, post_json("/api/servers", &body)).await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST, "body {}", body);
    }

    assert_eq!(t.store.list().await.unwrap().len(), 1);
    assert_eq!(t.runtime.container_count(), 0);
}

#[tokio::test]
async fn test_create_keeps_record_when_provisioning_fails() {
    let t = TestApp::new(vec![]);
    t.runtime.fail_pulls("registry down");

    let resp = send(
        &t.router(),
        post_json("/api/servers", &json!({ "name": "x", "version": "1.20.1", "port": 25570 })),
    )
    .await;

    assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);

    let records = t.store.list().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].version, "1.20.1");

    let view = send(&t.router(), get(&format!("/api/servers/{}", records[0].id))).await;
    assert_eq!(view.body["status"], "stopped");
}
