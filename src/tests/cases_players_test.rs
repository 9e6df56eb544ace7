// Online player listing.

use axum::http::StatusCode;
use serde_json::json;

use crate::runtime::{ContainerStatus, ExecOutput};
use crate::support::{get, record, send, TestApp};

#[tokio::test]
async fn test_players_of_unknown_server() {
    let t = TestApp::new(vec![]);

    let resp = send(&t.router(), get("/api/servers/nope/players")).await;

    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.body["error"], "Server not found");
}

#[tokio::test]
async fn test_players_without_container() {
    let t = TestApp::new(vec![record("abc", 25565)]);

    let resp = send(&t.router(), get("/api/servers/abc/players")).await;

    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.body["error"], "Server container not found");
}

#[tokio::test]
async fn test_players_of_stopped_container() {
    let t = TestApp::new(vec![record("abc", 25565)]);
    t.runtime.add_container("mc_abc", ContainerStatus::Exited);

    let resp = send(&t.router(), get("/api/servers/abc/players")).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body, json!([]));
}

#[tokio::test]
async fn test_players_of_running_container() {
    let t = TestApp::new(vec![record("abc", 25565)]);
    t.runtime.add_container("mc_abc", ContainerStatus::Running);
    t.runtime.set_exec_result(Ok(ExecOutput {
        exit_code: 0,
        output: "There are 2 of a max of 20 players online: alice, bob".to_string(),
    }));

    let resp = send(&t.router(), get("/api/servers/abc/players")).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body, json!(["alice", "bob"]));
}

#[tokio::test]
async fn test_players_degrade_when_console_fails() {
    let t = TestApp::new(vec![record("abc", 25565)]);
    t.runtime.add_container("mc_abc", ContainerStatus::Running);
    t.runtime.set_exec_result(Err("exec create failed".to_string()));

    let resp = send(&t.router(), get("/api/servers/abc/players")).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body, json!([]));
}
