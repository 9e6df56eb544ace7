// End-to-end run over a real socket.

use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use crate::shutdown::GracefulShutdown;
use crate::support::{record, TestApp};

#[tokio::test]
async fn test_serves_api_over_tcp_and_shuts_down() {
    let t = TestApp::new(vec![record("abc", 25565)]);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let gsh = GracefulShutdown::new(t.token.clone());
    gsh.set_graceful_timeout(Duration::from_secs(5));
    t.app.serve_on(listener, Arc::new(gsh.clone())).await.unwrap();

    let base = format!("http://{}", addr);
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();

    // The probe turns green once the server task is running.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let resp = client.get(format!("{}/k8s/probe", base)).send().await;
        if matches!(&resp, Ok(r) if r.status().is_success()) {
            break;
        }
        assert!(tokio::time::Instant::now() < deadline, "probe never became healthy");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let resp = client
        .post(format!("{}/api/servers/abc/update", base))
        .json(&json!({ "version": "1.20.1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let view: Value = client
        .get(format!("{}/api/servers/abc", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(view["status"], "running");
    assert_eq!(view["version"], "1.20.1");

    // The peer address keys the limiter.
    let limiter = t.app.limiter().unwrap();
    assert_eq!(limiter.tracked_clients(), 1);

    t.token.cancel();
    gsh.await_shutdown().await.unwrap();
    assert_eq!(gsh.pending(), 0);
}
