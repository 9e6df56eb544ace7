// Request helpers for driving the router in-process.

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::net::SocketAddr;
use tower::ServiceExt;

use crate::store::ServerRecord;

/// Peer address attached to requests unless a test picks another one.
pub const DEFAULT_PEER: &str = "10.0.0.1:40000";

/// Response parts the cases assert on.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub fn record(id: &str, port: u16) -> ServerRecord {
    ServerRecord {
        id: id.to_string(),
        name: format!("server-{}", id),
        version: "latest".to_string(),
        port,
    }
}

pub fn get(path: &str) -> Request<Body> {
    with_peer(
        Request::builder()
            .method(Method::GET)
            .uri(path)
            .body(Body::empty())
            .unwrap(),
        DEFAULT_PEER,
    )
}

pub fn post_json(path: &str, body: &Value) -> Request<Body> {
    post_raw(path, &body.to_string())
}

pub fn post_raw(path: &str, body: &str) -> Request<Body> {
    with_peer(
        Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        DEFAULT_PEER,
    )
}

/// Attaches the peer address the server would have recorded for the connection.
pub fn with_peer(mut request: Request<Body>, peer: &str) -> Request<Body> {
    let addr: SocketAddr = peer.parse().unwrap();
    request.extensions_mut().insert(ConnectInfo(addr));
    request
}

/// Sends one request through the router and decodes the JSON body.
pub async fn send(router: &Router, request: Request<Body>) -> TestResponse {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };

    TestResponse {
        status,
        headers,
        body,
    }
}
