//! API error taxonomy.
//!
//! Every handler failure is turned into a JSON `{"error": "..."}` object with
//! the matching status code. Controllers log 500s with their server id and
//! operation before the conversion, see `controller::view::for_server`.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::orchestrator::OrchestratorError;
use crate::store::StoreError;

pub const RATE_LIMIT_EXCEEDED: &str = "Rate limit exceeded";
pub const CONTAINER_NOT_FOUND: &str = "Server container not found";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{}", RATE_LIMIT_EXCEEDED)]
    RateLimited { retry_after: u64 },
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::RateLimited { retry_after } => {
                let body = json!({ "error": RATE_LIMIT_EXCEEDED, "retry_after": retry_after });
                let mut response = (status, Json(body)).into_response();
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
                response
            }
            other => (status, Json(json!({ "error": other.to_string() }))).into_response(),
        }
    }
}

impl From<OrchestratorError> for ApiError {
    fn from(err: OrchestratorError) -> Self {
        match err {
            OrchestratorError::ContainerNotFound(_) => ApiError::NotFound(CONTAINER_NOT_FOUND.to_string()),
            e @ OrchestratorError::NotRunning { .. } => ApiError::Conflict(e.to_string()),
            e => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Internal(err.to_string())
    }
}
