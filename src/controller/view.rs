// Shared building blocks for the `/api/servers` controllers.

use axum::extract::rejection::JsonRejection;
use axum::Json;
use serde::Serialize;
use tracing::error;

use crate::http::ApiError;
use crate::orchestrator::Orchestrator;
use crate::runtime::ContainerStatus;
use crate::store::{ServerRecord, ServerStore};

pub const SERVER_NOT_FOUND: &str = "Server not found";

/// A stored record enriched with the live container status.
#[derive(Debug, Clone, Serialize)]
pub struct ServerView {
    #[serde(flatten)]
    pub record: ServerRecord,
    pub status: ContainerStatus,
}

pub async fn find_record(store: &dyn ServerStore, id: &str) -> Result<ServerRecord, ApiError> {
    store
        .get_by_id(id)
        .await
        .map_err(for_server("lookup", id))?
        .ok_or_else(|| ApiError::NotFound(SERVER_NOT_FOUND.to_string()))
}

pub async fn view(orchestrator: &Orchestrator, record: ServerRecord) -> Result<ServerView, ApiError> {
    let status = orchestrator
        .status(&record.id)
        .await
        .map_err(for_server("status", &record.id))?;
    Ok(ServerView { record, status })
}

/// Unwraps a JSON body, turning any extraction failure into a 400.
pub fn parse_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::Validation(format!("Invalid request body: {}", rejection.body_text())))
}

/// Converts a domain error of operation `op` on server `id`, logging it when
/// it surfaces as a 500.
pub fn for_server<'a, E>(op: &'static str, id: &'a str) -> impl FnOnce(E) -> ApiError + 'a
where
    E: Into<ApiError> + 'a,
{
    move |err| log_internal(op, Some(id), err.into())
}

/// Same as [`for_server`] for operations not bound to one server.
pub fn for_op<E: Into<ApiError>>(op: &'static str) -> impl FnOnce(E) -> ApiError {
    move |err| log_internal(op, None, err.into())
}

fn log_internal(op: &'static str, server_id: Option<&str>, err: ApiError) -> ApiError {
    if let ApiError::Internal(message) = &err {
        error!(
            component = "api",
            event = "request_failed",
            op = op,
            server_id = server_id.unwrap_or_default(),
            error = %message,
            "request failed"
        );
    }
    err
}
