//! Version update of a server.
//!
//! Replaces the running container with one built from the requested version
//! and records the new version once the replacement succeeded, both under the
//! same per-server lock.

use axum::{
    extract::{rejection::JsonRejection, Path},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use super::view::{find_record, for_server, parse_body};
use crate::http::{ApiError, Controller};
use crate::orchestrator::{is_valid_memory, Orchestrator};
use crate::store::ServerStore;

pub const UPDATED_MESSAGE: &str = "Server updated successfully";

#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    pub version: String,
    pub memory: Option<String>,
}

/// UpdateController serves `POST /api/servers/:id/update`.
#[derive(Clone)]
pub struct UpdateController {
    store: Arc<dyn ServerStore>,
    orchestrator: Arc<Orchestrator>,
    default_memory: String,
}

impl UpdateController {
    pub fn new(store: Arc<dyn ServerStore>, orchestrator: Arc<Orchestrator>, default_memory: String) -> Self {
        Self {
            store,
            orchestrator,
            default_memory,
        }
    }

    async fn update(&self, id: String, req: UpdateRequest) -> Result<Json<Value>, ApiError> {
        let version = req.version.trim();
        if version.is_empty() {
            return Err(ApiError::Validation("version must not be empty".to_string()));
        }
        let memory = req.memory.unwrap_or_else(|| self.default_memory.clone());
        if !is_valid_memory(&memory) {
            return Err(ApiError::Validation(format!(
                "invalid memory {:?}, expected <digits>[KMGkmg]",
                memory
            )));
        }

        let record = find_record(self.store.as_ref(), &id).await?;
        let id = record.id.as_str();

        // Persisted under the server lock: the stored version names the running image.
        let store = self.store.clone();
        self.orchestrator
            .replace_then(id, version, &memory, record.port, move || async move {
                store.update_version(id, version).await.map_err(ApiError::from)
            })
            .await
            .map_err(for_server("update", id))?;

        info!(
            component = "api",
            event = "server_updated",
            server_id = %record.id,
            from = %record.version,
            to = %version,
            "server version updated"
        );

        Ok(Json(json!({ "message": UPDATED_MESSAGE })))
    }
}

impl Controller for UpdateController {
    fn add_route(&self, router: Router) -> Router {
        let ctrl = self.clone();
        router.route(
            "/api/servers/:id/update",
            post(
                move |Path(id): Path<String>, body: Result<Json<UpdateRequest>, JsonRejection>| {
                    let c = ctrl.clone();
                    async move { c.update(id, parse_body(body)?).await }
                },
            ),
        )
    }
}
