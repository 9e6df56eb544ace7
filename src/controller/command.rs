// Console commands sent to a running server.

use axum::{
    extract::{rejection::JsonRejection, Path},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use super::view::{find_record, for_server, parse_body};
use crate::http::{ApiError, Controller};
use crate::orchestrator::Orchestrator;
use crate::store::ServerStore;

#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    pub command: String,
}

/// CommandController serves `POST /api/servers/:id/command`.
#[derive(Clone)]
pub struct CommandController {
    store: Arc<dyn ServerStore>,
    orchestrator: Arc<Orchestrator>,
    allowed: Arc<Vec<String>>,
}

impl CommandController {
    pub fn new(store: Arc<dyn ServerStore>, orchestrator: Arc<Orchestrator>, allowed: Vec<String>) -> Self {
        Self {
            store,
            orchestrator,
            allowed: Arc::new(allowed),
        }
    }

    fn is_allowed(&self, command: &str) -> bool {
        command
            .split_whitespace()
            .next()
            .map(|verb| self.allowed.iter().any(|a| a == verb))
            .unwrap_or(false)
    }

    async fn command(&self, id: String, req: CommandRequest) -> Result<Json<Value>, ApiError> {
        let command = req.command.trim();
        if command.is_empty() {
            return Err(ApiError::Validation("command must not be empty".to_string()));
        }
        if !self.is_allowed(command) {
            return Err(ApiError::Validation(format!("command not allowed: {}", command)));
        }

        let record = find_record(self.store.as_ref(), &id).await?;
        let output = self
            .orchestrator
            .send_command(&record.id, command)
            .await
            .map_err(for_server("command", &record.id))?;
        Ok(Json(json!({ "output": output })))
    }
}

impl Controller for CommandController {
    fn add_route(&self, router: Router) -> Router {
        let ctrl = self.clone();
        router.route(
            "/api/servers/:id/command",
            post(
                move |Path(id): Path<String>, body: Result<Json<CommandRequest>, JsonRejection>| {
                    let c = ctrl.clone();
                    async move { c.command(id, parse_body(body)?).await }
                },
            ),
        )
    }
}
