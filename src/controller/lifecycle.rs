// Start and stop of a server's container.

use axum::{extract::Path, routing::post, Json, Router};
use std::sync::Arc;
use tracing::info;

use super::view::{find_record, for_server, ServerView};
use crate::http::{ApiError, Controller};
use crate::orchestrator::Orchestrator;
use crate::store::ServerStore;

/// LifecycleController serves `POST /api/servers/:id/start` and `POST /api/servers/:id/stop`.
#[derive(Clone)]
pub struct LifecycleController {
    store: Arc<dyn ServerStore>,
    orchestrator: Arc<Orchestrator>,
    default_memory: String,
}

impl LifecycleController {
    pub fn new(store: Arc<dyn ServerStore>, orchestrator: Arc<Orchestrator>, default_memory: String) -> Self {
        Self {
            store,
            orchestrator,
            default_memory,
        }
    }

    /// A server without a container is provisioned from its record.
    async fn start(&self, id: String) -> Result<Json<ServerView>, ApiError> {
        let record = find_record(self.store.as_ref(), &id).await?;
        let container = self
            .orchestrator
            .start(&record.id, &record.version, &self.default_memory, record.port)
            .await
            .map_err(for_server("start", &record.id))?;

        info!(component = "api", event = "server_started", server_id = %record.id, "server started");
        Ok(Json(ServerView {
            record,
            status: container.status,
        }))
    }

    async fn stop(&self, id: String) -> Result<Json<ServerView>, ApiError> {
        let record = find_record(self.store.as_ref(), &id).await?;
        let container = self
            .orchestrator
            .stop(&record.id)
            .await
            .map_err(for_server("stop", &record.id))?;

        info!(component = "api", event = "server_stopped", server_id = %record.id, "server stopped");
        Ok(Json(ServerView {
            record,
            status: container.status,
        }))
    }
}

impl Controller for LifecycleController {
    fn add_route(&self, router: Router) -> Router {
        let start_ctrl = self.clone();
        let stop_ctrl = self.clone();
        router
            .route(
                "/api/servers/:id/start",
                post(move |Path(id): Path<String>| {
                    let c = start_ctrl.clone();
                    async move { c.start(id).await }
                }),
            )
            .route(
                "/api/servers/:id/stop",
                post(move |Path(id): Path<String>| {
                    let c = stop_ctrl.clone();
                    async move { c.stop(id).await }
                }),
            )
    }
}
