//! Server listing, lookup and creation.

use axum::{
    extract::{rejection::JsonRejection, Path},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use super::view::{find_record, for_op, for_server, parse_body, view, ServerView};
use crate::http::{ApiError, Controller};
use crate::orchestrator::{is_valid_memory, naming::LATEST, Orchestrator};
use crate::store::{ServerRecord, ServerStore};

#[derive(Debug, Deserialize)]
pub struct CreateRequest {
    pub name: String,
    pub version: Option<String>,
    pub memory: Option<String>,
    pub port: u32,
}

/// ServersController serves `GET /api/servers`, `POST /api/servers` and `GET /api/servers/:id`.
#[derive(Clone)]
pub struct ServersController {
    store: Arc<dyn ServerStore>,
    orchestrator: Arc<Orchestrator>,
    default_memory: String,
    // Serializes port checks with inserts.
    create_lock: Arc<Mutex<()>>,
}

impl ServersController {
    pub fn new(store: Arc<dyn ServerStore>, orchestrator: Arc<Orchestrator>, default_memory: String) -> Self {
        Self {
            store,
            orchestrator,
            default_memory,
            create_lock: Arc::new(Mutex::new(())),
        }
    }

    async fn get(&self, id: String) -> Result<Json<ServerView>, ApiError> {
        let record = find_record(self.store.as_ref(), &id).await?;
        Ok(Json(view(&self.orchestrator, record).await?))
    }

    async fn list(&self) -> Result<Json<Vec<ServerView>>, ApiError> {
        let records = self.store.list().await.map_err(for_op("list"))?;
        let mut views = Vec::with_capacity(records.len());
        for record in records {
            views.push(view(&self.orchestrator, record).await?);
        }
        Ok(Json(views))
    }

    async fn create(&self, req: CreateRequest) -> Result<(StatusCode, Json<ServerView>), ApiError> {
        let name = req.name.trim().to_string();
        if name.is_empty() {
            return Err(ApiError::Validation("name must not be empty".to_string()));
        }
        let port = u16::try_from(req.port)
            .ok()
            .filter(|p| *p != 0)
            .ok_or_else(|| ApiError::Validation(format!("port {} out of range 1-65535", req.port)))?;
        let version = match req.version.as_deref().map(str::trim) {
            None | Some("") => LATEST.to_string(),
            Some(v) => v.to_string(),
        };
        let memory = req.memory.unwrap_or_else(|| self.default_memory.clone());
        if !is_valid_memory(&memory) {
            return Err(ApiError::Validation(format!(
                "invalid memory {:?}, expected <digits>[KMGkmg]",
                memory
            )));
        }

        let record = {
            let _guard = self.create_lock.lock().await;
            let taken = self.store.list().await.map_err(for_op("create"))?;
            if taken.iter().any(|r| r.port == port) {
                return Err(ApiError::Validation(format!("port {} is already in use", port)));
            }
            let record = ServerRecord {
                id: Uuid::new_v4().to_string(),
                name,
                version,
                port,
            };
            self.store
                .insert(&record)
                .await
                .map_err(for_server("create", &record.id))?;
            record
        };

        info!(
            component = "api",
            event = "server_created",
            server_id = %record.id,
            name = %record.name,
            port = record.port,
            "server record created"
        );

        let container = self
            .orchestrator
            .provision(&record.id, &record.version, &memory, record.port)
            .await
            .map_err(|e| {
                warn!(
                    component = "api",
                    event = "create_provision_failed",
                    server_id = %record.id,
                    "record kept without a container"
                );
                for_server("provision", &record.id)(e)
            })?;

        Ok((
            StatusCode::CREATED,
            Json(ServerView {
                record,
                status: container.status,
            }),
        ))
    }
}

impl Controller for ServersController {
    fn add_route(&self, router: Router) -> Router {
        let list_ctrl = self.clone();
        let create_ctrl = self.clone();
        let get_ctrl = self.clone();
        router
            .route(
                "/api/servers",
                get(move || {
                    let c = list_ctrl.clone();
                    async move { c.list().await }
                })
                .post(move |body: Result<Json<CreateRequest>, JsonRejection>| {
                    let c = create_ctrl.clone();
                    async move { c.create(parse_body(body)?).await }
                }),
            )
            .route(
                "/api/servers/:id",
                get(move |Path(id): Path<String>| {
                    let c = get_ctrl.clone();
                    async move { c.get(id).await }
                }),
            )
    }
}
