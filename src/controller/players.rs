// Online players of a server.

use axum::{extract::Path, routing::get, Json, Router};
use std::sync::Arc;

use super::view::{find_record, for_server};
use crate::http::{ApiError, Controller};
use crate::orchestrator::Orchestrator;
use crate::store::ServerStore;

/// PlayersController serves `GET /api/servers/:id/players`.
#[derive(Clone)]
pub struct PlayersController {
    store: Arc<dyn ServerStore>,
    orchestrator: Arc<Orchestrator>,
}

impl PlayersController {
    pub fn new(store: Arc<dyn ServerStore>, orchestrator: Arc<Orchestrator>) -> Self {
        Self { store, orchestrator }
    }

    async fn players(&self, id: String) -> Result<Json<Vec<String>>, ApiError> {
        let record = find_record(self.store.as_ref(), &id).await?;
        let players = self
            .orchestrator
            .list_players(&record.id)
            .await
            .map_err(for_server("players", &record.id))?;
        Ok(Json(players))
    }
}

impl Controller for PlayersController {
    fn add_route(&self, router: Router) -> Router {
        let ctrl = self.clone();
        router.route(
            "/api/servers/:id/players",
            get(move |Path(id): Path<String>| {
                let c = ctrl.clone();
                async move { c.players(id).await }
            }),
        )
    }
}
