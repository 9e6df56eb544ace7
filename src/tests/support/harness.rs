// Application harness backed by in-memory collaborators.

use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::app::App;
use crate::config::{self, Config};
use crate::liveness;
use crate::runtime::MockRuntime;
use crate::store::{InMemoryStore, ServerRecord, ServerStore};

/// A fully wired app whose runtime and store the test can inspect.
pub struct TestApp {
    pub app: App,
    pub runtime: Arc<MockRuntime>,
    pub store: Arc<InMemoryStore>,
    pub token: CancellationToken,
}

impl TestApp {
    pub fn new(records: Vec<ServerRecord>) -> Self {
        Self::with_config(config::new_test_config(), records)
    }

    /// Builds the app. Must run inside a tokio runtime.
    pub fn with_config(cfg: Config, records: Vec<ServerRecord>) -> Self {
        Self::with_store(cfg, records, |store| store as Arc<dyn ServerStore>)
    }

    /// Builds the app around `wrap(store)`, so a case can decorate the
    /// in-memory store while still inspecting it through `self.store`.
    pub fn with_store<F>(cfg: Config, records: Vec<ServerRecord>, wrap: F) -> Self
    where
        F: FnOnce(Arc<InMemoryStore>) -> Arc<dyn ServerStore>,
    {
        let token = CancellationToken::new();
        let runtime = Arc::new(MockRuntime::new());
        let store = Arc::new(InMemoryStore::with_records(records));
        let probe =
            Arc::new(liveness::Probe::new(Duration::from_secs(1))) as Arc<dyn liveness::Prober>;

        let app = App::with_collaborators(token.clone(), cfg, probe, runtime.clone(), wrap(store.clone()))
            .unwrap();

        Self {
            app,
            runtime,
            store,
            token,
        }
    }

    pub fn router(&self) -> Router {
        self.app.router()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
