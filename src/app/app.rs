// Main mboxd application implementation.

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::{Config, ConfigTrait, RuntimeKind};
use crate::liveness;
use crate::orchestrator::Orchestrator;
use crate::rate::{self, Limiter};
use crate::runtime::{DockerRuntime, MockRuntime, Runtime};
use crate::shutdown::GracefulShutdown;
use crate::store::{ServerStore, SqliteStore};

use super::server::HttpServer;

/// Encapsulates the entire application state.
#[derive(Clone)]
pub struct App {
    cfg: Config,
    shutdown_token: CancellationToken,
    store: Arc<dyn ServerStore>,
    orchestrator: Arc<Orchestrator>,
    limiter: Option<Arc<Limiter>>,
    probe: Arc<dyn liveness::Prober>,
    server: Arc<HttpServer>,
}

impl App {
    /// Creates the application with collaborators built from the config.
    pub async fn new(
        shutdown_token: CancellationToken,
        cfg: Config,
        probe: Arc<dyn liveness::Prober>,
    ) -> Result<Self> {
        let runtime: Arc<dyn Runtime> = match cfg.runtime().kind {
            RuntimeKind::Docker => {
                Arc::new(DockerRuntime::connect().context("connect to container runtime")?)
            }
            RuntimeKind::Mock => {
                warn!(
                    component = "app",
                    event = "mock_runtime",
                    "using in-memory container runtime"
                );
                Arc::new(MockRuntime::new())
            }
        };

        let store_cfg = cfg.store().cloned().unwrap_or_default();
        let store = SqliteStore::connect(
            store_cfg.url(),
            store_cfg.max_connections(),
            store_cfg.acquire_timeout(),
        )
        .await
        .with_context(|| format!("open server store {}", store_cfg.url()))?;

        Self::with_collaborators(shutdown_token, cfg, probe, runtime, Arc::new(store))
    }

    /// Creates the application around already built collaborators.
    pub fn with_collaborators(
        shutdown_token: CancellationToken,
        cfg: Config,
        probe: Arc<dyn liveness::Prober>,
        runtime: Arc<dyn Runtime>,
        store: Arc<dyn ServerStore>,
    ) -> Result<Self> {
        let orchestrator = Arc::new(Orchestrator::new(runtime, cfg.runtime().settings()));

        let limiter = match cfg.rate_limit() {
            Some(rl) if !rl.enabled => None,
            Some(rl) => {
                let limiter = Arc::new(Limiter::new(
                    rl.max_requests.unwrap_or(rate::DEFAULT_MAX_REQUESTS),
                    rl.time_window.unwrap_or(rate::DEFAULT_TIME_WINDOW),
                ));
                limiter.spawn_sweeper(shutdown_token.clone(), rl.sweep_interval());
                Some(limiter)
            }
            None => Some(Arc::new(Limiter::default())),
        };

        let server = Arc::new(HttpServer::new(
            shutdown_token.clone(),
            &cfg,
            store.clone(),
            orchestrator.clone(),
            limiter.clone(),
            probe.clone(),
        )?);

        Ok(Self {
            cfg,
            shutdown_token,
            store,
            orchestrator,
            limiter,
            probe,
            server,
        })
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn orchestrator(&self) -> &Arc<Orchestrator> {
        &self.orchestrator
    }

    pub fn limiter(&self) -> Option<&Arc<Limiter>> {
        self.limiter.as_ref()
    }

    /// Router with every controller and middleware mounted.
    pub fn router(&self) -> Router {
        self.server.router()
    }

    /// Serves the API on the configured port and handles graceful shutdown.
    pub async fn serve(&self, gsh: Arc<GracefulShutdown>) -> Result<()> {
        self.run(gsh, None).await
    }

    /// Serves the API on an already bound listener.
    pub async fn serve_on(&self, listener: TcpListener, gsh: Arc<GracefulShutdown>) -> Result<()> {
        self.run(gsh, Some(listener)).await
    }

    async fn run(&self, gsh: Arc<GracefulShutdown>, listener: Option<TcpListener>) -> Result<()> {
        // Register liveness target before serving.
        self.probe
            .watch(vec![Arc::new(self.clone()) as Arc<dyn liveness::Service>]);

        let server = self.server.clone();
        let app_for_close = self.clone();

        gsh.add(1);
        tokio::task::spawn(async move {
            let result = match listener {
                Some(listener) => server.serve(listener).await,
                None => server.listen_and_serve().await,
            };
            if let Err(e) = result {
                error!(
                    component = "app",
                    scope = "server",
                    event = "serve_failed",
                    error = %e,
                    "server failed to serve"
                );
            }

            app_for_close.close().await;

            // Signal graceful shutdown
            gsh.done();
        });

        info!(component = "app", event = "started", "application lifecycle");

        Ok(())
    }

    /// Checks whether the HTTP server is still alive.
    pub fn is_alive(&self) -> bool {
        if !self.server.is_alive() {
            warn!(
                component = "app",
                scope = "http_server",
                event = "gone_away",
                "http server has gone away"
            );
            return false;
        }
        true
    }

    /// Closes application resources.
    pub async fn close(&self) {
        self.store.close().await;
        self.shutdown_token.cancel();

        info!(component = "app", event = "stopped", "application lifecycle");
    }
}

/// The app is alive while its HTTP server runs and the container runtime answers.
#[async_trait]
impl liveness::Service for App {
    async fn is_alive(&self) -> bool {
        if !App::is_alive(self) {
            return false;
        }
        match self.orchestrator.ping().await {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    component = "app",
                    scope = "runtime",
                    event = "ping_failed",
                    error = %e,
                    "container runtime is unreachable"
                );
                false
            }
        }
    }
}
