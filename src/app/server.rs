// HTTP server for the mboxd application.

use anyhow::Result;
use axum::Router;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::config::{Config, ConfigTrait};
use crate::http::{Controller, Middleware};
use crate::liveness::Prober;
use crate::orchestrator::Orchestrator;
use crate::rate::Limiter;
use crate::store::ServerStore;

/// HTTP server implementation that wraps all dependencies.
pub struct HttpServer {
    server: Arc<crate::http::HttpServer>,
    is_server_alive: Arc<AtomicBool>,
}

impl HttpServer {
    /// Creates a new HttpServer with every controller and middleware mounted.
    pub fn new(
        ctx: CancellationToken,
        cfg: &Config,
        store: Arc<dyn ServerStore>,
        orchestrator: Arc<Orchestrator>,
        limiter: Option<Arc<Limiter>>,
        probe: Arc<dyn Prober>,
    ) -> Result<Self> {
        let controllers = Self::controllers(cfg, store, orchestrator, probe);
        let middlewares = Self::middlewares(limiter);

        // Compose server with controllers and middlewares.
        let server = crate::http::HttpServer::new(ctx, cfg.clone(), controllers, middlewares)?;

        Ok(Self {
            server,
            is_server_alive: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Returns true if the server is marked as alive.
    pub fn is_alive(&self) -> bool {
        self.is_server_alive.load(Ordering::Relaxed)
    }

    pub fn router(&self) -> Router {
        self.server.router()
    }

    /// Serves on the configured port until shutdown.
    pub async fn listen_and_serve(&self) -> Result<()> {
        self.is_server_alive.store(true, Ordering::Relaxed);
        let result = self.server.listen_and_serve().await;
        self.is_server_alive.store(false, Ordering::Relaxed);
        result
    }

    /// Serves on a bound listener until shutdown.
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        self.is_server_alive.store(true, Ordering::Relaxed);
        let result = self.server.serve(listener).await;
        self.is_server_alive.store(false, Ordering::Relaxed);
        result
    }

    /// Returns all HTTP controllers for the server.
    fn controllers(
        cfg: &Config,
        store: Arc<dyn ServerStore>,
        orchestrator: Arc<Orchestrator>,
        probe: Arc<dyn Prober>,
    ) -> Vec<Box<dyn Controller>> {
        use crate::controller;

        let runtime = cfg.runtime();
        let default_memory = runtime.default_memory().to_string();

        vec![
            // Healthcheck probe endpoint
            Box::new(controller::LivenessProbeController::new(probe)),
            // Metrics endpoint
            Box::new(controller::PrometheusMetricsController::new()),
            // Encodes and shows current config as json
            Box::new(controller::ShowConfigController::new(cfg.clone())),
            // Lists, fetches and creates servers
            Box::new(controller::ServersController::new(
                store.clone(),
                orchestrator.clone(),
                default_memory.clone(),
            )),
            // Online players
            Box::new(controller::PlayersController::new(store.clone(), orchestrator.clone())),
            // Start and stop
            Box::new(controller::LifecycleController::new(
                store.clone(),
                orchestrator.clone(),
                default_memory.clone(),
            )),
            // Version updates
            Box::new(controller::UpdateController::new(
                store.clone(),
                orchestrator.clone(),
                default_memory,
            )),
            // Console commands
            Box::new(controller::CommandController::new(
                store,
                orchestrator,
                runtime.allowed_commands(),
            )),
        ]
    }

    /// Returns the request middlewares for the server, executed in reverse order.
    fn middlewares(limiter: Option<Arc<Limiter>>) -> Vec<Box<dyn Middleware>> {
        let mut middlewares: Vec<Box<dyn Middleware>> = vec![
            // Exec first - panic recovery
            Box::new(crate::middleware::PanicRecoverMiddleware::new()),
        ];
        // Exec second - rate limiting of /api/
        if let Some(limiter) = limiter {
            middlewares.push(Box::new(crate::middleware::RateLimitMiddleware::new(limiter)));
        }
        middlewares
    }
}
