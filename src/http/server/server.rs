//! Axum server assembly: controllers, middlewares and the outer tower layers.

use anyhow::{Context, Result};
use axum::{extract::Request, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, info_span, Span};

use crate::config::{Config, ConfigTrait};
use crate::controller::controller::Controller;
use crate::middleware::middleware::Middleware;

const DEFAULT_NAME: &str = "mboxd";

/// Resolves `api.port` into a bind address.
///
/// Accepts a bare port (`5000`), a Go-style `:5000` or a full `host:port`.
pub fn bind_addr(port: &str) -> Result<SocketAddr> {
    let port = port.trim();
    let candidate = if port.contains(':') && !port.starts_with(':') {
        port.to_string()
    } else {
        format!("0.0.0.0:{}", port.trim_start_matches(':'))
    };
    candidate
        .parse()
        .with_context(|| format!("invalid api.port {:?}", port))
}

pub struct HttpServer {
    shutdown_token: CancellationToken,
    config: Config,
    router: Router,
}

impl HttpServer {
    pub fn new(
        shutdown_token: CancellationToken,
        config: Config,
        controllers: Vec<Box<dyn Controller>>,
        middlewares: Vec<Box<dyn Middleware>>,
    ) -> Result<Arc<Self>> {
        let routes = controllers
            .iter()
            .fold(Router::new(), |router, controller| controller.add_route(router));

        // Last middleware in the list ends up innermost.
        let router = middlewares
            .iter()
            .rev()
            .fold(routes, |router, middleware| middleware.apply(router));
        let router = Self::outer_layers(router, config.api_timeout());

        Ok(Arc::new(Self {
            shutdown_token,
            config,
            router,
        }))
    }

    /// Fully layered router, ready to serve.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Binds the configured port and serves until the shutdown token fires.
    pub async fn listen_and_serve(&self) -> Result<()> {
        let addr = bind_addr(self.config.api_port())?;
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("bind {}", addr))?;
        self.serve(listener).await
    }

    /// Serves on an already bound listener until the shutdown token fires.
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let name = self
            .config
            .api()
            .and_then(|api| api.name.as_deref())
            .unwrap_or(DEFAULT_NAME);
        let addr = listener.local_addr().context("listener has no local address")?;

        info!(component = "server", event = "started", name = name, addr = %addr, "server started");

        let token = self.shutdown_token.clone();
        // Peer addresses feed the rate limiter's client ids.
        let app = self
            .router
            .clone()
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move { token.cancelled().await })
            .await
            .inspect_err(|e| {
                error!(
                    component = "server",
                    event = "serve_failed",
                    name = name,
                    addr = %addr,
                    error = %e,
                    "server terminated with error"
                );
            })?;

        info!(component = "server", event = "stopped", name = name, addr = %addr, "server stopped");
        Ok(())
    }

    fn outer_layers(router: Router, timeout: Duration) -> Router {
        router.layer(TimeoutLayer::new(timeout)).layer(
            TraceLayer::new_for_http().make_span_with(|req: &Request| -> Span {
                info_span!(
                    "request",
                    component = "http",
                    method = %req.method(),
                    path = %req.uri().path(),
                )
            }),
        )
    }
}
