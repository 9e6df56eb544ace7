//! Metrics controller.

use axum::{http::StatusCode, response::IntoResponse, routing::get, Router};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use metrics_process::Collector;
use std::sync::OnceLock;

use crate::http::Controller;

pub const PROMETHEUS_METRICS_PATH: &str = "/metrics";

/// Global Prometheus handle for rendering metrics. `None` when the recorder
/// could not be installed.
static PROMETHEUS_HANDLE: OnceLock<Option<PrometheusHandle>> = OnceLock::new();
static PROC_COLLECTOR: OnceLock<Collector> = OnceLock::new();

/// Installs the Prometheus recorder as the global `metrics` recorder.
/// Safe to call more than once; only the first call installs.
pub fn init_prometheus_exporter() -> Option<&'static PrometheusHandle> {
    PROMETHEUS_HANDLE
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                // Process CPU/RSS/fd gauges, refreshed on every scrape.
                let collector = Collector::default();
                collector.describe();
                let _ = PROC_COLLECTOR.set(collector);
                Some(handle)
            }
            Err(e) => {
                tracing::warn!(
                    component = "metrics",
                    event = "install_failed",
                    error = %e,
                    "prometheus recorder not installed, /metrics will be empty"
                );
                None
            }
        })
        .as_ref()
}

/// PrometheusMetricsController handles Prometheus metrics endpoint.
#[derive(Debug, Default)]
pub struct PrometheusMetricsController;

impl PrometheusMetricsController {
    /// Creates a new Prometheus metrics controller.
    pub fn new() -> Self {
        Self
    }

    /// Handles the metrics request.
    async fn get_metrics() -> impl IntoResponse {
        if let Some(collector) = PROC_COLLECTOR.get() {
            collector.collect();
        }
        let body = PROMETHEUS_HANDLE
            .get()
            .and_then(Option::as_ref)
            .map(PrometheusHandle::render)
            .unwrap_or_default();

        (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
    }
}

impl Controller for PrometheusMetricsController {
    fn add_route(&self, router: Router) -> Router {
        router.route(PROMETHEUS_METRICS_PATH, get(Self::get_metrics))
    }
}
