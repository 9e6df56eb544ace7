// Package api provides liveness probe controller.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;

use crate::http::Controller;
use crate::liveness::Prober;

pub const PROBE_PATH: &str = "/k8s/probe";

const SUCCESS_RESPONSE: &str = r#"{
  "status": 200,
  "message": "I'm fine :D"
}"#;

const FAILED_RESPONSE: &str = r#"{
  "status": 503,
  "message": "I'm tired :("
}"#;

/// LivenessProbeController handles Kubernetes liveness probes.
#[derive(Clone)]
pub struct LivenessProbeController {
    probe: Arc<dyn Prober>,
}

impl LivenessProbeController {
    /// Creates a new liveness probe controller.
    pub fn new(probe: Arc<dyn Prober>) -> Self {
        Self { probe }
    }

    /// Handles the probe request.
    async fn probe(&self) -> Response {
        let (status, body) = if self.probe.is_alive().await {
            (StatusCode::OK, SUCCESS_RESPONSE)
        } else {
            (StatusCode::SERVICE_UNAVAILABLE, FAILED_RESPONSE)
        };
        (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
    }
}

impl Controller for LivenessProbeController {
    fn add_route(&self, router: Router) -> Router {
        let probe_controller = self.clone();
        router.route(
            PROBE_PATH,
            get(move || {
                let controller = probe_controller.clone();
                async move { controller.probe().await }
            }),
        )
    }
}
