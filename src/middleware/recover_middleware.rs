//! Panic recovery middleware.
//

use axum::response::{IntoResponse, Response};
use std::any::Any;
use tower_http::catch_panic::CatchPanicLayer;
use tracing::error;

use crate::http::ApiError;
use crate::metrics;

/// Turns a handler panic into a JSON 500.
fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    metrics::inc_panics();
    error!(
        component = "http",
        event = "panic_recovered",
        panic = %details,
        "handler panicked"
    );

    ApiError::Internal("internal server error".to_string()).into_response()
}

/// PanicRecoverMiddleware recovers from panics in HTTP handlers.
#[derive(Debug, Default)]
pub struct PanicRecoverMiddleware;

impl PanicRecoverMiddleware {
    /// Creates a new panic recovery middleware.
    pub fn new() -> Self {
        Self
    }
}

// Implementation of Middleware trait
impl crate::middleware::middleware::Middleware for PanicRecoverMiddleware {
    fn apply(&self, router: axum::Router) -> axum::Router {
        router.layer(CatchPanicLayer::custom(handle_panic))
    }
}
