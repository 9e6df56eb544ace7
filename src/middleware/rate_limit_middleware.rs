//! Rate-limit gate in front of the `/api/` routes.

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use crate::http::ApiError;
use crate::metrics;
use crate::middleware::middleware::Middleware;
use crate::rate::Limiter;

pub const API_PREFIX: &str = "/api/";
const UNKNOWN_CLIENT: &str = "unknown";

/// RateLimitMiddleware admits or rejects `/api/` requests per client IP.
pub struct RateLimitMiddleware {
    limiter: Arc<Limiter>,
}

impl RateLimitMiddleware {
    pub fn new(limiter: Arc<Limiter>) -> Self {
        Self { limiter }
    }
}

/// Remote IP of the request, or `"unknown"` when no peer address is attached.
fn client_id(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

async fn rate_limit(State(limiter): State<Arc<Limiter>>, request: Request, next: Next) -> Response {
    if !request.uri().path().starts_with(API_PREFIX) {
        return next.run(request).await;
    }

    let client = client_id(&request);
    if limiter.admit(&client, Instant::now()) {
        return next.run(request).await;
    }

    metrics::inc_rate_limited();
    debug!(
        component = "rate_limiter",
        event = "rejected",
        client = %client,
        path = %request.uri().path(),
        "request rate limited"
    );

    let window = limiter.time_window();
    let retry_after = window.as_secs() + u64::from(window.subsec_nanos() > 0);
    ApiError::RateLimited { retry_after }.into_response()
}

impl Middleware for RateLimitMiddleware {
    fn apply(&self, router: Router) -> Router {
        router.layer(axum::middleware::from_fn_with_state(
            self.limiter.clone(),
            rate_limit,
        ))
    }
}
