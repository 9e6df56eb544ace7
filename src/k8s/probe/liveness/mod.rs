// Package liveness provides Kubernetes liveness probe functionality.

use async_trait::async_trait;
use futures::future::join_all;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::warn;

pub mod error;
pub mod prober;
pub mod service;

#[cfg(test)]
mod probe_test;

pub use error::TimeoutIsTooShortError;
pub use prober::Prober;
pub use service::Service;

const MIN_TIMEOUT: Duration = Duration::from_millis(1);

/// Liveness probe implementation
pub struct Probe {
    services: RwLock<Vec<Arc<dyn Service>>>,
    timeout: Duration,
}

impl Probe {
    /// Creates a new liveness probe
    pub fn new(timeout_duration: Duration) -> Self {
        let timeout = if timeout_duration < MIN_TIMEOUT {
            warn!(
                component = "liveness",
                error = %TimeoutIsTooShortError,
                "min timeout duration is 1ms (timeout set up as 10ms as a more reasonable value)"
            );
            Duration::from_millis(10)
        } else {
            timeout_duration
        };

        Self {
            services: RwLock::new(Vec::new()),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl Prober for Probe {
    fn watch(&self, services: Vec<Arc<dyn Service>>) {
        *self.services.write() = services;
    }

    async fn is_alive(&self) -> bool {
        let services = self.services.read().clone();
        if services.is_empty() {
            return false;
        }

        let checks = join_all(services.iter().map(|s| s.is_alive()));
        match timeout(self.timeout, checks).await {
            Ok(results) => results.into_iter().all(|alive| alive),
            Err(_) => {
                warn!(
                    component = "liveness",
                    event = "deadline_exceeded",
                    timeout = ?self.timeout,
                    "liveness probe deadline exceeded while checking services"
                );
                false
            }
        }
    }
}
