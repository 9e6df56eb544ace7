// Package liveness provides the Prober trait for liveness checking.

use async_trait::async_trait;
use std::sync::Arc;

use super::Service;

/// Prober can handle services/applications.
#[async_trait]
pub trait Prober: Send + Sync {
    /// Registers the services to check. Replaces any previous set.
    fn watch(&self, services: Vec<Arc<dyn Service>>);

    /// Checks whether every watched service is alive.
    async fn is_alive(&self) -> bool;
}
