// Service trait for liveness checking

use async_trait::async_trait;

/// Service interface for liveness checking
#[async_trait]
pub trait Service: Send + Sync {
    /// Checks if the service is alive
    async fn is_alive(&self) -> bool;
}
