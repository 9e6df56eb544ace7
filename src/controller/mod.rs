// HTTP API controllers for server management endpoints.

pub mod command;
pub mod config;
pub mod controller;
pub mod lifecycle;
pub mod metrics;
pub mod players;
pub mod probe;
pub mod servers;
pub mod update;
pub mod view;

// Re-export controller types for convenience
pub use command::CommandController;
pub use config::ShowConfigController;
pub use lifecycle::LifecycleController;
pub use metrics::PrometheusMetricsController;
pub use players::PlayersController;
pub use probe::LivenessProbeController;
pub use servers::ServersController;
pub use update::UpdateController;
