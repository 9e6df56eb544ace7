#[path = "k8s/probe/liveness/mod.rs"]
pub mod liveness;
#[path = "shared/rate/mod.rs"]
pub mod rate;
#[cfg(test)]
mod tests;

#[cfg(test)]
pub use tests::support;

pub mod app;
pub mod config;
pub mod controller;
pub mod http;
pub mod metrics;
pub mod middleware;
pub mod orchestrator;
pub mod runtime;
pub mod shutdown;
pub mod store;
