//! Prometheus metrics functionality.
//
//! Metric names and recording helpers live in `meter`; the exporter handle
//! is installed by `controller::metrics` and rendered on `/metrics`.

pub mod meter;

// Re-export commonly used items
pub use meter::*;
