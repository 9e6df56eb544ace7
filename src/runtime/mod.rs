// Package runtime provides the container runtime interface.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub mod docker;
pub mod mock;

#[cfg(test)]
mod mock_test;

pub use docker::DockerRuntime;
pub use mock::MockRuntime;

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("no such object: {0}")]
    NotFound(String),
    #[error("container runtime API error: {0}")]
    Api(String),
    #[error("container runtime transport error: {0}")]
    Transport(String),
}

/// Container state as reported by the runtime.
///
/// `Stopped` is never reported by a runtime: it stands for "no container".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerStatus {
    Created,
    Running,
    Paused,
    Restarting,
    Removing,
    Exited,
    Dead,
    Stopped,
    Unknown,
}

impl ContainerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerStatus::Created => "created",
            ContainerStatus::Running => "running",
            ContainerStatus::Paused => "paused",
            ContainerStatus::Restarting => "restarting",
            ContainerStatus::Removing => "removing",
            ContainerStatus::Exited => "exited",
            ContainerStatus::Dead => "dead",
            ContainerStatus::Stopped => "stopped",
            ContainerStatus::Unknown => "unknown",
        }
    }

    pub fn is_running(&self) -> bool {
        *self == ContainerStatus::Running
    }

    /// No process left to stop.
    pub fn is_halted(&self) -> bool {
        matches!(
            self,
            ContainerStatus::Created
                | ContainerStatus::Exited
                | ContainerStatus::Dead
                | ContainerStatus::Stopped
        )
    }
}

impl fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime-side view of a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerInfo {
    pub id: String,
    pub name: String,
    pub status: ContainerStatus,
}

/// Named volume mounted into a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeBinding {
    pub volume: String,
    pub target: String,
    pub read_only: bool,
}

/// Container port published on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortBinding {
    pub container_port: u16,
    pub host_port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartPolicy {
    No,
    UnlessStopped,
}

/// Everything needed to create and start a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSpec {
    pub image: String,
    pub name: String,
    pub env: Vec<(String, String)>,
    pub volume: VolumeBinding,
    pub port: PortBinding,
    pub restart_policy: RestartPolicy,
}

/// Result of a command executed inside a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutput {
    pub exit_code: i64,
    pub output: String,
}

impl ExecOutput {
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runtime defines the container operations the orchestrator relies on.
#[async_trait]
pub trait Runtime: Send + Sync {
    /// Looks a container up by name. `None` when it does not exist.
    async fn get_container(&self, name: &str) -> Result<Option<ContainerInfo>, RuntimeError>;

    /// Creates and starts a container.
    async fn run(&self, spec: &RunSpec) -> Result<ContainerInfo, RuntimeError>;

    /// Starts an existing, stopped container.
    async fn start(&self, name: &str) -> Result<(), RuntimeError>;

    /// Stops a running container, killing it once `grace` has elapsed.
    async fn stop(&self, name: &str, grace: Duration) -> Result<(), RuntimeError>;

    /// Removes a container. Named volumes are left in place.
    async fn remove(&self, name: &str) -> Result<(), RuntimeError>;

    /// Executes `cmd` inside the container as `user`.
    async fn exec(&self, name: &str, cmd: &[String], user: &str) -> Result<ExecOutput, RuntimeError>;

    /// Reports whether the image reference is present locally.
    async fn has_image(&self, reference: &str) -> Result<bool, RuntimeError>;

    /// Pulls an image from its registry. No tag means the registry default.
    async fn pull_image(&self, name: &str, tag: Option<&str>) -> Result<(), RuntimeError>;

    /// Checks that the runtime is reachable.
    async fn ping(&self) -> Result<(), RuntimeError>;
}
