use std::time::Duration;

use crate::runtime::{ContainerStatus, RuntimeError};

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("container not found for server {0}")]
    ContainerNotFound(String),
    #[error("server {id} is not running ({status})")]
    NotRunning { id: String, status: ContainerStatus },
    #[error("failed to pull image {image}: {source}")]
    ImagePull {
        image: String,
        #[source]
        source: RuntimeError,
    },
    #[error("failed to provision server {id}: {source}")]
    Provision {
        id: String,
        #[source]
        source: RuntimeError,
    },
    #[error("command failed with exit code {exit_code}: {output}")]
    CommandFailed { exit_code: i64, output: String },
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    #[error("runtime call {op} timed out after {after:?}")]
    Timeout { op: &'static str, after: Duration },
}
