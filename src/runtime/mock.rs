//! In-memory container runtime.
//!
//! Simulates containers, images and named volumes without a daemon. Used by the
//! test suite and by `runtime.kind: mock` for local development.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use super::{ContainerInfo, ContainerStatus, ExecOutput, RunSpec, Runtime, RuntimeError};

#[derive(Debug, Clone)]
struct MockContainer {
    id: String,
    spec: RunSpec,
    status: ContainerStatus,
}

#[derive(Debug, Default)]
struct State {
    containers: HashMap<String, MockContainer>,
    images: HashSet<String>,
    volumes: HashSet<String>,
    pulls: Vec<String>,
    calls: Vec<String>,
    exec_result: Option<Result<ExecOutput, String>>,
    fail_pull: Option<String>,
    fail_run: Option<String>,
}

/// MockRuntime keeps all runtime state behind a single lock.
#[derive(Debug, Default)]
pub struct MockRuntime {
    state: Mutex<State>,
}

impl MockRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks an image reference as already present locally.
    pub fn add_image(&self, reference: &str) {
        self.state.lock().images.insert(reference.to_string());
    }

    /// Places a container directly, bypassing `run`.
    pub fn add_container(&self, name: &str, status: ContainerStatus) {
        let spec = RunSpec {
            image: String::new(),
            name: name.to_string(),
            env: Vec::new(),
            volume: super::VolumeBinding {
                volume: String::new(),
                target: String::new(),
                read_only: false,
            },
            port: super::PortBinding {
                container_port: 0,
                host_port: 0,
            },
            restart_policy: super::RestartPolicy::No,
        };
        self.state.lock().containers.insert(
            name.to_string(),
            MockContainer {
                id: Uuid::new_v4().to_string(),
                spec,
                status,
            },
        );
    }

    /// Sets the outcome of every subsequent `exec`. `Err` simulates a transport failure.
    pub fn set_exec_result(&self, result: Result<ExecOutput, String>) {
        self.state.lock().exec_result = Some(result);
    }

    /// Makes every subsequent pull fail with `message`.
    pub fn fail_pulls(&self, message: &str) {
        self.state.lock().fail_pull = Some(message.to_string());
    }

    /// Makes every subsequent `run` fail with `message`.
    pub fn fail_runs(&self, message: &str) {
        self.state.lock().fail_run = Some(message.to_string());
    }

    /// Spec of the container currently registered under `name`.
    pub fn container_spec(&self, name: &str) -> Option<RunSpec> {
        self.state.lock().containers.get(name).map(|c| c.spec.clone())
    }

    pub fn container_count(&self) -> usize {
        self.state.lock().containers.len()
    }

    pub fn volumes(&self) -> Vec<String> {
        let mut volumes: Vec<String> = self.state.lock().volumes.iter().cloned().collect();
        volumes.sort();
        volumes
    }

    /// Images pulled so far, as `name[:tag]`.
    pub fn pulls(&self) -> Vec<String> {
        self.state.lock().pulls.clone()
    }

    /// Every runtime call made so far, as `op:target`.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    fn record(state: &mut State, op: &str, target: &str) {
        state.calls.push(format!("{}:{}", op, target));
    }
}

#[async_trait]
impl Runtime for MockRuntime {
    async fn get_container(&self, name: &str) -> Result<Option<ContainerInfo>, RuntimeError> {
        let mut state = self.state.lock();
        Self::record(&mut state, "get", name);
        Ok(state.containers.get(name).map(|c| ContainerInfo {
            id: c.id.clone(),
            name: name.to_string(),
            status: c.status,
        }))
    }

    async fn run(&self, spec: &RunSpec) -> Result<ContainerInfo, RuntimeError> {
        let mut state = self.state.lock();
        Self::record(&mut state, "run", &spec.name);

        if let Some(message) = &state.fail_run {
            return Err(RuntimeError::Api(message.clone()));
        }
        if state.containers.contains_key(&spec.name) {
            return Err(RuntimeError::Api(format!(
                "Conflict. The container name \"/{}\" is already in use",
                spec.name
            )));
        }
        if !state.images.contains(&spec.image) {
            return Err(RuntimeError::NotFound(format!("No such image: {}", spec.image)));
        }

        let container = MockContainer {
            id: Uuid::new_v4().to_string(),
            spec: spec.clone(),
            status: ContainerStatus::Running,
        };
        let info = ContainerInfo {
            id: container.id.clone(),
            name: spec.name.clone(),
            status: container.status,
        };
        state.volumes.insert(spec.volume.volume.clone());
        state.containers.insert(spec.name.clone(), container);

        info!(component = "mock_runtime", event = "container_started", container = %spec.name);
        Ok(info)
    }

    async fn start(&self, name: &str) -> Result<(), RuntimeError> {
        let mut state = self.state.lock();
        Self::record(&mut state, "start", name);
        match state.containers.get_mut(name) {
            Some(container) => {
                container.status = ContainerStatus::Running;
                Ok(())
            }
            None => Err(RuntimeError::NotFound(format!("No such container: {}", name))),
        }
    }

    async fn stop(&self, name: &str, _grace: Duration) -> Result<(), RuntimeError> {
        let mut state = self.state.lock();
        Self::record(&mut state, "stop", name);
        match state.containers.get_mut(name) {
            Some(container) => {
                container.status = ContainerStatus::Exited;
                Ok(())
            }
            None => Err(RuntimeError::NotFound(format!("No such container: {}", name))),
        }
    }

    async fn remove(&self, name: &str) -> Result<(), RuntimeError> {
        let mut state = self.state.lock();
        Self::record(&mut state, "remove", name);
        match state.containers.get(name).map(|c| c.status) {
            Some(ContainerStatus::Running) => Err(RuntimeError::Api(format!(
                "You cannot remove a running container {}",
                name
            ))),
            Some(_) => {
                state.containers.remove(name);
                Ok(())
            }
            None => Err(RuntimeError::NotFound(format!("No such container: {}", name))),
        }
    }

    async fn exec(&self, name: &str, cmd: &[String], user: &str) -> Result<ExecOutput, RuntimeError> {
        let mut state = self.state.lock();
        Self::record(&mut state, "exec", name);

        match state.containers.get(name).map(|c| c.status) {
            Some(ContainerStatus::Running) => {}
            Some(status) => {
                return Err(RuntimeError::Api(format!(
                    "container {} is not running ({})",
                    name, status
                )))
            }
            None => return Err(RuntimeError::NotFound(format!("No such container: {}", name))),
        }

        match &state.exec_result {
            Some(Ok(output)) => Ok(output.clone()),
            Some(Err(message)) => Err(RuntimeError::Transport(message.clone())),
            None => Ok(ExecOutput {
                exit_code: 0,
                output: format!("{} ran {:?}", user, cmd),
            }),
        }
    }

    async fn has_image(&self, reference: &str) -> Result<bool, RuntimeError> {
        let mut state = self.state.lock();
        Self::record(&mut state, "get_image", reference);
        Ok(state.images.contains(reference))
    }

    async fn pull_image(&self, name: &str, tag: Option<&str>) -> Result<(), RuntimeError> {
        let mut state = self.state.lock();
        let reference = match tag {
            Some(tag) => format!("{}:{}", name, tag),
            None => name.to_string(),
        };
        Self::record(&mut state, "pull", &reference);

        if let Some(message) = &state.fail_pull {
            return Err(RuntimeError::Api(message.clone()));
        }

        state.pulls.push(reference.clone());
        state.images.insert(reference);
        Ok(())
    }

    async fn ping(&self) -> Result<(), RuntimeError> {
        Ok(())
    }
}
