//! Container lifecycle orchestration.
//!
//! Reconciles a server record (version, memory, port) with the container that
//! backs it: image acquisition, provisioning, replacement on update and
//! best-effort probing of a live container, plus start and stop of an existing
//! container. Mutations of the same server id are serialized; every runtime
//! call is bounded by a deadline.

pub mod error;
pub mod naming;
pub mod players;
pub mod state;


pub use error::OrchestratorError;
pub use naming::{container_name, image_reference, volume_name};
pub use players::parse_player_list;
pub use state::{Lifecycle, LifecycleTracker, ServerState};

use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::metrics;
use crate::runtime::{
    ContainerInfo, ContainerStatus, PortBinding, RestartPolicy, RunSpec, Runtime, RuntimeError,
    VolumeBinding,
};

/// Orchestrator tunables, resolved from the `runtime` config section.
#[derive(Debug, Clone)]
pub struct Settings {
    pub base_image: String,
    pub data_path: String,
    pub game_port: u16,
    pub exec_user: String,
    pub console_command: String,
    pub timeout: Duration,
    pub pull_timeout: Duration,
    /// Time the game gets to save and exit before the runtime kills it.
    pub stop_grace: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_image: "itzg/minecraft-server".to_string(),
            data_path: "/data".to_string(),
            game_port: 25565,
            exec_user: "minecraft".to_string(),
            console_command: "mc-send-to-console".to_string(),
            timeout: Duration::from_secs(30),
            pull_timeout: Duration::from_secs(600),
            stop_grace: Duration::from_secs(30),
        }
    }
}

/// Reports whether `memory` is a heap size such as `512M`, `2G` or `4g`.
/// Units follow the JVM `-Xmx` syntax and are case-insensitive.
pub fn is_valid_memory(memory: &str) -> bool {
    match memory.char_indices().last() {
        Some((idx, unit)) if matches!(unit.to_ascii_uppercase(), 'K' | 'M' | 'G') => {
            idx > 0 && memory[..idx].bytes().all(|b| b.is_ascii_digit())
        }
        _ => false,
    }
}

pub struct Orchestrator {
    runtime: Arc<dyn Runtime>,
    settings: Settings,
    lifecycle: LifecycleTracker,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl Orchestrator {
    pub fn new(runtime: Arc<dyn Runtime>, settings: Settings) -> Self {
        Self {
            runtime,
            settings,
            lifecycle: LifecycleTracker::new(),
            locks: DashMap::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn lifecycle(&self) -> &LifecycleTracker {
        &self.lifecycle
    }

    /// Live container status. `Stopped` when no container exists.
    pub async fn status(&self, id: &str) -> Result<ContainerStatus, OrchestratorError> {
        let name = container_name(id);
        let container = self
            .bounded("get", self.settings.timeout, self.runtime.get_container(&name))
            .await?;
        Ok(container.map(|c| c.status).unwrap_or(ContainerStatus::Stopped))
    }

    /// Names of the players currently online.
    ///
    /// Fails only when the container does not exist. A stopped container or a
    /// failed console probe yields an empty list.
    pub async fn list_players(&self, id: &str) -> Result<Vec<String>, OrchestratorError> {
        let name = container_name(id);
        let container = self
            .bounded("get", self.settings.timeout, self.runtime.get_container(&name))
            .await?
            .ok_or_else(|| OrchestratorError::ContainerNotFound(id.to_string()))?;

        if !container.status.is_running() {
            return Ok(Vec::new());
        }

        let cmd = vec![self.settings.console_command.clone(), "list".to_string()];
        let result = self
            .bounded(
                "exec",
                self.settings.timeout,
                self.runtime.exec(&name, &cmd, &self.settings.exec_user),
            )
            .await;

        match result {
            Ok(out) if out.is_success() => Ok(parse_player_list(&out.output)),
            Ok(out) => {
                metrics::inc_player_probe_failures();
                warn!(
                    component = "orchestrator",
                    event = "player_probe_failed",
                    server_id = %id,
                    exit_code = out.exit_code,
                    output = %out.output.trim(),
                    "player listing exited with non-zero code"
                );
                Ok(Vec::new())
            }
            Err(e) => {
                metrics::inc_player_probe_failures();
                warn!(
                    component = "orchestrator",
                    event = "player_probe_failed",
                    server_id = %id,
                    error = %e,
                    "player listing failed"
                );
                Ok(Vec::new())
            }
        }
    }

    /// Creates and starts the container for `id`, pulling the image if needed.
    pub async fn provision(
        &self,
        id: &str,
        version: &str,
        memory: &str,
        port: u16,
    ) -> Result<ContainerInfo, OrchestratorError> {
        self.serialized(id, async {
            let result = self.provision_locked(id, version, memory, port).await;
            metrics::inc_provisions(result.is_ok());
            result
        })
        .await
    }

    /// Tears down the current container for `id` and provisions a new one.
    ///
    /// The data volume survives. Not transactional: a failure after teardown
    /// leaves the server without a container and in the `Failed` state.
    pub async fn replace(
        &self,
        id: &str,
        version: &str,
        memory: &str,
        port: u16,
    ) -> Result<ContainerInfo, OrchestratorError> {
        self.replace_then(id, version, memory, port, || async { Ok(()) })
            .await
    }

    /// Like [`Orchestrator::replace`], then runs `commit` before releasing the
    /// per-server lock. `commit` runs only when the replacement succeeded, so
    /// whatever it records always matches the container left running.
    pub async fn replace_then<E, F, Fut>(
        &self,
        id: &str,
        version: &str,
        memory: &str,
        port: u16,
        commit: F,
    ) -> Result<ContainerInfo, E>
    where
        E: From<OrchestratorError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        self.serialized(id, async move {
            let info = self.replace_locked(id, version, memory, port).await?;
            commit().await?;
            Ok::<_, E>(info)
        })
        .await
    }

    /// Starts the stopped container of `id`. Without a container one is
    /// provisioned from `version`, `memory` and `port`. A running container is
    /// returned as is.
    pub async fn start(
        &self,
        id: &str,
        version: &str,
        memory: &str,
        port: u16,
    ) -> Result<ContainerInfo, OrchestratorError> {
        self.serialized(id, self.start_locked(id, version, memory, port))
            .await
    }

    /// Stops the container of `id` within `stop_grace`. The container and its
    /// volume are kept so a later start resumes the same world.
    pub async fn stop(&self, id: &str) -> Result<ContainerInfo, OrchestratorError> {
        self.serialized(id, self.stop_locked(id)).await
    }

    /// Runs a console command in the running container and returns its output.
    pub async fn send_command(&self, id: &str, command: &str) -> Result<String, OrchestratorError> {
        self.serialized(id, self.send_command_locked(id, command))
            .await
    }

    /// Checks that the container runtime answers.
    pub async fn ping(&self) -> Result<(), OrchestratorError> {
        self.bounded("ping", self.settings.timeout, self.runtime.ping())
            .await
    }

    async fn replace_locked(
        &self,
        id: &str,
        version: &str,
        memory: &str,
        port: u16,
    ) -> Result<ContainerInfo, OrchestratorError> {
        self.lifecycle.transition(id, ServerState::ReplacePending);

        let result = match self.teardown(id).await {
            Ok(()) => self.provision_locked(id, version, memory, port).await,
            Err(e) => {
                self.lifecycle.transition(id, ServerState::Failed);
                Err(e)
            }
        };

        metrics::inc_replacements(result.is_ok());
        if let Err(e) = &result {
            error!(
                component = "orchestrator",
                event = "replace_failed",
                server_id = %id,
                version = %version,
                error = %e,
                "replacement failed; live state may diverge from the stored record"
            );
        }
        result
    }

    async fn start_locked(
        &self,
        id: &str,
        version: &str,
        memory: &str,
        port: u16,
    ) -> Result<ContainerInfo, OrchestratorError> {
        let name = container_name(id);
        let Some(container) = self
            .bounded("get", self.settings.timeout, self.runtime.get_container(&name))
            .await?
        else {
            let result = self.provision_locked(id, version, memory, port).await;
            metrics::inc_provisions(result.is_ok());
            return result;
        };

        if container.status.is_running() {
            return Ok(container);
        }

        if let Err(e) = self
            .bounded("start", self.settings.timeout, self.runtime.start(&name))
            .await
        {
            self.lifecycle.transition(id, ServerState::Failed);
            return Err(e);
        }
        self.lifecycle.transition(id, ServerState::Running);

        info!(
            component = "orchestrator",
            event = "started",
            server_id = %id,
            container = %name,
            from = %container.status,
            "server container started"
        );
        Ok(ContainerInfo {
            status: ContainerStatus::Running,
            ..container
        })
    }

    async fn stop_locked(&self, id: &str) -> Result<ContainerInfo, OrchestratorError> {
        let name = container_name(id);
        let container = self
            .bounded("get", self.settings.timeout, self.runtime.get_container(&name))
            .await?
            .ok_or_else(|| OrchestratorError::ContainerNotFound(id.to_string()))?;

        if container.status.is_halted() {
            return Ok(container);
        }

        self.halt(&name).await?;
        self.lifecycle.transition(id, ServerState::Stopped);

        info!(
            component = "orchestrator",
            event = "stopped",
            server_id = %id,
            container = %name,
            "server container stopped, container and volume kept"
        );
        Ok(ContainerInfo {
            status: ContainerStatus::Exited,
            ..container
        })
    }

    async fn send_command_locked(&self, id: &str, command: &str) -> Result<String, OrchestratorError> {
        let name = container_name(id);
        let container = self
            .bounded("get", self.settings.timeout, self.runtime.get_container(&name))
            .await?
            .ok_or_else(|| OrchestratorError::ContainerNotFound(id.to_string()))?;

        if !container.status.is_running() {
            return Err(OrchestratorError::NotRunning {
                id: id.to_string(),
                status: container.status,
            });
        }

        let mut cmd = vec![self.settings.console_command.clone()];
        cmd.extend(command.split_whitespace().map(str::to_string));

        let out = self
            .bounded(
                "exec",
                self.settings.timeout,
                self.runtime.exec(&name, &cmd, &self.settings.exec_user),
            )
            .await?;

        if !out.is_success() {
            return Err(OrchestratorError::CommandFailed {
                exit_code: out.exit_code,
                output: out.output.trim().to_string(),
            });
        }

        info!(
            component = "orchestrator",
            event = "command_sent",
            server_id = %id,
            command = %command,
            "console command executed"
        );
        Ok(out.output.trim().to_string())
    }

    async fn provision_locked(
        &self,
        id: &str,
        version: &str,
        memory: &str,
        port: u16,
    ) -> Result<ContainerInfo, OrchestratorError> {
        self.lifecycle.transition(id, ServerState::Provisioning);

        let result = self.provision_steps(id, version, memory, port).await;
        match &result {
            Ok(info) => {
                self.lifecycle.transition(id, ServerState::Running);
                info!(
                    component = "orchestrator",
                    event = "provisioned",
                    server_id = %id,
                    container = %info.name,
                    version = %version,
                    port = port,
                    "server container started"
                );
            }
            Err(e) => {
                self.lifecycle.transition(id, ServerState::Failed);
                error!(
                    component = "orchestrator",
                    event = "provision_failed",
                    server_id = %id,
                    version = %version,
                    error = %e,
                    "failed to provision server container"
                );
            }
        }
        result
    }

    async fn provision_steps(
        &self,
        id: &str,
        version: &str,
        memory: &str,
        port: u16,
    ) -> Result<ContainerInfo, OrchestratorError> {
        let image = image_reference(&self.settings.base_image, version);
        self.ensure_image(&image, version).await?;

        let spec = RunSpec {
            image,
            name: container_name(id),
            env: vec![
                ("EULA".to_string(), "TRUE".to_string()),
                ("MEMORY".to_string(), memory.to_string()),
            ],
            volume: VolumeBinding {
                volume: volume_name(id),
                target: self.settings.data_path.clone(),
                read_only: false,
            },
            port: PortBinding {
                container_port: self.settings.game_port,
                host_port: port,
            },
            restart_policy: RestartPolicy::UnlessStopped,
        };

        self.bounded("run", self.settings.timeout, self.runtime.run(&spec))
            .await
            .map_err(|e| match e {
                OrchestratorError::Runtime(source) => OrchestratorError::Provision {
                    id: id.to_string(),
                    source,
                },
                other => other,
            })
    }

    async fn ensure_image(&self, image: &str, version: &str) -> Result<(), OrchestratorError> {
        let present = self
            .bounded("get_image", self.settings.timeout, self.runtime.has_image(image))
            .await?;
        if present {
            return Ok(());
        }

        info!(
            component = "orchestrator",
            event = "image_pull",
            image = %image,
            "image not present locally, pulling"
        );

        let result = self
            .bounded(
                "pull",
                self.settings.pull_timeout,
                self.runtime
                    .pull_image(&self.settings.base_image, naming::pull_tag(version)),
            )
            .await;
        metrics::inc_image_pulls(result.is_ok());

        result.map_err(|e| match e {
            OrchestratorError::Runtime(source) => OrchestratorError::ImagePull {
                image: image.to_string(),
                source,
            },
            other => other,
        })
    }

    async fn teardown(&self, id: &str) -> Result<(), OrchestratorError> {
        let name = container_name(id);
        let Some(container) = self
            .bounded("get", self.settings.timeout, self.runtime.get_container(&name))
            .await?
        else {
            return Ok(());
        };

        if !container.status.is_halted() {
            self.ignore_missing(self.halt(&name).await)?;
        }
        self.ignore_missing(
            self.bounded("remove", self.settings.timeout, self.runtime.remove(&name))
                .await,
        )?;

        info!(
            component = "orchestrator",
            event = "container_removed",
            server_id = %id,
            container = %name,
            "old container removed, data volume kept"
        );
        Ok(())
    }

    fn ignore_missing(&self, result: Result<(), OrchestratorError>) -> Result<(), OrchestratorError> {
        match result {
            Err(OrchestratorError::Runtime(RuntimeError::NotFound(_))) => Ok(()),
            other => other,
        }
    }

    /// Stops `name`, allowing the runtime deadline on top of the grace period.
    async fn halt(&self, name: &str) -> Result<(), OrchestratorError> {
        let grace = self.settings.stop_grace;
        self.bounded(
            "stop",
            self.settings.timeout + grace,
            self.runtime.stop(name, grace),
        )
        .await
    }

    /// Runs `op` holding the lock of `id`. The lock entry is dropped again once
    /// nobody else holds or waits for it.
    async fn serialized<T>(&self, id: &str, op: impl Future<Output = T>) -> T {
        let lock = self.lock_for(id);
        let out = {
            let _guard = lock.lock().await;
            op.await
        };
        drop(lock);
        self.locks.remove_if(id, |_, lock| Arc::strong_count(lock) == 1);
        out
    }

    fn lock_for(&self, id: &str) -> Arc<Mutex<()>> {
        self.locks.entry(id.to_string()).or_default().clone()
    }

    #[cfg(test)]
    pub(crate) fn tracked_locks(&self) -> usize {
        self.locks.len()
    }

    async fn bounded<T, F>(
        &self,
        op: &'static str,
        limit: Duration,
        fut: F,
    ) -> Result<T, OrchestratorError>
    where
        F: Future<Output = Result<T, RuntimeError>>,
    {
        match tokio::time::timeout(limit, fut).await {
            Ok(result) => result.map_err(OrchestratorError::from),
            Err(_) => {
                metrics::inc_runtime_timeouts(op);
                warn!(
                    component = "orchestrator",
                    event = "runtime_timeout",
                    op = op,
                    after = ?limit,
                    "runtime call timed out"
                );
                Err(OrchestratorError::Timeout { op, after: limit })
            }
        }
    }
}
