// Docker Engine implementation of the container runtime.

use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, InspectContainerOptions, RemoveContainerOptions,
    StartContainerOptions, StopContainerOptions,
};
use bollard::errors::Error as DockerError;
use bollard::exec::{CreateExecOptions, StartExecResults};
use bollard::image::CreateImageOptions;
use bollard::models::{
    ContainerStateStatusEnum, HostConfig, PortBinding as DockerPortBinding,
    RestartPolicy as DockerRestartPolicy, RestartPolicyNameEnum,
};
use bollard::Docker;
use futures::{StreamExt, TryStreamExt};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{
    ContainerInfo, ContainerStatus, ExecOutput, RestartPolicy, RunSpec, Runtime, RuntimeError,
};

const DEFAULT_TAG: &str = "latest";

/// DockerRuntime talks to the local Docker daemon.
pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    /// Connects using the local defaults (unix socket, or DOCKER_HOST when set).
    pub fn connect() -> Result<Self, RuntimeError> {
        let docker = Docker::connect_with_local_defaults().map_err(map_err)?;
        Ok(Self { docker })
    }

    async fn inspect(&self, name: &str) -> Result<Option<ContainerInfo>, RuntimeError> {
        match self
            .docker
            .inspect_container(name, None::<InspectContainerOptions>)
            .await
        {
            Ok(resp) => {
                let status = resp
                    .state
                    .and_then(|state| state.status)
                    .map(map_status)
                    .unwrap_or(ContainerStatus::Unknown);
                Ok(Some(ContainerInfo {
                    id: resp.id.unwrap_or_default(),
                    name: name.to_string(),
                    status,
                }))
            }
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(map_err(e)),
        }
    }

    fn container_config(spec: &RunSpec) -> Config<String> {
        let port_key = format!("{}/tcp", spec.port.container_port);

        let mut exposed_ports = HashMap::new();
        exposed_ports.insert(port_key.clone(), HashMap::new());

        let mut port_bindings = HashMap::new();
        port_bindings.insert(
            port_key,
            Some(vec![DockerPortBinding {
                host_ip: Some("0.0.0.0".to_string()),
                host_port: Some(spec.port.host_port.to_string()),
            }]),
        );

        let mode = if spec.volume.read_only { "ro" } else { "rw" };
        let bind = format!("{}:{}:{}", spec.volume.volume, spec.volume.target, mode);

        let restart_policy = match spec.restart_policy {
            RestartPolicy::No => RestartPolicyNameEnum::NO,
            RestartPolicy::UnlessStopped => RestartPolicyNameEnum::UNLESS_STOPPED,
        };

        Config {
            image: Some(spec.image.clone()),
            env: Some(
                spec.env
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, v))
                    .collect(),
            ),
            exposed_ports: Some(exposed_ports),
            host_config: Some(HostConfig {
                binds: Some(vec![bind]),
                port_bindings: Some(port_bindings),
                restart_policy: Some(DockerRestartPolicy {
                    name: Some(restart_policy),
                    maximum_retry_count: None,
                }),
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}

#[async_trait]
impl Runtime for DockerRuntime {
    async fn get_container(&self, name: &str) -> Result<Option<ContainerInfo>, RuntimeError> {
        self.inspect(name).await
    }

    async fn run(&self, spec: &RunSpec) -> Result<ContainerInfo, RuntimeError> {
        let options = CreateContainerOptions {
            name: spec.name.clone(),
            platform: None,
        };
        let created = self
            .docker
            .create_container(Some(options), Self::container_config(spec))
            .await
            .map_err(map_err)?;

        for warning in &created.warnings {
            warn!(
                component = "docker",
                event = "create_warning",
                container = %spec.name,
                warning = %warning,
                "docker reported a warning on create"
            );
        }

        if let Err(e) = self
            .docker
            .start_container(&spec.name, None::<StartContainerOptions<String>>)
            .await
        {
            // Do not leave a created-but-never-started container behind.
            let remove = RemoveContainerOptions {
                force: true,
                ..Default::default()
            };
            if let Err(rm_err) = self.docker.remove_container(&spec.name, Some(remove)).await {
                warn!(
                    component = "docker",
                    event = "cleanup_failed",
                    container = %spec.name,
                    error = %rm_err,
                    "failed to remove container after failed start"
                );
            }
            return Err(map_err(e));
        }

        info!(
            component = "docker",
            event = "container_started",
            container = %spec.name,
            image = %spec.image,
            "container started"
        );

        match self.inspect(&spec.name).await? {
            Some(info) => Ok(info),
            None => Err(RuntimeError::NotFound(spec.name.clone())),
        }
    }

    async fn start(&self, name: &str) -> Result<(), RuntimeError> {
        self.docker
            .start_container(name, None::<StartContainerOptions<String>>)
            .await
            .map_err(map_err)
    }

    async fn stop(&self, name: &str, grace: Duration) -> Result<(), RuntimeError> {
        let options = StopContainerOptions {
            t: i64::try_from(grace.as_secs()).unwrap_or(i64::MAX),
        };
        self.docker
            .stop_container(name, Some(options))
            .await
            .map_err(map_err)
    }

    async fn remove(&self, name: &str) -> Result<(), RuntimeError> {
        self.docker
            .remove_container(name, None::<RemoveContainerOptions>)
            .await
            .map_err(map_err)
    }

    async fn exec(&self, name: &str, cmd: &[String], user: &str) -> Result<ExecOutput, RuntimeError> {
        let options = CreateExecOptions {
            cmd: Some(cmd.to_vec()),
            user: Some(user.to_string()),
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            ..Default::default()
        };
        let exec = self
            .docker
            .create_exec(name, options)
            .await
            .map_err(map_err)?;

        let mut output = String::new();
        match self.docker.start_exec(&exec.id, None).await.map_err(map_err)? {
            StartExecResults::Attached { output: mut stream, .. } => {
                while let Some(chunk) = stream.next().await {
                    let chunk = chunk.map_err(map_err)?;
                    output.push_str(&String::from_utf8_lossy(&chunk.into_bytes()));
                }
            }
            StartExecResults::Detached => {}
        }

        let inspect = self.docker.inspect_exec(&exec.id).await.map_err(map_err)?;
        let exit_code = inspect.exit_code.unwrap_or(-1);

        debug!(
            component = "docker",
            event = "exec_finished",
            container = %name,
            exit_code = exit_code,
            "exec finished"
        );

        Ok(ExecOutput { exit_code, output })
    }

    async fn has_image(&self, reference: &str) -> Result<bool, RuntimeError> {
        match self.docker.inspect_image(reference).await {
            Ok(_) => Ok(true),
            Err(e) if is_not_found(&e) => Ok(false),
            Err(e) => Err(map_err(e)),
        }
    }

    async fn pull_image(&self, name: &str, tag: Option<&str>) -> Result<(), RuntimeError> {
        let options = CreateImageOptions {
            from_image: name.to_string(),
            tag: tag.unwrap_or(DEFAULT_TAG).to_string(),
            ..Default::default()
        };

        self.docker
            .create_image(Some(options), None, None)
            .try_for_each(|progress| async move {
                if let Some(status) = progress.status {
                    debug!(component = "docker", event = "pull_progress", status = %status);
                }
                Ok(())
            })
            .await
            .map_err(map_err)
    }

    async fn ping(&self) -> Result<(), RuntimeError> {
        self.docker.ping().await.map(|_| ()).map_err(map_err)
    }
}

fn is_not_found(e: &DockerError) -> bool {
    matches!(
        e,
        DockerError::DockerResponseServerError {
            status_code: 404,
            ..
        }
    )
}

fn map_err(e: DockerError) -> RuntimeError {
    match e {
        DockerError::DockerResponseServerError {
            status_code: 404,
            message,
        } => RuntimeError::NotFound(message),
        DockerError::DockerResponseServerError {
            status_code,
            message,
        } => RuntimeError::Api(format!("{} (status {})", message, status_code)),
        other => RuntimeError::Transport(other.to_string()),
    }
}

fn map_status(status: ContainerStateStatusEnum) -> ContainerStatus {
    match status {
        ContainerStateStatusEnum::CREATED => ContainerStatus::Created,
        ContainerStateStatusEnum::RUNNING => ContainerStatus::Running,
        ContainerStateStatusEnum::PAUSED => ContainerStatus::Paused,
        ContainerStateStatusEnum::RESTARTING => ContainerStatus::Restarting,
        ContainerStateStatusEnum::REMOVING => ContainerStatus::Removing,
        ContainerStateStatusEnum::EXITED => ContainerStatus::Exited,
        ContainerStateStatusEnum::DEAD => ContainerStatus::Dead,
        ContainerStateStatusEnum::EMPTY => ContainerStatus::Unknown,
    }
}
