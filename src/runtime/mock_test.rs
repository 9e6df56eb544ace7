use std::time::Duration;

use super::{
    ContainerStatus, ExecOutput, MockRuntime, PortBinding, RestartPolicy, RunSpec, Runtime,
    RuntimeError, VolumeBinding,
};

fn spec(name: &str, image: &str) -> RunSpec {
    RunSpec {
        image: image.to_string(),
        name: name.to_string(),
        env: vec![("EULA".to_string(), "TRUE".to_string())],
        volume: VolumeBinding {
            volume: format!("{}_data", name),
            target: "/data".to_string(),
            read_only: false,
        },
        port: PortBinding {
            container_port: 25565,
            host_port: 25565,
        },
        restart_policy: RestartPolicy::UnlessStopped,
    }
}

#[tokio::test]
async fn test_run_requires_local_image() {
    let runtime = MockRuntime::new();

    let err = runtime.run(&spec("mc_a", "base")).await.unwrap_err();
    assert!(matches!(err, RuntimeError::NotFound(_)));

    runtime.pull_image("base", None).await.unwrap();
    let info = runtime.run(&spec("mc_a", "base")).await.unwrap();
    assert_eq!(info.status, ContainerStatus::Running);
}

#[tokio::test]
async fn test_running_container_cannot_be_removed_until_stopped() {
    let runtime = MockRuntime::new();
    runtime.add_image("base");
    runtime.run(&spec("mc_a", "base")).await.unwrap();

    assert!(matches!(runtime.remove("mc_a").await, Err(RuntimeError::Api(_))));

    runtime.stop("mc_a", Duration::from_secs(1)).await.unwrap();
    runtime.remove("mc_a").await.unwrap();

    assert!(runtime.get_container("mc_a").await.unwrap().is_none());
    assert_eq!(runtime.volumes(), vec!["mc_a_data".to_string()]);
}

#[tokio::test]
async fn test_exec_uses_configured_result() {
    let runtime = MockRuntime::new();
    runtime.add_container("mc_a", ContainerStatus::Running);
    runtime.set_exec_result(Ok(ExecOutput {
        exit_code: 3,
        output: "boom".to_string(),
    }));

    let out = runtime
        .exec("mc_a", &["list".to_string()], "minecraft")
        .await
        .unwrap();
    assert_eq!(out.exit_code, 3);
    assert!(!out.is_success());
}

#[tokio::test]
async fn test_stopped_container_can_be_started_again() {
    let runtime = MockRuntime::new();
    runtime.add_container("mc_a", ContainerStatus::Exited);

    runtime.start("mc_a").await.unwrap();
    let info = runtime.get_container("mc_a").await.unwrap().unwrap();
    assert_eq!(info.status, ContainerStatus::Running);

    assert!(matches!(runtime.start("mc_b").await, Err(RuntimeError::NotFound(_))));
}
