use super::{Api, Config, MboxdBox, Probe, RateLimit, Runtime, RuntimeKind, Store, K8S};
use std::time::Duration;

/// Creates a new test configuration.
pub fn new_test_config() -> Config {
    Config {
        mboxd: MboxdBox {
            env: super::TEST.to_string(),
            logs: Some(super::Logs {
                level: Some("debug".to_string()),
            }),
            api: Some(Api {
                name: Some("mboxd:8091".to_string()),
                port: Some("8091".to_string()),
                timeout: Some(Duration::from_secs(10)),
            }),
            rate_limit: Some(RateLimit {
                enabled: true,
                max_requests: Some(30),
                time_window: Some(Duration::from_secs(10)),
                sweep_interval: Some(Duration::from_secs(60)),
            }),
            runtime: Some(Runtime {
                kind: RuntimeKind::Mock,
                base_image: Some("itzg/minecraft-server".to_string()),
                data_path: Some("/data".to_string()),
                game_port: Some(25565),
                exec_user: Some("minecraft".to_string()),
                console_command: Some("mc-send-to-console".to_string()),
                timeout: Some(Duration::from_secs(5)),
                pull_timeout: Some(Duration::from_secs(30)),
                stop_grace: Some(Duration::from_secs(1)),
                default_memory: Some("2G".to_string()),
                allowed_commands: Some(vec![
                    "say".to_string(),
                    "list".to_string(),
                    "time".to_string(),
                ]),
            }),
            store: Some(Store {
                url: Some("sqlite::memory:".to_string()),
                max_connections: Some(1),
                acquire_timeout: Some(Duration::from_secs(5)),
            }),
            k8s: Some(K8S {
                probe: Probe {
                    timeout: Some(Duration::from_secs(5)),
                },
            }),
        },
    }
}
