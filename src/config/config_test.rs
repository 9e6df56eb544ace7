use std::time::Duration;

use super::{new_test_config, Config, ConfigTrait, RuntimeKind};

const YAML: &str = r#"
mboxd:
  env: "prod"
  logs:
    level: "info"
  api:
    name: "mboxd"
    port: "9090"
    timeout: "30s"
  rate_limit:
    enabled: true
    max_requests: 10
    time_window: "5s"
  runtime:
    kind: "docker"
    base_image: "itzg/minecraft-server"
    timeout: "15s"
    pull_timeout: "5m"
    stop_grace: "45s"
  store:
    url: "sqlite://servers.db"
"#;

#[test]
fn test_yaml_is_parsed_with_defaults() {
    let cfg = Config::from_yaml(YAML).unwrap();

    assert!(cfg.is_prod());
    assert_eq!(cfg.api_port(), "9090");
    assert_eq!(cfg.api_timeout(), Duration::from_secs(30));

    let rate = cfg.rate_limit().unwrap();
    assert_eq!(rate.max_requests, Some(10));
    assert_eq!(rate.time_window, Some(Duration::from_secs(5)));
    assert_eq!(rate.sweep_interval(), Duration::from_secs(60));

    let runtime = cfg.runtime();
    assert_eq!(runtime.kind, RuntimeKind::Docker);
    assert_eq!(runtime.default_memory(), "2G");
    let settings = runtime.settings();
    assert_eq!(settings.timeout, Duration::from_secs(15));
    assert_eq!(settings.pull_timeout, Duration::from_secs(300));
    assert_eq!(settings.stop_grace, Duration::from_secs(45));
    assert_eq!(settings.exec_user, "minecraft");
    assert_eq!(settings.data_path, "/data");

    let store = cfg.store().unwrap();
    assert_eq!(store.url(), "sqlite://servers.db");
    assert_eq!(store.max_connections(), 5);
    assert!(cfg.k8s().is_none());
}

#[test]
fn test_invalid_default_memory_is_rejected() {
    let yaml = r#"
mboxd:
  env: "dev"
  runtime:
    kind: "mock"
    default_memory: "lots"
"#;
    assert!(Config::from_yaml(yaml).is_err());
}

#[test]
fn test_zero_request_budget_is_rejected() {
    let yaml = r#"
mboxd:
  env: "dev"
  rate_limit:
    enabled: true
    max_requests: 0
"#;
    assert!(Config::from_yaml(yaml).is_err());
}

#[test]
fn test_test_config_uses_mock_runtime() {
    let cfg = new_test_config();
    assert!(cfg.is_test());
    assert_eq!(cfg.runtime().kind, RuntimeKind::Mock);
}
