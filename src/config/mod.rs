// Configuration loading and management.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::orchestrator::Settings;

pub const PROD: &str = "prod";
#[allow(dead_code)]
pub const DEV: &str = "dev";
#[allow(dead_code)]
pub const DEBUG: &str = "debug";
#[allow(dead_code)]
pub const TEST: &str = "test";

const DEFAULT_API_PORT: &str = "8080";
const DEFAULT_API_TIMEOUT: Duration = Duration::from_secs(120);
const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);
const DEFAULT_STORE_URL: &str = "sqlite://mboxd.db";
const DEFAULT_STORE_CONNECTIONS: u32 = 5;
const DEFAULT_MEMORY: &str = "2G";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Mboxd {
    #[serde(rename = "mboxd")]
    pub mboxd: MboxdBox,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MboxdBox {
    pub env: String,
    pub logs: Option<Logs>,
    pub api: Option<Api>,
    #[serde(rename = "rate_limit")]
    pub rate_limit: Option<RateLimit>,
    pub runtime: Option<Runtime>,
    pub store: Option<Store>,
    pub k8s: Option<K8S>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Logs {
    pub level: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Api {
    pub name: Option<String>,
    pub port: Option<String>,
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimit {
    pub enabled: bool,
    #[serde(rename = "max_requests")]
    pub max_requests: Option<usize>,
    #[serde(rename = "time_window", default, with = "humantime_serde")]
    pub time_window: Option<Duration>,
    #[serde(rename = "sweep_interval", default, with = "humantime_serde")]
    pub sweep_interval: Option<Duration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeKind {
    Docker,
    Mock,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Runtime {
    pub kind: RuntimeKind,
    #[serde(rename = "base_image")]
    pub base_image: Option<String>,
    #[serde(rename = "data_path")]
    pub data_path: Option<String>,
    #[serde(rename = "game_port")]
    pub game_port: Option<u16>,
    #[serde(rename = "exec_user")]
    pub exec_user: Option<String>,
    #[serde(rename = "console_command")]
    pub console_command: Option<String>,
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
    #[serde(rename = "pull_timeout", default, with = "humantime_serde")]
    pub pull_timeout: Option<Duration>,
    #[serde(rename = "stop_grace", default, with = "humantime_serde")]
    pub stop_grace: Option<Duration>,
    #[serde(rename = "default_memory")]
    pub default_memory: Option<String>,
    #[serde(rename = "allowed_commands")]
    pub allowed_commands: Option<Vec<String>>,
}

impl Runtime {
    /// Orchestrator settings with defaults filled in for absent keys.
    pub fn settings(&self) -> Settings {
        let defaults = Settings::default();
        Settings {
            base_image: self.base_image.clone().unwrap_or(defaults.base_image),
            data_path: self.data_path.clone().unwrap_or(defaults.data_path),
            game_port: self.game_port.unwrap_or(defaults.game_port),
            exec_user: self.exec_user.clone().unwrap_or(defaults.exec_user),
            console_command: self
                .console_command
                .clone()
                .unwrap_or(defaults.console_command),
            timeout: self.timeout.unwrap_or(defaults.timeout),
            pull_timeout: self.pull_timeout.unwrap_or(defaults.pull_timeout),
            stop_grace: self.stop_grace.unwrap_or(defaults.stop_grace),
        }
    }

    pub fn default_memory(&self) -> &str {
        self.default_memory.as_deref().unwrap_or(DEFAULT_MEMORY)
    }

    pub fn allowed_commands(&self) -> Vec<String> {
        self.allowed_commands
            .clone()
            .unwrap_or_else(default_allowed_commands)
    }
}

fn default_allowed_commands() -> Vec<String> {
    ["say", "list", "time", "weather", "whitelist", "kick", "save-all"]
        .iter()
        .map(|c| c.to_string())
        .collect()
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Store {
    pub url: Option<String>,
    #[serde(rename = "max_connections")]
    pub max_connections: Option<u32>,
    #[serde(rename = "acquire_timeout", default, with = "humantime_serde")]
    pub acquire_timeout: Option<Duration>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Probe {
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct K8S {
    pub probe: Probe,
}

// Config trait
pub trait ConfigTrait {
    fn logs(&self) -> Option<&Logs>;
    fn is_prod(&self) -> bool;
    #[allow(dead_code)]
    fn is_debug(&self) -> bool;
    #[allow(dead_code)]
    fn is_dev(&self) -> bool;
    #[allow(dead_code)]
    fn is_test(&self) -> bool;
    fn api(&self) -> Option<&Api>;
    fn api_port(&self) -> &str;
    fn api_timeout(&self) -> Duration;
    fn rate_limit(&self) -> Option<&RateLimit>;
    fn runtime(&self) -> Runtime;
    fn store(&self) -> Option<&Store>;
    fn k8s(&self) -> Option<&K8S>;
}

// Config type alias for convenience
pub type Config = Mboxd;

impl ConfigTrait for Config {
    fn logs(&self) -> Option<&Logs> {
        self.mboxd.logs.as_ref()
    }

    fn is_prod(&self) -> bool {
        self.mboxd.env == PROD
    }

    fn is_debug(&self) -> bool {
        self.mboxd.env == DEBUG
    }

    fn is_dev(&self) -> bool {
        self.mboxd.env == DEV
    }

    fn is_test(&self) -> bool {
        self.mboxd.env == TEST
    }

    fn api(&self) -> Option<&Api> {
        self.mboxd.api.as_ref()
    }

    fn api_port(&self) -> &str {
        self.api()
            .and_then(|api| api.port.as_deref())
            .unwrap_or(DEFAULT_API_PORT)
    }

    fn api_timeout(&self) -> Duration {
        self.api()
            .and_then(|api| api.timeout)
            .unwrap_or(DEFAULT_API_TIMEOUT)
    }

    fn rate_limit(&self) -> Option<&RateLimit> {
        self.mboxd.rate_limit.as_ref()
    }

    fn runtime(&self) -> Runtime {
        self.mboxd.runtime.clone().unwrap_or(Runtime {
            kind: RuntimeKind::Docker,
            base_image: None,
            data_path: None,
            game_port: None,
            exec_user: None,
            console_command: None,
            timeout: None,
            pull_timeout: None,
            stop_grace: None,
            default_memory: None,
            allowed_commands: None,
        })
    }

    fn store(&self) -> Option<&Store> {
        self.mboxd.store.as_ref()
    }

    fn k8s(&self) -> Option<&K8S> {
        self.mboxd.k8s.as_ref()
    }
}

impl RateLimit {
    pub fn sweep_interval(&self) -> Duration {
        self.sweep_interval.unwrap_or(DEFAULT_SWEEP_INTERVAL)
    }
}

impl Store {
    pub fn url(&self) -> &str {
        self.url.as_deref().unwrap_or(DEFAULT_STORE_URL)
    }

    pub fn max_connections(&self) -> u32 {
        self.max_connections.unwrap_or(DEFAULT_STORE_CONNECTIONS)
    }

    pub fn acquire_timeout(&self) -> Duration {
        self.acquire_timeout.unwrap_or(Duration::from_secs(5))
    }
}

impl Config {
    /// Loads configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        // Resolve absolute path
        let abs_path = path
            .canonicalize()
            .with_context(|| format!("failed to resolve absolute config filepath: {:?}", path))?;

        // Read file
        let data = std::fs::read_to_string(&abs_path)
            .with_context(|| format!("read config yaml file {:?}", abs_path))?;

        let cfg = Self::from_yaml(&data).with_context(|| format!("config {:?}", abs_path))?;
        Ok(cfg)
    }

    /// Parses and validates a YAML document.
    pub fn from_yaml(data: &str) -> Result<Self> {
        let cfg: Mboxd = serde_yaml::from_str(data).context("unmarshal yaml")?;

        if let Some(rate) = cfg.rate_limit() {
            if rate.enabled && rate.max_requests == Some(0) {
                anyhow::bail!("rate_limit.max_requests must be positive");
            }
            if rate.time_window == Some(Duration::ZERO) {
                anyhow::bail!("rate_limit.time_window must be positive");
            }
        }

        let runtime = cfg.runtime();
        if !crate::orchestrator::is_valid_memory(runtime.default_memory()) {
            anyhow::bail!(
                "invalid runtime.default_memory {:?}, expected <digits>[KMGkmg]",
                runtime.default_memory()
            );
        }

        Ok(cfg)
    }
}

#[cfg(test)]
mod config_test;

// Test config is always available for integration tests
mod test_config;
#[allow(dead_code)]
pub use test_config::new_test_config;
