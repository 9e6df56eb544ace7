// Main entrypoint for the mboxd daemon.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use mboxd::config::{Config, ConfigTrait};
use mboxd::shutdown::GracefulShutdown;
use mboxd::{app, controller, liveness};

const CONFIG_PATH: &str = "cfg/mboxd.cfg.yaml";
const CONFIG_PATH_LOCAL: &str = "cfg/mboxd.cfg.local.yaml";

const GRACEFUL_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// mboxd - game server containers behind a rate-limited HTTP API
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Custom config file path
    #[arg(short, long, value_name = "FILE")]
    cfg: Option<PathBuf>,
}

/// Loads the configuration struct from YAML file.
/// Tries local config first, then falls back to default config.
fn load_cfg(path: Option<PathBuf>) -> Result<(Config, String)> {
    if let Some(custom_path) = path {
        let cfg = Config::load(&custom_path)
            .with_context(|| format!("failed to load custom config from {:?}", custom_path))?;
        return Ok((cfg, custom_path.display().to_string()));
    }

    match Config::load(PathBuf::from(CONFIG_PATH_LOCAL)) {
        Ok(cfg) => Ok((cfg, CONFIG_PATH_LOCAL.to_string())),
        Err(_) => {
            let cfg = Config::load(PathBuf::from(CONFIG_PATH))
                .with_context(|| format!("failed to load config from {}", CONFIG_PATH))?;
            Ok((cfg, CONFIG_PATH.to_string()))
        }
    }
}

/// Configures structured logging: JSON lines in prod, pretty output elsewhere.
/// `RUST_LOG` takes precedence over `logs.level`.
fn configure_logger(cfg: &Config) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let level = cfg
        .logs()
        .and_then(|logs| logs.level.as_deref())
        .unwrap_or("debug");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let output = if cfg.is_prod() {
        fmt::layer().json().with_current_span(true).boxed()
    } else {
        fmt::layer().pretty().boxed()
    };

    tracing_subscriber::registry().with(filter).with(output).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config comes before the logger, so its outcome is logged afterwards.
    let (cfg, cfg_path) = load_cfg(args.cfg)?;
    configure_logger(&cfg);
    info!(
        component = "config",
        event = "load_success",
        path = %cfg_path,
        "config loaded"
    );

    if controller::metrics::init_prometheus_exporter().is_some() {
        info!(
            component = "metrics",
            event = "exporter_installed",
            "prometheus recorder installed"
        );
    }

    let shutdown_token = CancellationToken::new();

    let graceful_shutdown = GracefulShutdown::new(shutdown_token.clone());
    graceful_shutdown.set_graceful_timeout(GRACEFUL_TIMEOUT);

    // Initialize liveness probe for Kubernetes/Cloud health checks
    let probe_timeout = cfg
        .k8s()
        .and_then(|k8s| k8s.probe.timeout)
        .unwrap_or(DEFAULT_PROBE_TIMEOUT);
    let probe = Arc::new(liveness::Probe::new(probe_timeout)) as Arc<dyn liveness::Prober>;

    let app = app::App::new(shutdown_token.clone(), cfg, probe).await?;
    app.serve(Arc::new(graceful_shutdown.clone())).await?;

    // Listen for OS signals or cancellation and wait for graceful shutdown
    if let Err(e) = graceful_shutdown.await_shutdown().await {
        error!(
            component = "main",
            scope = "service",
            event = "graceful_shutdown_failed",
            error = %e,
            "failed to gracefully shut down service"
        );
        return Err(e);
    }

    Ok(())
}
