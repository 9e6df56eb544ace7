// Package shutdown provides graceful shutdown functionality.

use anyhow::Result;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::Notify;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
#[error("graceful shutdown timeout exceeded")]
pub struct TimeoutError;

/// Graceful shutdown handler.
///
/// Tasks register with `add` and report with `done`; `await_shutdown` waits for
/// ctrl-c or token cancellation, cancels the token and then waits for every
/// registered task up to the configured timeout.
#[derive(Clone)]
pub struct GracefulShutdown {
    shutdown_token: CancellationToken,
    timeout: Arc<RwLock<Duration>>,
    pending: Arc<AtomicUsize>,
    finished: Arc<Notify>,
}

impl GracefulShutdown {
    pub fn new(shutdown_token: CancellationToken) -> Self {
        Self {
            shutdown_token,
            timeout: Arc::new(RwLock::new(Duration::from_secs(10))),
            pending: Arc::new(AtomicUsize::new(0)),
            finished: Arc::new(Notify::new()),
        }
    }

    pub fn set_graceful_timeout(&self, timeout: Duration) {
        *self.timeout.write() = timeout;
    }

    /// Registers `n` tasks to wait for.
    pub fn add(&self, n: usize) {
        self.pending.fetch_add(n, Ordering::AcqRel);
    }

    /// Marks one registered task as finished.
    pub fn done(&self) {
        let prev = self
            .pending
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .unwrap_or(0);
        if prev <= 1 {
            self.finished.notify_waiters();
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// Waits for shutdown signal and then waits for all tasks to complete
    pub async fn await_shutdown(&self) -> Result<()> {
        tokio::select! {
            _ = signal::ctrl_c() => {
                info!(
                    component = "graceful-shutdown",
                    event = "os_signal",
                    signal = "SIGINT",
                    "cancellation started"
                );
            }
            _ = self.shutdown_token.cancelled() => {
                info!(
                    component = "graceful-shutdown",
                    event = "ctx_done",
                    "cancellation started"
                );
            }
        }

        self.cancel_and_await_with_timeout().await
    }

    async fn cancel_and_await_with_timeout(&self) -> Result<()> {
        self.shutdown_token.cancel();

        let timeout_duration = *self.timeout.read();
        match timeout(timeout_duration, self.wait_for_completion()).await {
            Ok(_) => {
                info!(
                    component = "graceful-shutdown",
                    event = "shutdown_success",
                    "service was gracefully shut down"
                );
                Ok(())
            }
            Err(_) => {
                warn!(
                    component = "graceful-shutdown",
                    event = "shutdown_timeout",
                    timeout_secs = timeout_duration.as_secs(),
                    pending = self.pending(),
                    "not all tasks were closed within timeout"
                );
                Err(TimeoutError.into())
            }
        }
    }

    async fn wait_for_completion(&self) {
        loop {
            let notified = self.finished.notified();
            tokio::pin!(notified);
            // Register before re-checking so a concurrent `done` is not missed.
            notified.as_mut().enable();
            if self.pending() == 0 {
                return;
            }
            notified.await;
        }
    }
}
