//! Rate limiting functionality.
//

use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;


pub const DEFAULT_MAX_REQUESTS: usize = 30;
pub const DEFAULT_TIME_WINDOW: Duration = Duration::from_secs(10);

/// Sliding-window limiter keyed by client identifier.
///
/// Every client owns an ordered log of admission instants. The window is
/// recomputed against `now` on each check, so there are no bucket boundaries
/// a client could burst across.
pub struct Limiter {
    max_requests: usize,
    time_window: Duration,
    clients: DashMap<String, VecDeque<Instant>>,
}

impl Limiter {
    /// Creates a new limiter admitting `max_requests` per `time_window`.
    pub fn new(max_requests: usize, time_window: Duration) -> Self {
        Self {
            max_requests,
            time_window,
            clients: DashMap::new(),
        }
    }

    /// Admits or rejects a request of `client_id` made at `now`.
    ///
    /// Prune, check and append run while the client's shard is locked.
    pub fn admit(&self, client_id: &str, now: Instant) -> bool {
        let mut window = self.clients.entry(client_id.to_string()).or_default();
        Self::prune(&mut window, now, self.time_window);

        if window.len() >= self.max_requests {
            return false;
        }

        window.push_back(now);
        true
    }

    /// Prunes every client window and evicts clients left with nothing in it.
    /// Returns the number of evicted clients.
    pub fn sweep(&self, now: Instant) -> usize {
        let before = self.clients.len();
        self.clients.retain(|_, window| {
            Self::prune(window, now, self.time_window);
            !window.is_empty()
        });
        before.saturating_sub(self.clients.len())
    }

    /// Spawns the periodic eviction sweep. Stops when `shutdown_token` is cancelled.
    pub fn spawn_sweeper(self: &Arc<Self>, shutdown_token: CancellationToken, interval: Duration) {
        let limiter = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = shutdown_token.cancelled() => {
                        break;
                    }
                    _ = ticker.tick() => {
                        let evicted = limiter.sweep(Instant::now());
                        let tracked = limiter.tracked_clients();
                        crate::metrics::set_rate_limit_clients(tracked);
                        if evicted > 0 {
                            debug!(
                                component = "rate_limiter",
                                event = "sweep",
                                evicted = evicted,
                                tracked = tracked,
                                "idle clients evicted"
                            );
                        }
                    }
                }
            }
        });
    }

    /// Number of clients currently holding a window.
    pub fn tracked_clients(&self) -> usize {
        self.clients.len()
    }

    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    pub fn time_window(&self) -> Duration {
        self.time_window
    }

    fn prune(window: &mut VecDeque<Instant>, now: Instant, time_window: Duration) {
        // Instants are appended in order, so expired ones sit at the front.
        while let Some(oldest) = window.front() {
            if now.saturating_duration_since(*oldest) < time_window {
                break;
            }
            window.pop_front();
        }
    }
}

impl Default for Limiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REQUESTS, DEFAULT_TIME_WINDOW)
    }
}
