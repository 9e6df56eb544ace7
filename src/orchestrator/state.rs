// In-memory lifecycle tracking for managed servers.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::fmt;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerState {
    Stopped,
    Provisioning,
    Running,
    ReplacePending,
    Failed,
}

impl ServerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServerState::Stopped => "stopped",
            ServerState::Provisioning => "provisioning",
            ServerState::Running => "running",
            ServerState::ReplacePending => "replace_pending",
            ServerState::Failed => "failed",
        }
    }
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Lifecycle {
    pub state: ServerState,
    pub since: DateTime<Utc>,
}

/// LifecycleTracker records the last known state of every server the
/// orchestrator touched. Servers never touched are implicitly `Stopped`.
#[derive(Debug, Default)]
pub struct LifecycleTracker {
    states: DashMap<String, Lifecycle>,
}

impl LifecycleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<Lifecycle> {
        self.states.get(id).map(|entry| *entry)
    }

    pub fn state(&self, id: &str) -> ServerState {
        self.get(id).map(|l| l.state).unwrap_or(ServerState::Stopped)
    }

    /// Moves `id` into `to` and returns the previous state.
    pub fn transition(&self, id: &str, to: ServerState) -> ServerState {
        let next = Lifecycle {
            state: to,
            since: Utc::now(),
        };
        let from = self
            .states
            .insert(id.to_string(), next)
            .map(|prev| prev.state)
            .unwrap_or(ServerState::Stopped);

        info!(
            component = "orchestrator",
            event = "lifecycle_transition",
            server_id = %id,
            from = %from,
            to = %to,
            "server state changed"
        );
        from
    }
}
