//! Daemon status DTOs

use serde::{Deserialize, Serialize};
use std::fmt;

/// Daemon-level state reported by `GET /status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DaemonState {
    Running,
    Stopping,
    Stopped,
}

impl fmt::Display for DaemonState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DaemonState::Running => write!(f, "RUNNING"),
            DaemonState::Stopping => write!(f, "STOPPING"),
            DaemonState::Stopped => write!(f, "STOPPED"),
        }
    }
}

/// Body of `GET /status` and `GET /kill`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerStatus {
    pub status: DaemonState,
    #[serde(default)]
    pub active_runs: usize,
    #[serde(default)]
    pub total_runs: usize,
}

impl ServerStatus {
    /// Status a client reports when no daemon answers
    pub fn stopped() -> Self {
        Self {
            status: DaemonState::Stopped,
            active_runs: 0,
            total_runs: 0,
        }
    }
}
