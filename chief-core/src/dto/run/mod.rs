//! Run DTOs for daemon/client communication

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::run::{Phase, Run, RunId};

/// Query parameters of `GET /new`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitQuery {
    pub definition: String,
}

/// Response to an accepted submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub run_id: RunId,
}

/// Query parameters of `GET /status/{id}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStatusQuery {
    /// Block until the run reaches a terminal phase
    #[serde(default)]
    pub wait: bool,
}

/// Lightweight run summary for listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub id: RunId,
    pub repository_url: String,
    pub phase: Phase,
    pub submitted_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl From<&Run> for RunSummary {
    fn from(run: &Run) -> Self {
        Self {
            id: run.id,
            repository_url: run.spec.repository_url().to_string(),
            phase: run.phase,
            submitted_at: run.submitted_at,
            finished_at: run.finished_at,
        }
    }
}
