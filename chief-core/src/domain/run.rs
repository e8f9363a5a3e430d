//! Run domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::pipeline::PipelineSpec;

/// Opaque identifier of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(Uuid);

impl RunId {
    /// Generates a fresh run identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for RunId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for RunId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Phase of a run's state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Pending,
    Fetching,
    Building,
    Deploying,
    Succeeded,
    Failed,
}

impl Phase {
    /// Whether the run has reached a final state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Succeeded | Phase::Failed)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Pending => write!(f, "Pending"),
            Phase::Fetching => write!(f, "Fetching"),
            Phase::Building => write!(f, "Building"),
            Phase::Deploying => write!(f, "Deploying"),
            Phase::Succeeded => write!(f, "Succeeded"),
            Phase::Failed => write!(f, "Failed"),
        }
    }
}

/// Why a run ended in [`Phase::Failed`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunError {
    /// The run's workspace could not be prepared
    Io { message: String },

    /// A step's executable could not be spawned
    Launch {
        phase: Phase,
        step: String,
        message: String,
    },

    /// A step exited unsuccessfully
    ///
    /// `exit_status` is `None` when the process was terminated by a signal.
    Execution {
        phase: Phase,
        step: String,
        exit_status: Option<i32>,
    },
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::Io { message } => write!(f, "workspace error: {}", message),
            RunError::Launch {
                phase,
                step,
                message,
            } => write!(f, "{} step `{}` could not be launched: {}", phase, step, message),
            RunError::Execution {
                phase,
                step,
                exit_status: Some(code),
            } => write!(f, "{} step `{}` failed with exit status {}", phase, step, code),
            RunError::Execution {
                phase,
                step,
                exit_status: None,
            } => write!(f, "{} step `{}` was terminated by a signal", phase, step),
        }
    }
}

/// One execution of a pipeline spec
///
/// The engine mutates a run only through the registry until it reaches a terminal
/// phase; after that the record never changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub id: RunId,
    pub spec: PipelineSpec,
    pub phase: Phase,
    pub log: Vec<String>,
    pub error: Option<RunError>,
    pub submitted_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Run {
    /// Creates a pending run for a freshly submitted spec
    pub fn new(spec: PipelineSpec) -> Self {
        Self {
            id: RunId::new(),
            spec,
            phase: Phase::Pending,
            log: Vec::new(),
            error: None,
            submitted_at: Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }

    /// Moves the run into `phase`, recording the transition in the log
    pub fn advance(&mut self, phase: Phase) {
        if self.started_at.is_none() && phase != Phase::Pending {
            self.started_at = Some(Utc::now());
        }
        if phase.is_terminal() {
            self.finished_at = Some(Utc::now());
        }
        self.phase = phase;
        self.log.push(format!("phase {}", phase));
    }

    /// Fails the run with `error`, logging the failure before the transition
    pub fn fail(&mut self, error: RunError) {
        self.log.push(error.to_string());
        self.error = Some(error);
        self.advance(Phase::Failed);
    }
}
