//! Run registry
//!
//! Process-wide table of in-flight and completed runs, keyed by run id.
//!
//! The registry is the single synchronization point between the engine (writer)
//! and the control plane (reader). Every run is held in a `watch` channel: the
//! engine applies each phase transition as one `send_if_modified` call, so a reader
//! never observes a phase without its log entries, and waiters are woken on every
//! change.
//!
//! Runs are never evicted; they accumulate for the lifetime of the daemon.

use chief_core::domain::run::{Run, RunId};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tokio::sync::watch;

/// Registry error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("run {0} not found")]
    NotFound(RunId),
    /// The run already reached a terminal phase and can no longer change
    #[error("run {0} is already finished")]
    Terminal(RunId),
}

/// Table of runs tracked by the daemon
#[derive(Debug, Default)]
pub struct RunRegistry {
    runs: RwLock<HashMap<RunId, watch::Sender<Run>>>,
}

impl RunRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking `run`, returning its id
    pub fn insert(&self, run: Run) -> RunId {
        let id = run.id;
        let (sender, _) = watch::channel(run);

        self.runs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, sender);

        id
    }

    /// Snapshot of a single run
    pub fn get(&self, id: RunId) -> Option<Run> {
        self.runs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .map(|sender| sender.borrow().clone())
    }

    /// Snapshot of every tracked run, in no particular order
    pub fn list(&self) -> Vec<Run> {
        self.runs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|sender| sender.borrow().clone())
            .collect()
    }

    /// Number of non-terminal runs and total runs
    pub fn counts(&self) -> (usize, usize) {
        let runs = self.runs.read().unwrap_or_else(PoisonError::into_inner);
        let active = runs
            .values()
            .filter(|sender| !sender.borrow().phase.is_terminal())
            .count();

        (active, runs.len())
    }

    /// Applies `change` to a run as one visible update
    ///
    /// # Errors
    /// - [`RegistryError::NotFound`] if the run is not tracked
    /// - [`RegistryError::Terminal`] if the run already finished; `change` is not applied
    pub fn update<F>(&self, id: RunId, change: F) -> Result<(), RegistryError>
    where
        F: FnOnce(&mut Run),
    {
        let runs = self.runs.read().unwrap_or_else(PoisonError::into_inner);
        let sender = runs.get(&id).ok_or(RegistryError::NotFound(id))?;

        let applied = sender.send_if_modified(|run| {
            if run.phase.is_terminal() {
                return false;
            }
            change(run);
            true
        });

        if applied {
            Ok(())
        } else {
            Err(RegistryError::Terminal(id))
        }
    }

    /// Subscribes to every change of a run
    pub fn subscribe(&self, id: RunId) -> Option<watch::Receiver<Run>> {
        self.runs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .map(|sender| sender.subscribe())
    }

    /// Waits until a run reaches a terminal phase and returns it
    ///
    /// Returns `None` if the run is not tracked.
    pub async fn wait_for_terminal(&self, id: RunId) -> Option<Run> {
        let mut receiver = self.subscribe(id)?;

        let run = receiver
            .wait_for(|run| run.phase.is_terminal())
            .await
            .ok()?
            .clone();

        Some(run)
    }
}
