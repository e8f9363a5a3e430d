//! ID resolver module
//!
//! Handles resolution of run id prefixes to full ids by querying the daemon.
//! This allows users to specify short, unambiguous prefixes instead of full ids.

use anyhow::{Context, Result, anyhow};
use chief_client::DaemonClient;
use chief_core::domain::run::RunId;

use crate::types::IdOrPrefix;

/// Resolve a run id or prefix to a full run id
///
/// If the input is already a full id, returns it immediately.
/// Otherwise, fetches all runs and finds the one matching the prefix.
///
/// # Errors
/// Returns an error if:
/// - No run matches the prefix
/// - Multiple runs match the prefix (ambiguous)
/// - API call fails
pub async fn resolve_run_id(client: &DaemonClient, id_or_prefix: &IdOrPrefix) -> Result<RunId> {
    // If it's already a full id, return it
    if let Some(id) = id_or_prefix.as_run_id() {
        return Ok(id);
    }

    let runs = client
        .list_runs()
        .await
        .context("Failed to fetch runs for ID resolution")?;

    select_unique(runs.iter().map(|run| run.id), id_or_prefix)
}

fn select_unique(ids: impl Iterator<Item = RunId>, id_or_prefix: &IdOrPrefix) -> Result<RunId> {
    let matches: Vec<RunId> = ids.filter(|id| id_or_prefix.matches(*id)).collect();

    match matches.as_slice() {
        [] => Err(anyhow!(
            "No run found with ID starting with '{}'",
            id_or_prefix
        )),
        [id] => Ok(*id),
        _ => {
            let ids: Vec<String> = matches.iter().map(ToString::to_string).collect();
            Err(anyhow!(
                "Ambiguous prefix '{}' matches multiple runs: {}",
                id_or_prefix,
                ids.join(", ")
            ))
        }
    }
}
