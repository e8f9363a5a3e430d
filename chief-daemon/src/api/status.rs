//! Status API Handler

use axum::{Json, extract::State};
use chief_core::dto::server::{DaemonState, ServerStatus};

use crate::state::AppState;

/// GET /status
/// Daemon liveness and run counts
pub async fn daemon_status(State(state): State<AppState>) -> Json<ServerStatus> {
    let (active_runs, total_runs) = state.registry().counts();
    let status = if state.is_shutting_down() {
        DaemonState::Stopping
    } else {
        DaemonState::Running
    };

    Json(ServerStatus {
        status,
        active_runs,
        total_runs,
    })
}
