//! Control API Handler
//!
//! Daemon lifecycle operations reserved for master users.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use chief_core::domain::access::Clearance;
use chief_core::dto::server::{DaemonState, ServerStatus};

use crate::api::auth;
use crate::api::error::ApiResult;
use crate::state::AppState;

/// GET /kill
/// Stop accepting connections and shut down once in-flight runs finish
pub async fn kill(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<(StatusCode, Json<ServerStatus>)> {
    auth::require(&state, &headers, Clearance::Master).await?;

    let (active_runs, total_runs) = state.registry().counts();
    tracing::info!(
        "Shutdown requested, {} run(s) still in progress",
        active_runs
    );
    state.request_shutdown();

    Ok((
        StatusCode::ACCEPTED,
        Json(ServerStatus {
            status: DaemonState::Stopping,
            active_runs,
            total_runs,
        }),
    ))
}
