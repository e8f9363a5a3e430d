//! Run API Handlers
//!
//! HTTP endpoints for submitting pipeline definitions and inspecting runs.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::{HeaderMap, StatusCode},
};
use chief_core::domain::access::Clearance;
use chief_core::domain::run::{Run, RunId};
use chief_core::dto::run::{RunStatusQuery, RunSummary, SubmitQuery, SubmitResponse};
use chief_core::parse_definition;

use crate::api::auth;
use crate::api::error::{ApiError, ApiResult};
use crate::state::AppState;

/// POST /new
/// Submit a pipeline definition carried in the request body
pub async fn submit_body(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> ApiResult<(StatusCode, Json<SubmitResponse>)> {
    submit(&state, &headers, &body).await
}

/// GET /new?definition=...
/// Submit a pipeline definition carried in the query string
pub async fn submit_query(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<SubmitQuery>, QueryRejection>,
) -> ApiResult<(StatusCode, Json<SubmitResponse>)> {
    let Query(query) = query?;
    submit(&state, &headers, &query.definition).await
}

async fn submit(
    state: &AppState,
    headers: &HeaderMap,
    definition: &str,
) -> ApiResult<(StatusCode, Json<SubmitResponse>)> {
    auth::require(state, headers, Clearance::Normal).await?;

    if state.is_shutting_down() {
        return Err(ApiError::Unavailable(
            "daemon is shutting down, no new runs are accepted".to_string(),
        ));
    }

    let spec = parse_definition(definition).inspect_err(|e| {
        tracing::info!("Rejected pipeline definition: {}", e);
    })?;

    let run_id = state.engine.execute(spec);

    Ok((StatusCode::ACCEPTED, Json(SubmitResponse { run_id })))
}

/// GET /status/{id}
/// Get a run snapshot, optionally waiting for it to finish
pub async fn get_run(
    State(state): State<AppState>,
    Path(id): Path<String>,
    query: Result<Query<RunStatusQuery>, QueryRejection>,
) -> ApiResult<Json<Run>> {
    let Query(query) = query?;
    let id: RunId = id
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("'{}' is not a valid run id", id)))?;

    tracing::debug!("Getting run: {} (wait: {})", id, query.wait);

    let run = if query.wait {
        state.engine.await_run(id).await
    } else {
        state.registry().get(id)
    };

    run.map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Run {} not found", id)))
}

/// GET /runs
/// List every run known to the daemon, most recent first
pub async fn list_runs(State(state): State<AppState>) -> ApiResult<Json<Vec<RunSummary>>> {
    tracing::debug!("Listing runs");

    let mut runs: Vec<RunSummary> = state.registry().list().iter().map(RunSummary::from).collect();
    runs.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));

    Ok(Json(runs))
}
