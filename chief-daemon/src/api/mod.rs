//! API Module
//!
//! HTTP control plane of the daemon.
//! Each submodule handles endpoints for a specific concern.

pub mod auth;
pub mod control;
pub mod error;
pub mod run;
pub mod status;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Daemon status and lifecycle
        .route("/status", get(status::daemon_status))
        .route("/kill", get(control::kill))
        // Submission
        .route("/new", post(run::submit_body).get(run::submit_query))
        // Runs
        .route("/status/{id}", get(run::get_run))
        .route("/runs", get(run::list_runs))
        // Add state and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
