//! Request authentication
//!
//! Credentials travel in the `x-chief-user` and `x-chief-password` headers.

use axum::http::HeaderMap;
use chief_core::domain::access::{Clearance, Credentials};
use chief_core::dto::{PASSWORD_HEADER, USER_HEADER};

use crate::api::error::ApiResult;
use crate::state::AppState;

/// Reads credentials from request headers
///
/// Returns `None` unless both headers are present and valid UTF-8.
pub fn credentials(headers: &HeaderMap) -> Option<Credentials> {
    let username = headers.get(USER_HEADER)?.to_str().ok()?;
    let password = headers.get(PASSWORD_HEADER)?.to_str().ok()?;
    Some(Credentials::new(username, password))
}

/// Ensures the caller holds at least `required` clearance
pub async fn require(
    state: &AppState,
    headers: &HeaderMap,
    required: Clearance,
) -> ApiResult<Clearance> {
    let credentials = credentials(headers);
    let clearance = state
        .access
        .authorize(credentials.as_ref(), required)
        .await
        .inspect_err(|e| tracing::debug!("Rejected request requiring {}: {}", required, e))?;

    Ok(clearance)
}
