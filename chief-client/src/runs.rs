//! Run-related control-plane endpoints

use crate::DaemonClient;
use crate::error::Result;
use chief_core::domain::run::{Run, RunId};
use chief_core::dto::run::{RunSummary, SubmitResponse};

impl DaemonClient {
    // =============================================================================
    // Submission
    // =============================================================================

    /// Submit a pipeline definition
    ///
    /// Requires normal clearance. A definition the daemon cannot parse is
    /// rejected with status 400 and the parser's message.
    pub async fn submit(&self, definition: &str) -> Result<SubmitResponse> {
        let request = self
            .client
            .post(self.url("/new"))
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(definition.to_string());
        let response = self.authorized(request).send().await?;

        self.handle_response(response).await
    }

    // =============================================================================
    // Run Queries
    // =============================================================================

    /// Get a run snapshot
    ///
    /// With `wait` set, the daemon answers only once the run is finished.
    pub async fn get_run(&self, id: RunId, wait: bool) -> Result<Run> {
        let url = self.url(&format!("/status/{}", id));
        let request = self.client.get(&url).query(&[("wait", wait)]);
        let response = self.authorized(request).send().await?;

        self.handle_response(response).await
    }

    /// List all runs known to the daemon, most recent first
    pub async fn list_runs(&self) -> Result<Vec<RunSummary>> {
        let response = self
            .authorized(self.client.get(self.url("/runs")))
            .send()
            .await?;

        self.handle_response(response).await
    }
}
