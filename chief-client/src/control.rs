//! Daemon status and lifecycle endpoints

use crate::DaemonClient;
use crate::error::Result;
use chief_core::dto::server::ServerStatus;

impl DaemonClient {
    /// Get the daemon status
    ///
    /// A daemon that cannot be reached is reported as stopped rather than as an
    /// error.
    pub async fn status(&self) -> Result<ServerStatus> {
        match self.client.get(self.url("/status")).send().await {
            Ok(response) => self.handle_response(response).await,
            Err(e) if e.is_connect() => {
                tracing::debug!("No daemon at {}: {}", self.base_url, e);
                Ok(ServerStatus::stopped())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Ask the daemon to shut down
    ///
    /// Requires master clearance. The daemon stops accepting connections and
    /// exits once in-flight runs have finished.
    pub async fn kill(&self) -> Result<ServerStatus> {
        let response = self
            .authorized(self.client.get(self.url("/kill")))
            .send()
            .await?;

        self.handle_response(response).await
    }
}
