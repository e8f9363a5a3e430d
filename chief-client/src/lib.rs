//! Chief HTTP Client
//!
//! A simple, type-safe HTTP client for the Chief daemon's control plane.
//!
//! The CLI and integration tests both go through this crate, so every request
//! is shaped in one place.
//!
//! # Example
//!
//! ```no_run
//! use chief_client::DaemonClient;
//! use chief_core::domain::access::Credentials;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = DaemonClient::new("http://localhost:2222")
//!         .with_credentials(Credentials::new("alice", "hunter2"));
//!
//!     let definition = "- INFO -\nrepo: https://example.com/app.git\n";
//!     let accepted = client.submit(definition).await?;
//!
//!     println!("Submitted run: {}", accepted.run_id);
//!     Ok(())
//! }
//! ```

pub mod error;
mod control;
mod runs;

// Re-export commonly used types
pub use error::{ClientError, Result};

use chief_core::domain::access::Credentials;
use chief_core::dto::{PASSWORD_HEADER, USER_HEADER};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

/// Default control-plane URL
pub const DEFAULT_DAEMON_URL: &str = "http://localhost:2222";

/// HTTP client for the Chief daemon
///
/// Requests that need clearance (submit, kill) carry the configured
/// credentials in the `x-chief-user` and `x-chief-password` headers.
#[derive(Debug, Clone)]
pub struct DaemonClient {
    /// Base URL of the daemon (e.g., "http://localhost:2222")
    base_url: String,
    /// HTTP client instance
    client: Client,
    credentials: Option<Credentials>,
}

impl DaemonClient {
    /// Create a new daemon client
    ///
    /// # Example
    /// ```
    /// use chief_client::DaemonClient;
    ///
    /// let client = DaemonClient::new("http://localhost:2222");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new daemon client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            credentials: None,
        }
    }

    /// Attach credentials sent with every request
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Get the base URL of the daemon
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Some(credentials) => request
                .header(USER_HEADER, &credentials.username)
                .header(PASSWORD_HEADER, &credentials.password),
            None => request,
        }
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle a daemon response and deserialize JSON
    ///
    /// This method checks the status code and returns an appropriate error if
    /// the request failed, or deserializes the response body if successful.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}
