//! Error types for the Chief client

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when using the Chief client
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Daemon returned an error status code
    #[error("daemon error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the daemon
        message: String,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Invalid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ClientError {
    /// Create an API error from status code and response body
    ///
    /// A JSON body of the form `{"error": "..."}` is unwrapped to its message.
    pub fn api_error(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|value| value.get("error")?.as_str().map(str::to_string))
            .unwrap_or(body);

        Self::ApiError { status, message }
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ApiError { status: 404, .. })
    }

    /// Check if the daemon rejected the caller's credentials
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::ApiError { status: 401, .. })
    }

    /// Check if the caller lacks the required clearance
    pub fn is_forbidden(&self) -> bool {
        matches!(self, Self::ApiError { status: 403, .. })
    }

    /// Check if this error is a client error (4xx status)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 400 && *status < 500)
    }

    /// Check if no daemon could be reached
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::RequestFailed(e) if e.is_connect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_unwraps_json_message() {
        let err = ClientError::api_error(400, r#"{"error":"line 2: bad"}"#);
        assert!(matches!(
            err,
            ClientError::ApiError { status: 400, ref message } if message == "line 2: bad"
        ));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_api_error_keeps_plain_body() {
        let err = ClientError::api_error(500, "boom");
        assert!(matches!(
            err,
            ClientError::ApiError { ref message, .. } if message == "boom"
        ));
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_status_helpers() {
        assert!(ClientError::api_error(404, "").is_not_found());
        assert!(ClientError::api_error(401, "").is_unauthorized());
        assert!(ClientError::api_error(403, "").is_forbidden());
        assert!(!ClientError::ParseError("x".into()).is_connection_error());
    }
}
