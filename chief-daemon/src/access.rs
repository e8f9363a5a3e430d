//! Access gate
//!
//! Decides whether a caller may perform a privileged control-plane operation.

use async_trait::async_trait;
use chief_core::access::{AccessConfig, AccessError};
use chief_core::domain::access::{Clearance, Credentials};
use std::path::PathBuf;
use tracing::warn;

/// Authorization check used by the control plane
#[async_trait]
pub trait AccessGate: Send + Sync {
    /// Checks `credentials` for at least `required` clearance
    ///
    /// Returns the caller's actual clearance on success.
    async fn authorize(
        &self,
        credentials: Option<&Credentials>,
        required: Clearance,
    ) -> Result<Clearance, AccessError>;
}

/// Gate backed by the access configuration document
///
/// The document is read again on every check, so users added or removed while
/// the daemon runs take effect immediately. An unreadable document denies
/// everyone.
#[derive(Debug, Clone)]
pub struct FileAccessGate {
    path: PathBuf,
}

impl FileAccessGate {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl AccessGate for FileAccessGate {
    async fn authorize(
        &self,
        credentials: Option<&Credentials>,
        required: Clearance,
    ) -> Result<Clearance, AccessError> {
        let path = self.path.clone();
        let loaded = tokio::task::spawn_blocking(move || AccessConfig::load(&path)).await;

        let config = match loaded {
            Ok(Ok(config)) => config,
            Ok(Err(e)) => {
                warn!("Denying request, access config unavailable: {}", e);
                return Err(AccessError::NotAuthenticated);
            }
            Err(e) => {
                warn!("Denying request, access config load panicked: {}", e);
                return Err(AccessError::NotAuthenticated);
            }
        };

        config.authorize(credentials, required)
    }
}

/// Gate over a fixed, in-memory access configuration
#[derive(Debug, Clone, Default)]
pub struct StaticAccessGate {
    config: AccessConfig,
}

impl StaticAccessGate {
    pub fn new(config: AccessConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl AccessGate for StaticAccessGate {
    async fn authorize(
        &self,
        credentials: Option<&Credentials>,
        required: Clearance,
    ) -> Result<Clearance, AccessError> {
        self.config.authorize(credentials, required)
    }
}
