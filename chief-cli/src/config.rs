//! Configuration module
//!
//! Handles CLI configuration: where the daemon listens and who is calling.

use anyhow::{Context, Result};
use chief_client::DaemonClient;
use chief_core::access::{AccessConfig, chief_home};
use chief_core::domain::access::{Clearance, Credentials};
use std::path::PathBuf;

use crate::input;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the daemon's control plane
    pub daemon_url: String,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl Config {
    /// Credentials from flags or environment, prompting for what is missing
    ///
    /// The password prompt does not echo.
    pub fn credentials(&self) -> Result<Credentials> {
        self.credentials_with(input::prompt, input::prompt_password)
    }

    fn credentials_with(
        &self,
        read_line: impl FnOnce(&str) -> Result<String>,
        read_password: impl FnOnce(&str) -> Result<String>,
    ) -> Result<Credentials> {
        let username = match &self.user {
            Some(user) => user.clone(),
            None => read_line("Username: ")?,
        };
        let password = match &self.password {
            Some(password) => password.clone(),
            None => read_password("Password: ")?,
        };

        Ok(Credentials::new(username, password))
    }

    /// Client without credentials, for read-only requests
    pub fn client(&self) -> DaemonClient {
        DaemonClient::new(&self.daemon_url)
    }

    /// Client carrying the caller's credentials
    pub fn authorized_client(&self) -> Result<DaemonClient> {
        Ok(self.client().with_credentials(self.credentials()?))
    }

    /// Path of the local access configuration document
    pub fn access_config_path(&self) -> Result<PathBuf> {
        Ok(AccessConfig::path_in(&chief_home()?))
    }

    /// Loads the local access configuration and checks the caller's clearance
    pub fn login(&self, required: Clearance) -> Result<(AccessConfig, PathBuf)> {
        let path = self.access_config_path()?;
        let access = AccessConfig::load(&path)?;

        let credentials = self.credentials()?;
        access
            .authorize(Some(&credentials), required)
            .with_context(|| format!("Login as '{}' failed", credentials.username))?;

        Ok((access, path))
    }
}
