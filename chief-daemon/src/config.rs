//! Daemon configuration
//!
//! Defines all configurable parameters for the daemon: the control-plane
//! listener, where run workspaces live and what happens to them afterwards,
//! and how many runs may execute at once.

use chief_core::access::{AccessConfig, chief_home};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::warn;

/// Default control-plane address (local loopback, fixed port)
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:2222";

/// What to do with a run's workspace once the run is finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspaceRetention {
    /// Always delete the workspace
    Remove,
    /// Never delete the workspace
    Keep,
    /// Delete the workspace only when the run succeeded
    KeepOnFailure,
}

impl WorkspaceRetention {
    /// Whether a workspace should be removed for a run that ended with `succeeded`
    pub fn should_remove(&self, succeeded: bool) -> bool {
        match self {
            WorkspaceRetention::Remove => true,
            WorkspaceRetention::Keep => false,
            WorkspaceRetention::KeepOnFailure => succeeded,
        }
    }
}

impl fmt::Display for WorkspaceRetention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkspaceRetention::Remove => write!(f, "remove"),
            WorkspaceRetention::Keep => write!(f, "keep"),
            WorkspaceRetention::KeepOnFailure => write!(f, "keep-on-failure"),
        }
    }
}

impl FromStr for WorkspaceRetention {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "remove" => Ok(WorkspaceRetention::Remove),
            "keep" => Ok(WorkspaceRetention::Keep),
            "keep-on-failure" | "keep_on_failure" => Ok(WorkspaceRetention::KeepOnFailure),
            other => anyhow::bail!("unknown workspace retention policy '{}'", other),
        }
    }
}

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the control plane listens on
    pub bind_addr: String,

    /// Chief home directory (holds the access config document)
    pub home: PathBuf,

    /// Directory under which each run gets its own workspace
    pub workspace_root: PathBuf,

    /// Workspace retention policy
    pub retention: WorkspaceRetention,

    /// Maximum number of runs executing at the same time
    pub max_concurrent_runs: usize,

    /// Program used to fetch repositories
    pub git_program: String,
}

impl Config {
    /// Creates a new configuration rooted at `home` with defaults
    pub fn new(home: PathBuf) -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            workspace_root: home.join("workspaces"),
            home,
            retention: WorkspaceRetention::Remove,
            max_concurrent_runs: 4,
            git_program: "git".to_string(),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables (all optional):
    /// - CHIEF_HOME (default: ~/.chief)
    /// - CHIEF_BIND_ADDR (default: 127.0.0.1:2222)
    /// - CHIEF_WORKSPACE_ROOT (default: <home>/workspaces)
    /// - CHIEF_WORKSPACE_RETENTION (remove | keep | keep-on-failure, default: remove)
    /// - CHIEF_MAX_CONCURRENT_RUNS (default: 4)
    /// - CHIEF_GIT (default: git)
    ///
    /// An invalid value is reported and that setting keeps its default; the
    /// other variables still apply.
    pub fn from_env() -> anyhow::Result<Self> {
        let home = chief_home()?;
        Ok(Self::from_lookup(home, |key| std::env::var(key).ok()))
    }

    /// Creates configuration rooted at `home` from the variables `lookup` yields
    pub fn from_lookup(home: PathBuf, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::new(home);

        if let Some(addr) = lookup("CHIEF_BIND_ADDR") {
            config.bind_addr = addr;
        }

        if let Some(root) = lookup("CHIEF_WORKSPACE_ROOT") {
            config.workspace_root = PathBuf::from(root);
        }

        if let Some(retention) = lookup("CHIEF_WORKSPACE_RETENTION") {
            match retention.parse() {
                Ok(retention) => config.retention = retention,
                Err(e) => warn!(
                    "Ignoring CHIEF_WORKSPACE_RETENTION ({:#}), using {}",
                    e, config.retention
                ),
            }
        }

        if let Some(max) = lookup("CHIEF_MAX_CONCURRENT_RUNS") {
            match max.trim().parse::<usize>() {
                Ok(max) if max > 0 => config.max_concurrent_runs = max,
                _ => warn!(
                    "Ignoring CHIEF_MAX_CONCURRENT_RUNS '{}', expected a positive integer, using {}",
                    max, config.max_concurrent_runs
                ),
            }
        }

        if let Some(git) = lookup("CHIEF_GIT") {
            config.git_program = git;
        }

        config
    }

    /// Sets the workspace retention policy
    pub fn with_retention(mut self, retention: WorkspaceRetention) -> Self {
        self.retention = retention;
        self
    }

    /// Path of the access configuration document
    pub fn access_config_path(&self) -> PathBuf {
        AccessConfig::path_in(&self.home)
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.bind_addr.trim().is_empty() {
            anyhow::bail!("bind_addr cannot be empty");
        }

        if self.bind_addr.parse::<std::net::SocketAddr>().is_err() && !self.bind_addr.contains(':')
        {
            anyhow::bail!("bind_addr must be of the form host:port");
        }

        if self.max_concurrent_runs == 0 {
            anyhow::bail!("max_concurrent_runs must be greater than 0");
        }

        if self.git_program.trim().is_empty() {
            anyhow::bail!("git_program cannot be empty");
        }

        Ok(())
    }
}
