//! Source fetching
//!
//! A fetcher turns a repository URL and a target workspace into the step that
//! materializes the source tree. The step runs like any other step, from the
//! workspace root, so its output lands in the run log.

use chief_core::domain::pipeline::Step;
use std::path::Path;

/// Produces the step that fetches a repository into a workspace
pub trait SourceFetcher: Send + Sync {
    /// Step that populates `workspace` with the contents of `repository_url`
    ///
    /// The step is executed with the workspace root as working directory and must
    /// leave `workspace` in place on success.
    fn fetch_step(&self, repository_url: &str, workspace: &Path) -> Step;
}

/// Shallow clone through the git command line
#[derive(Debug, Clone)]
pub struct GitFetcher {
    program: String,
}

impl GitFetcher {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for GitFetcher {
    fn default() -> Self {
        Self::new("git")
    }
}

impl SourceFetcher for GitFetcher {
    fn fetch_step(&self, repository_url: &str, workspace: &Path) -> Step {
        Step::new(
            self.program.clone(),
            [
                "clone".to_string(),
                "--depth".to_string(),
                "1".to_string(),
                repository_url.to_string(),
                workspace.display().to_string(),
            ],
        )
    }
}
