//! Pipeline domain types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Parsed pipeline definition
///
/// Immutable once constructed. The only way to obtain one outside this crate is
/// through the definition parser or [`PipelineSpec::new`], both of which reject an
/// empty repository URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSpec {
    repository_url: String,
    build_steps: Vec<Step>,
    deploy_steps: Vec<Step>,
}

impl PipelineSpec {
    /// Creates a pipeline spec, returning `None` when the repository URL is blank
    pub fn new(
        repository_url: impl Into<String>,
        build_steps: Vec<Step>,
        deploy_steps: Vec<Step>,
    ) -> Option<Self> {
        let repository_url = repository_url.into().trim().to_string();
        if repository_url.is_empty() {
            return None;
        }

        Some(Self {
            repository_url,
            build_steps,
            deploy_steps,
        })
    }

    pub fn repository_url(&self) -> &str {
        &self.repository_url
    }

    pub fn build_steps(&self) -> &[Step] {
        &self.build_steps
    }

    pub fn deploy_steps(&self) -> &[Step] {
        &self.deploy_steps
    }
}

/// One executable unit within a phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub command: String,
    pub arguments: Vec<String>,
}

impl Step {
    /// Creates a step from a command and its arguments
    pub fn new<I, S>(command: impl Into<String>, arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: command.into(),
            arguments: arguments.into_iter().map(Into::into).collect(),
        }
    }

    /// Parses a step line: the first whitespace-separated token is the command,
    /// the remaining tokens are its arguments.
    ///
    /// Returns `None` for a line that is empty after trimming.
    pub fn from_line(line: &str) -> Option<Self> {
        let mut tokens = line.split_whitespace();
        let command = tokens.next()?;
        Some(Self::new(command, tokens))
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.command)?;
        for arg in &self.arguments {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}
