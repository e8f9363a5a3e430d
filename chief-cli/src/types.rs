//! Common types used across CLI modules

use chief_core::domain::run::RunId;

/// Identifier that can be either a full run id or an unambiguous prefix
#[derive(Debug, Clone)]
pub enum IdOrPrefix {
    /// Full run id
    Full(RunId),
    /// Prefix that should uniquely identify a run
    Prefix(String),
}

impl IdOrPrefix {
    /// Parse a string into an IdOrPrefix
    ///
    /// Attempts to parse as a full run id first, otherwise treats as a prefix
    pub fn parse(input: &str) -> Self {
        match input.parse::<RunId>() {
            Ok(id) => IdOrPrefix::Full(id),
            Err(_) => IdOrPrefix::Prefix(input.trim().to_lowercase()),
        }
    }

    /// Get the run id if this is a full id
    pub fn as_run_id(&self) -> Option<RunId> {
        match self {
            IdOrPrefix::Full(id) => Some(*id),
            IdOrPrefix::Prefix(_) => None,
        }
    }

    /// Whether `id` is selected by this identifier
    pub fn matches(&self, id: RunId) -> bool {
        match self {
            IdOrPrefix::Full(full) => *full == id,
            IdOrPrefix::Prefix(prefix) => id.to_string().starts_with(prefix.as_str()),
        }
    }
}

impl std::fmt::Display for IdOrPrefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdOrPrefix::Full(id) => write!(f, "{}", id),
            IdOrPrefix::Prefix(prefix) => write!(f, "{}", prefix),
        }
    }
}

impl From<&str> for IdOrPrefix {
    fn from(s: &str) -> Self {
        IdOrPrefix::parse(s)
    }
}
