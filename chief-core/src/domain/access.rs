//! Access control domain types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Access level gating privileged daemon operations
///
/// Clearances are totally ordered: `Normal < Master`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Clearance {
    Normal,
    Master,
}

impl Clearance {
    /// Whether this clearance satisfies `required`
    pub fn satisfies(&self, required: Clearance) -> bool {
        *self >= required
    }
}

impl fmt::Display for Clearance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Clearance::Normal => write!(f, "normal"),
            Clearance::Master => write!(f, "master"),
        }
    }
}

impl FromStr for Clearance {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "normal" => Ok(Clearance::Normal),
            "master" => Ok(Clearance::Master),
            other => Err(format!("unknown clearance '{}'", other)),
        }
    }
}

/// A user entry in the access configuration document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Argon2id PHC string, see [`crate::access::hash_password`]
    #[serde(rename = "hash")]
    pub password_hash: String,
    pub clearance: Clearance,
}

/// Username and password presented by a caller
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

// Keep passwords out of debug output and logs
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clearance_order() {
        assert!(Clearance::Normal < Clearance::Master);
        assert!(Clearance::Master.satisfies(Clearance::Normal));
        assert!(Clearance::Master.satisfies(Clearance::Master));
        assert!(!Clearance::Normal.satisfies(Clearance::Master));
    }

    #[test]
    fn test_clearance_parse() {
        assert_eq!("MASTER".parse::<Clearance>().unwrap(), Clearance::Master);
        assert_eq!(" normal ".parse::<Clearance>().unwrap(), Clearance::Normal);
        assert!("root".parse::<Clearance>().is_err());
    }

    #[test]
    fn test_user_serialization_matches_document_format() {
        let user = User {
            password_hash: "abc$def".to_string(),
            clearance: Clearance::Master,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json, serde_json::json!({"hash": "abc$def", "clearance": "master"}));
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let creds = Credentials::new("alice", "hunter2");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("alice"));
        assert!(!debug.contains("hunter2"));
    }
}
