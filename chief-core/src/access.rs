//! Access configuration
//!
//! The access configuration document maps usernames to a salted password hash and
//! a clearance. It lives at `<chief home>/config.json` and is always loaded and
//! saved as a whole.
//!
//! This module also holds the clearance check shared by the daemon's access gate and
//! the CLI's local user management.

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::access::{Clearance, Credentials, User};

/// Name of the directory created under the user's home
pub const CHIEF_DIR: &str = ".chief";

/// Name of the access configuration document inside the chief home
pub const CONFIG_FILE: &str = "config.json";

/// Errors raised while loading or modifying the access configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to determine the user's home directory")]
    HomeNotFound,

    #[error("unable to load chief config at {path}, have you run 'chief setup' yet?")]
    NotFound { path: PathBuf },

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed chief config at {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("username cannot be blank")]
    BlankUsername,

    #[error("password cannot be blank")]
    BlankPassword,

    #[error("user '{0}' already exists")]
    UserExists(String),

    #[error("user '{0}' does not exist")]
    UnknownUser(String),

    #[error("cannot remove a user with master clearance")]
    RemoveMaster,

    #[error("failed to hash password: {0}")]
    Hash(String),
}

/// Outcome of a failed authorization check
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    /// No credentials, unknown user or wrong password
    #[error("not authenticated")]
    NotAuthenticated,

    /// Valid credentials with insufficient clearance
    #[error("user is of {actual} clearance, minimum {required} clearance required")]
    Denied {
        actual: Clearance,
        required: Clearance,
    },
}

/// Resolves the chief home directory
///
/// `CHIEF_HOME` overrides the default of `~/.chief`.
pub fn chief_home() -> Result<PathBuf, ConfigError> {
    if let Ok(home) = std::env::var("CHIEF_HOME") {
        if !home.trim().is_empty() {
            return Ok(PathBuf::from(home));
        }
    }

    dirs::home_dir()
        .map(|home| home.join(CHIEF_DIR))
        .ok_or(ConfigError::HomeNotFound)
}

/// The access configuration document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessConfig {
    #[serde(default)]
    pub access: BTreeMap<String, User>,
}

impl AccessConfig {
    /// Path of the document inside a chief home
    pub fn path_in(home: &Path) -> PathBuf {
        home.join(CONFIG_FILE)
    }

    /// Loads the document from `path`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let bytes = std::fs::read(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        serde_json::from_slice(&bytes).map_err(|source| ConfigError::Malformed {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Writes the whole document to `path`, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let json = serde_json::to_vec_pretty(self).map_err(|source| ConfigError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;

        std::fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Whether any user holds master clearance
    pub fn has_master(&self) -> bool {
        self.access
            .values()
            .any(|user| user.clearance == Clearance::Master)
    }

    /// Adds a user with a freshly hashed password
    pub fn add_user(
        &mut self,
        username: &str,
        password: &str,
        clearance: Clearance,
    ) -> Result<(), ConfigError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(ConfigError::BlankUsername);
        }
        if password.is_empty() {
            return Err(ConfigError::BlankPassword);
        }
        if self.access.contains_key(username) {
            return Err(ConfigError::UserExists(username.to_string()));
        }

        self.access.insert(
            username.to_string(),
            User {
                password_hash: hash_password(password)?,
                clearance,
            },
        );
        Ok(())
    }

    /// Removes a user; master users cannot be removed
    pub fn remove_user(&mut self, username: &str) -> Result<User, ConfigError> {
        let user = self
            .access
            .get(username)
            .ok_or_else(|| ConfigError::UnknownUser(username.to_string()))?;

        if user.clearance == Clearance::Master {
            return Err(ConfigError::RemoveMaster);
        }

        self.access
            .remove(username)
            .ok_or_else(|| ConfigError::UnknownUser(username.to_string()))
    }

    /// Checks `credentials` against the document for the `required` clearance
    pub fn authorize(
        &self,
        credentials: Option<&Credentials>,
        required: Clearance,
    ) -> Result<Clearance, AccessError> {
        let credentials = credentials.ok_or(AccessError::NotAuthenticated)?;
        let user = self
            .access
            .get(&credentials.username)
            .ok_or(AccessError::NotAuthenticated)?;

        if !verify_password(&credentials.password, &user.password_hash) {
            return Err(AccessError::NotAuthenticated);
        }

        if !user.clearance.satisfies(required) {
            return Err(AccessError::Denied {
                actual: user.clearance,
                required,
            });
        }

        Ok(user.clearance)
    }
}

/// Hashes a password into an Argon2id PHC string with a random salt
pub fn hash_password(password: &str) -> Result<String, ConfigError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ConfigError::Hash(e.to_string()))
}

/// Verifies a password against a hash produced by [`hash_password`]
///
/// A stored value that is not a valid PHC string never verifies.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Ok(expected) = PasswordHash::new(stored) else {
        tracing::warn!("Stored password hash is not a valid PHC string");
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &expected)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_users() -> AccessConfig {
        let mut config = AccessConfig::default();
        config.add_user("root", "s3cret", Clearance::Master).unwrap();
        config.add_user("dev", "devpass", Clearance::Normal).unwrap();
        config
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("hunter2").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
        assert!(!verify_password("hunter2", "no-separator"));
    }

    #[test]
    fn test_hash_is_salted() {
        assert_ne!(hash_password("same").unwrap(), hash_password("same").unwrap());
    }

    #[test]
    fn test_plain_digest_is_not_accepted_as_hash() {
        let salt = "5f1c0f9e7c2b4d1aa3b6e8d9c0f1a2b3";
        let digest = "2bb80d537b1da3e38bd30361aa855686bde0eacd7162fef6a25fe97bf527a25b";
        assert!(!verify_password("hunter2", &format!("{}${}", salt, digest)));
    }

    #[test]
    fn test_add_user_validation() {
        let mut config = config_with_users();
        assert!(matches!(
            config.add_user(" ", "x", Clearance::Normal),
            Err(ConfigError::BlankUsername)
        ));
        assert!(matches!(
            config.add_user("new", "", Clearance::Normal),
            Err(ConfigError::BlankPassword)
        ));
        assert!(matches!(
            config.add_user("dev", "x", Clearance::Normal),
            Err(ConfigError::UserExists(_))
        ));
    }

    #[test]
    fn test_remove_user() {
        let mut config = config_with_users();
        assert!(matches!(
            config.remove_user("root"),
            Err(ConfigError::RemoveMaster)
        ));
        assert!(matches!(
            config.remove_user("ghost"),
            Err(ConfigError::UnknownUser(_))
        ));
        assert!(config.remove_user("dev").is_ok());
        assert!(!config.access.contains_key("dev"));
    }

    #[test]
    fn test_authorize() {
        let config = config_with_users();
        let root = Credentials::new("root", "s3cret");
        let dev = Credentials::new("dev", "devpass");

        assert_eq!(
            config.authorize(Some(&root), Clearance::Master),
            Ok(Clearance::Master)
        );
        assert_eq!(
            config.authorize(Some(&dev), Clearance::Normal),
            Ok(Clearance::Normal)
        );
        assert_eq!(
            config.authorize(Some(&dev), Clearance::Master),
            Err(AccessError::Denied {
                actual: Clearance::Normal,
                required: Clearance::Master
            })
        );
        assert_eq!(
            config.authorize(Some(&Credentials::new("dev", "wrong")), Clearance::Normal),
            Err(AccessError::NotAuthenticated)
        );
        assert_eq!(
            config.authorize(None, Clearance::Normal),
            Err(AccessError::NotAuthenticated)
        );
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = AccessConfig::path_in(&dir.path().join("home"));

        let config = config_with_users();
        config.save(&path).unwrap();

        let loaded = AccessConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
        assert!(loaded.has_master());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = AccessConfig::load(&dir.path().join("config.json"));
        assert!(matches!(result, Err(ConfigError::NotFound { .. })));
    }
}
