//! Runtime configuration loaded from the environment.
//!
//! Variables:
//! - `BILLDOC_DB_PATH`: SQLite file path; unset or blank selects an in-memory store.
//! - `BILLDOC_LOG_LEVEL`: `trace|debug|info|warn|error`; defaults per build mode.
//! - `BILLDOC_LOG_DIR`: absolute directory for rolling log files; unset logs to stderr.

use crate::logging::{default_log_level, normalize_level, normalize_log_dir, LogTarget};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "BILLDOC_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "BILLDOC_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "BILLDOC_LOG_DIR";

/// Resolved core configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: Option<PathBuf>,
    pub log_level: &'static str,
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            log_level: default_log_level(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Loads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_path = non_blank(lookup(ENV_DB_PATH)).map(PathBuf::from);

        let log_level = match non_blank(lookup(ENV_LOG_LEVEL)) {
            Some(value) => normalize_level(&value).map_err(|reason| ConfigError::Invalid {
                var: ENV_LOG_LEVEL,
                reason,
            })?,
            None => default_log_level(),
        };

        let log_dir = match non_blank(lookup(ENV_LOG_DIR)) {
            Some(value) => Some(normalize_log_dir(&PathBuf::from(value)).map_err(|reason| {
                ConfigError::Invalid {
                    var: ENV_LOG_DIR,
                    reason,
                }
            })?),
            None => None,
        };

        Ok(Self {
            db_path,
            log_level,
            log_dir,
        })
    }

    /// Log sink selected by this configuration.
    pub fn log_target(&self) -> LogTarget {
        match &self.log_dir {
            Some(dir) => LogTarget::Directory(dir.clone()),
            None => LogTarget::Stderr,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

/// Configuration loading error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is set to an unusable value.
    Invalid { var: &'static str, reason: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid { var, reason } => write!(f, "invalid {var}: {reason}"),
        }
    }
}

impl Error for ConfigError {}
