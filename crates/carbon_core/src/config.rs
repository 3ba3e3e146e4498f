//! Runtime configuration loaded from environment variables.
//!
//! | Env Var            | Default               |
//! |--------------------|-----------------------|
//! | `SQLITE_FILE`      | `db/carbon.sqlite3`   |
//! | `CARBON_LOG_LEVEL` | `default_log_level()` |
//! | `CARBON_LOG_DIR`   | unset (no file logs)  |
//! | `CARBON_TOP_N`     | `6`                   |

use crate::logging::default_log_level;
use crate::service::impact::DEFAULT_TOP_N;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_SQLITE_FILE: &str = "SQLITE_FILE";
pub const ENV_LOG_LEVEL: &str = "CARBON_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "CARBON_LOG_DIR";
pub const ENV_TOP_N: &str = "CARBON_TOP_N";

const DEFAULT_DB_PATH: &str = "db/carbon.sqlite3";

/// Environment value that could not be interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub variable: &'static str,
    pub value: String,
    pub reason: &'static str,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid value `{}` for {}: {}",
            self.value, self.variable, self.reason
        )
    }
}

impl Error for ConfigError {}

/// Core runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// File logging stays disabled when unset.
    pub log_dir: Option<PathBuf>,
    pub top_n: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            log_level: default_log_level().to_string(),
            log_dir: None,
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl CoreConfig {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        let top_n = match read(ENV_TOP_N) {
            Some(value) => match value.parse::<usize>() {
                Ok(parsed) if parsed > 0 => parsed,
                _ => {
                    return Err(ConfigError {
                        variable: ENV_TOP_N,
                        value,
                        reason: "expected a positive integer",
                    })
                }
            },
            None => defaults.top_n,
        };

        Ok(Self {
            db_path: read(ENV_SQLITE_FILE).map_or(defaults.db_path, PathBuf::from),
            log_level: read(ENV_LOG_LEVEL).unwrap_or(defaults.log_level),
            log_dir: read(ENV_LOG_DIR).map(PathBuf::from),
            top_n,
        })
    }
}
