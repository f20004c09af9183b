//! Application configuration loading and validation.
//!
//! Settings come from a TOML file; a missing file means defaults. The
//! database path can be overridden with `TRADELOG_DATABASE`.
//!
//! ```toml
//! database = "tradelog.db"
//!
//! [logging]
//! level = "info"
//! format = "pretty"
//!
//! [accounting]
//! max_conflict_retries = 3
//! ```

use std::io::ErrorKind;
use std::path::Path;

use serde::Deserialize;

use super::logging::LoggingConfig;
use crate::application::retry::ConflictRetry;
use crate::error::{ConfigError, Result};

/// Environment variable overriding [`Config::database`].
pub const DATABASE_ENV: &str = "TRADELOG_DATABASE";

/// In-memory database path; selects the memory store.
pub const MEMORY_DATABASE: &str = ":memory:";

const MAX_CONFLICT_RETRIES_LIMIT: u32 = 100;

/// Accounting settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AccountingConfig {
    /// Retries of a read-modify-commit cycle after a version conflict.
    pub max_conflict_retries: u32,
}

impl Default for AccountingConfig {
    fn default() -> Self {
        Self {
            max_conflict_retries: ConflictRetry::default().max_retries,
        }
    }
}

impl AccountingConfig {
    #[must_use]
    pub fn retry(&self) -> ConflictRetry {
        ConflictRetry::new(self.max_conflict_retries)
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// SQLite database path, or `:memory:`.
    #[serde(default = "default_database_path")]
    pub database: String,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub accounting: AccountingConfig,
}

fn default_database_path() -> String {
    "tradelog.db".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: default_database_path(),
            logging: LoggingConfig::default(),
            accounting: AccountingConfig::default(),
        }
    }
}

impl Config {
    /// Parse and validate TOML settings. Environment overrides are not applied.
    #[allow(clippy::result_large_err)]
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load settings from `path`, falling back to defaults when the file does
    /// not exist, then apply environment overrides.
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => String::new(),
            Err(err) => return Err(ConfigError::ReadFile(err).into()),
        };
        let mut config = Self::parse_toml(&content)?;
        if let Ok(database) = std::env::var(DATABASE_ENV) {
            config.database = database;
            config.validate()?;
        }
        Ok(config)
    }

    /// Whether the configured database is the in-memory store.
    #[must_use]
    pub fn is_memory(&self) -> bool {
        self.database == MEMORY_DATABASE
    }

    pub fn init_logging(&self) {
        self.logging.init();
    }

    #[allow(clippy::result_large_err)]
    fn validate(&self) -> Result<()> {
        if self.database.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "database",
                reason: "cannot be empty".to_string(),
            }
            .into());
        }
        self.logging.validate()?;
        if self.accounting.max_conflict_retries > MAX_CONFLICT_RETRIES_LIMIT {
            return Err(ConfigError::InvalidValue {
                field: "accounting.max_conflict_retries",
                reason: format!("must be at most {MAX_CONFLICT_RETRIES_LIMIT}"),
            }
            .into());
        }
        Ok(())
    }
}
