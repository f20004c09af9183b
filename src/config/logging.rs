//! Logging setup for the journal.
//!
//! Events go to stderr; stdout is reserved for command output and
//! `--json` envelopes. `RUST_LOG` replaces the configured level entirely.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use crate::error::ConfigError;

/// Pool checkout chatter is only interesting when it fails.
const QUIET_DIRECTIVES: [&str; 1] = ["r2d2=warn"];

/// How log events are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::InvalidValue {
                field: "logging.format",
                reason: format!("expected \"pretty\" or \"json\", got {other:?}"),
            }),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pretty => "pretty",
            Self::Json => "json",
        })
    }
}

/// The `[logging]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive such as `info` or `tradelog=debug`.
    pub level: String,
    /// `pretty` or `json`.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Pretty.to_string(),
        }
    }
}

impl LoggingConfig {
    /// The parsed output format.
    ///
    /// # Errors
    /// `InvalidValue` for anything but `pretty` or `json`.
    pub fn log_format(&self) -> Result<LogFormat, ConfigError> {
        self.format.parse()
    }

    /// Check the level directive and the format.
    ///
    /// # Errors
    /// `InvalidValue` naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        EnvFilter::try_new(&self.level).map_err(|e| ConfigError::InvalidValue {
            field: "logging.level",
            reason: e.to_string(),
        })?;
        self.log_format().map(|_| ())
    }

    /// The configured level plus the journal's quiet directives.
    #[must_use]
    pub fn directives(&self) -> String {
        std::iter::once(self.level.as_str())
            .chain(QUIET_DIRECTIVES)
            .collect::<Vec<_>>()
            .join(",")
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(self.directives()))
            .unwrap_or_else(|_| EnvFilter::new("info"))
    }

    /// Install the global subscriber. A second call is a no-op.
    pub fn init(&self) {
        let builder = tracing_subscriber::fmt()
            .with_env_filter(self.filter())
            .with_writer(std::io::stderr);
        let installed = match self.log_format() {
            Ok(LogFormat::Json) => builder.json().try_init(),
            _ => builder.try_init(),
        };
        if installed.is_err() {
            tracing::debug!("Logging already initialized");
        }
    }
}
