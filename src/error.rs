use thiserror::Error;

use crate::domain::error::DomainError;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// The kind of thing that was looked up and not found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Account,
    Trade,
    Exit,
    Group,
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Account => "account",
            Self::Trade => "trade",
            Self::Exit => "exit",
            Self::Group => "group",
        })
    }
}

/// Coarse error taxonomy used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    NotFound,
    BusinessRuleViolation,
    ConcurrencyConflict,
    UnexpectedFailure,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("{entity} {id} not found")]
    NotFound { entity: Entity, id: String },

    #[error("{entity} {id} was modified concurrently")]
    Conflict { entity: Entity, id: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn not_found(entity: Entity, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn conflict(entity: Entity, id: impl ToString) -> Self {
        Self::Conflict {
            entity,
            id: id.to_string(),
        }
    }

    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Domain(_) => ErrorCategory::BusinessRuleViolation,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Conflict { .. } => ErrorCategory::ConcurrencyConflict,
            _ => ErrorCategory::UnexpectedFailure,
        }
    }

    /// HTTP-equivalent status code.
    ///
    /// Not-found is reported as 400 alongside business-rule failures.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self.category() {
            ErrorCategory::NotFound | ErrorCategory::BusinessRuleViolation => 400,
            ErrorCategory::ConcurrencyConflict => 409,
            ErrorCategory::UnexpectedFailure => 500,
        }
    }

    /// Message safe to show to a caller; internal failures are masked.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self.category() {
            ErrorCategory::UnexpectedFailure => "Something went wrong".to_string(),
            ErrorCategory::ConcurrencyConflict => {
                format!("{self}; please retry")
            }
            _ => self.to_string(),
        }
    }
}

impl From<diesel::result::Error> for Error {
    fn from(err: diesel::result::Error) -> Self {
        Error::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn domain_errors_are_business_rule_violations() {
        let err: Error = DomainError::QuantityExceeded {
            requested: dec!(70),
            available: dec!(50),
        }
        .into();
        assert_eq!(err.category(), ErrorCategory::BusinessRuleViolation);
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.public_message(), "exit quantity 70 exceeds open quantity 50");
    }

    #[test]
    fn not_found_maps_to_400() {
        let err = Error::not_found(Entity::Trade, "abc");
        assert_eq!(err.to_string(), "trade abc not found");
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn conflict_maps_to_409() {
        let err = Error::conflict(Entity::Group, "g1");
        assert_eq!(err.category(), ErrorCategory::ConcurrencyConflict);
        assert_eq!(err.status_code(), 409);
    }

    #[test]
    fn unexpected_failures_hide_details() {
        let err = Error::Database("disk I/O error at page 42".into());
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.public_message(), "Something went wrong");
    }
}
