//! Result envelope returned to callers.
//!
//! Every outcome, success or failure, carries a status code and a message.

use serde::Serialize;
use tracing::error;

use crate::error::{ErrorCategory, Result};

/// `{ code, data, message }` wrapper around a service result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope<T> {
    pub code: u16,
    pub data: Option<T>,
    pub message: String,
}

impl<T> Envelope<T> {
    pub fn success(code: u16, data: T, message: impl Into<String>) -> Self {
        Self {
            code,
            data: Some(data),
            message: message.into(),
        }
    }

    pub fn failure(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            data: None,
            message: message.into(),
        }
    }

    /// Wrap a service result. Unexpected failures are logged here and
    /// reported with a generic message.
    pub fn from_result(result: Result<T>, success_code: u16, success_message: &str) -> Self {
        match result {
            Ok(data) => Self::success(success_code, data, success_message),
            Err(err) => {
                if err.category() == ErrorCategory::UnexpectedFailure {
                    error!(error = %err, "Unexpected failure");
                }
                Self::failure(err.status_code(), err.public_message())
            }
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.code < 400
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainError;
    use crate::error::{Entity, Error};
    use rust_decimal_macros::dec;

    #[test]
    fn success_carries_data() {
        let envelope = Envelope::from_result(Ok(5), 201, "Trade created");
        assert_eq!(envelope, Envelope::success(201, 5, "Trade created"));
        assert!(envelope.is_success());
    }

    #[test]
    fn business_rule_is_400_with_reason() {
        let err: Error = DomainError::QuantityExceeded {
            requested: dec!(70),
            available: dec!(50),
        }
        .into();
        let envelope: Envelope<()> = Envelope::from_result(Err(err), 200, "ok");

        assert_eq!(envelope.code, 400);
        assert!(envelope.data.is_none());
        assert!(envelope.message.contains("exceeds open quantity"));
    }

    #[test]
    fn not_found_is_400() {
        let envelope: Envelope<()> =
            Envelope::from_result(Err(Error::not_found(Entity::Trade, "t1")), 200, "ok");
        assert_eq!(envelope.code, 400);
        assert_eq!(envelope.message, "trade t1 not found");
    }

    #[test]
    fn unexpected_failure_is_masked() {
        let err = Error::Database("disk I/O error at page 7".into());
        let envelope: Envelope<()> = Envelope::from_result(Err(err), 200, "ok");

        assert_eq!(envelope.code, 500);
        assert_eq!(envelope.message, "Something went wrong");
        assert!(!envelope.is_success());
    }

    #[test]
    fn serializes_with_null_data_on_failure() {
        let envelope: Envelope<u8> = Envelope::failure(409, "retry");
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["code"], 409);
        assert!(json["data"].is_null());
    }
}
