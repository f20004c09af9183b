//! Business-rule errors for the journal domain.
//!
//! These are the expected failure outcomes of accounting, grouping and
//! account operations. They are returned as values so services can compose
//! them without unwinding, and no write is performed when one is produced.
//!
//! # Examples
//!
//! ```
//! use tradelog::domain::error::DomainError;
//! use rust_decimal_macros::dec;
//!
//! let err = DomainError::QuantityExceeded {
//!     requested: dec!(70),
//!     available: dec!(50),
//! };
//! assert_eq!(err.to_string(), "exit quantity 70 exceeds open quantity 50");
//! ```

use thiserror::Error;

use super::id::TradeId;

/// Errors that occur when domain invariants are violated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Cumulative exited quantity would exceed the entry quantity.
    #[error("exit quantity {requested} exceeds open quantity {available}")]
    QuantityExceeded {
        /// Quantity the caller tried to exit.
        requested: rust_decimal::Decimal,
        /// Quantity still available to exit.
        available: rust_decimal::Decimal,
    },

    /// Exit quantity or price is not strictly positive.
    #[error("invalid exit data: {0}")]
    InvalidExitData(String),

    /// Trade entry fields are unusable (non-positive quantity or price).
    #[error("invalid trade data: {0}")]
    InvalidTradeData(String),

    /// Candidate group members disagree on market or broker.
    #[error("trades do not share the same {field}")]
    InconsistentGroupFields {
        /// The field that differs (`market` or `broker`).
        field: &'static str,
    },

    /// Trade is deleted or already belongs to an active group.
    #[error("trade {0} is deleted or already grouped")]
    TradeAlreadyGrouped(TradeId),

    /// Trade is not a member of the group it is being removed from.
    #[error("trade {0} is not a member of this group")]
    TradeNotInGroup(TradeId),

    /// A group needs at least one member trade.
    #[error("a group needs at least one trade")]
    EmptyGroup,

    /// The user already has an active account with this name.
    #[error("account name '{0}' already exists")]
    DuplicateAccountName(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inconsistent_fields_names_the_field() {
        let err = DomainError::InconsistentGroupFields { field: "broker" };
        assert_eq!(err.to_string(), "trades do not share the same broker");
    }

    #[test]
    fn duplicate_account_message() {
        let err = DomainError::DuplicateAccountName("Zerodha".into());
        assert!(err.to_string().contains("Zerodha"));
    }
}
