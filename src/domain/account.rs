//! Trading (broker) accounts, the ownership anchor for trades.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{AccountId, UserId};

/// A broker account belonging to exactly one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingAccount {
    pub id: AccountId,
    pub user_id: UserId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub version: u64,
}

impl TradingAccount {
    /// Create a new, not yet persisted account.
    pub fn new(user_id: UserId, name: impl Into<String>) -> Self {
        Self {
            id: AccountId::generate(),
            user_id,
            name: name.into(),
            created_at: Utc::now(),
            is_deleted: false,
            deleted_at: None,
            version: 0,
        }
    }

    /// Whether both accounts are live, belong to one user and share a name
    /// (ASCII case-insensitive).
    #[must_use]
    pub fn clashes_with(&self, other: &Self) -> bool {
        self.id != other.id
            && !self.is_deleted
            && !other.is_deleted
            && self.user_id == other.user_id
            && self.name.eq_ignore_ascii_case(&other.name)
    }

    /// Soft-delete the account, stamping the deletion time.
    pub fn mark_deleted(&mut self, at: DateTime<Utc>) {
        self.is_deleted = true;
        self.deleted_at = Some(at);
    }
}
