//! Store port for persistence operations.
//!
//! The journal is read through per-aggregate lookups and written through a
//! single all-or-nothing [`JournalStore::commit`]. Every aggregate carries a
//! `version`; a commit only succeeds if each changed aggregate is still at
//! the version it was read at, which linearizes concurrent writers.
//!
//! # Implementation Notes
//!
//! - Implementations must be thread-safe (`Send + Sync`)
//! - `commit` must apply every change or none of them
//! - A new aggregate has version 0; committing it inserts it and fails with
//!   a conflict if the id already exists
//! - On success every committed aggregate is stored at `version + 1`

use std::future::Future;

use crate::domain::{AccountId, GroupId, GroupTrade, Trade, TradeId, TradingAccount, UserId};
use crate::error::Result;

/// Selection of trades for listing.
#[derive(Debug, Clone, Default)]
pub struct TradeQuery {
    pub user_id: Option<UserId>,
    pub account_id: Option<AccountId>,
    pub include_deleted: bool,
    pub include_grouped: bool,
}

impl TradeQuery {
    /// Live, ungrouped trades of one user.
    #[must_use]
    pub fn for_user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    /// Live, ungrouped trades of one account.
    #[must_use]
    pub fn for_account(account_id: AccountId) -> Self {
        Self {
            account_id: Some(account_id),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_grouped(mut self) -> Self {
        self.include_grouped = true;
        self
    }

    #[must_use]
    pub fn with_deleted(mut self) -> Self {
        self.include_deleted = true;
        self
    }

    /// Whether `trade` satisfies this query.
    #[must_use]
    pub fn matches(&self, trade: &Trade) -> bool {
        self.user_id.as_ref().map_or(true, |u| *u == trade.user_id)
            && self.account_id.map_or(true, |a| a == trade.account_id)
            && (self.include_deleted || !trade.is_deleted)
            && (self.include_grouped || !trade.is_grouped)
    }
}

/// A batch of aggregates to persist atomically.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    pub accounts: Vec<TradingAccount>,
    pub trades: Vec<Trade>,
    pub groups: Vec<GroupTrade>,
}

impl ChangeSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn account(mut self, account: TradingAccount) -> Self {
        self.accounts.push(account);
        self
    }

    #[must_use]
    pub fn trade(mut self, trade: Trade) -> Self {
        self.trades.push(trade);
        self
    }

    #[must_use]
    pub fn trades(mut self, trades: impl IntoIterator<Item = Trade>) -> Self {
        self.trades.extend(trades);
        self
    }

    #[must_use]
    pub fn group(mut self, group: GroupTrade) -> Self {
        self.groups.push(group);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty() && self.trades.is_empty() && self.groups.is_empty()
    }
}

/// Storage operations for the trading journal.
pub trait JournalStore: Send + Sync {
    /// Get an account by ID, deleted or not.
    fn get_account(
        &self,
        id: AccountId,
    ) -> impl Future<Output = Result<Option<TradingAccount>>> + Send;

    /// List a user's accounts, optionally including deleted ones.
    fn list_accounts(
        &self,
        user_id: &UserId,
        include_deleted: bool,
    ) -> impl Future<Output = Result<Vec<TradingAccount>>> + Send;

    /// Get a trade with its exits and analyses populated.
    fn get_trade(&self, id: TradeId) -> impl Future<Output = Result<Option<Trade>>> + Send;

    /// List trades matching `query`, oldest entry first.
    fn list_trades(&self, query: &TradeQuery) -> impl Future<Output = Result<Vec<Trade>>> + Send;

    /// Get a group by ID, deleted or not.
    fn get_group(&self, id: GroupId) -> impl Future<Output = Result<Option<GroupTrade>>> + Send;

    /// List a user's non-deleted groups.
    fn list_groups(&self, user_id: &UserId)
        -> impl Future<Output = Result<Vec<GroupTrade>>> + Send;

    /// Persist every aggregate in `changes`, or none of them.
    ///
    /// Fails with `Error::Conflict` when any aggregate's stored version
    /// differs from the version it carries.
    fn commit(&self, changes: ChangeSet) -> impl Future<Output = Result<()>> + Send;
}
