//! Trading account service.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::retry::ConflictRetry;
use crate::domain::{AccountId, DomainError, TradingAccount, UserId};
use crate::error::{Entity, Error, Result};
use crate::port::{ChangeSet, JournalStore, TradeQuery};

pub struct AccountService<S> {
    store: Arc<S>,
    retry: ConflictRetry,
}

impl<S: JournalStore> AccountService<S> {
    pub fn new(store: Arc<S>, retry: ConflictRetry) -> Self {
        Self { store, retry }
    }

    /// Open a new account for `user_id`.
    ///
    /// # Errors
    /// `DuplicateAccountName` when the user already has a live account with
    /// the same name (compared case-insensitively). The store enforces the
    /// same rule at commit, so concurrent creates cannot both succeed.
    pub async fn create_account(&self, user_id: &UserId, name: &str) -> Result<TradingAccount> {
        let mut account = TradingAccount::new(user_id.clone(), name.trim());
        let existing = self.store.list_accounts(user_id, false).await?;
        if existing.iter().any(|a| a.clashes_with(&account)) {
            return Err(DomainError::DuplicateAccountName(account.name).into());
        }

        self.store.commit(ChangeSet::new().account(account.clone())).await?;
        account.version += 1;
        info!(account_id = %account.id, user_id = %user_id, "Account created");
        Ok(account)
    }

    /// A user's live accounts, oldest first.
    ///
    /// # Errors
    /// Store failures only.
    pub async fn list_accounts(&self, user_id: &UserId) -> Result<Vec<TradingAccount>> {
        self.store.list_accounts(user_id, false).await
    }

    /// Soft-delete an account and every trade recorded under it.
    ///
    /// # Errors
    /// `NotFound` for a missing or already deleted account.
    pub async fn delete_account(&self, account_id: AccountId) -> Result<TradingAccount> {
        let (mut account, cascaded) = self
            .retry
            .run("delete_account", || async {
                let mut account = self
                    .store
                    .get_account(account_id)
                    .await?
                    .filter(|a| !a.is_deleted)
                    .ok_or_else(|| Error::not_found(Entity::Account, account_id))?;
                account.mark_deleted(Utc::now());

                let query = TradeQuery::for_account(account_id).with_grouped();
                let trades: Vec<_> = self
                    .store
                    .list_trades(&query)
                    .await?
                    .into_iter()
                    .map(|mut t| {
                        t.is_deleted = true;
                        t
                    })
                    .collect();
                let cascaded = trades.len();

                self.store
                    .commit(ChangeSet::new().account(account.clone()).trades(trades))
                    .await?;
                Ok((account, cascaded))
            })
            .await?;

        account.version += 1;
        info!(account_id = %account_id, trades = cascaded, "Account deleted");
        Ok(account)
    }
}
