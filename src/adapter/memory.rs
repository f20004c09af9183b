//! In-memory store implementation.
//!
//! Used by tests and by `--database :memory:` runs. All aggregates live
//! behind one lock so a commit validates and applies under a single write
//! guard.

use std::collections::HashMap;
use std::hash::Hash;

use parking_lot::RwLock;

use crate::domain::{
    AccountId, DomainError, GroupId, GroupTrade, Trade, TradeId, TradingAccount, UserId,
};
use crate::error::{Entity, Error, Result};
use crate::port::{ChangeSet, JournalStore, TradeQuery};

#[derive(Debug, Default)]
struct State {
    accounts: HashMap<AccountId, TradingAccount>,
    trades: HashMap<TradeId, Trade>,
    groups: HashMap<GroupId, GroupTrade>,
}

/// In-memory journal store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn check_version<K, V>(
    map: &HashMap<K, V>,
    id: &K,
    version: u64,
    stored_version: impl Fn(&V) -> u64,
    entity: Entity,
) -> Result<()>
where
    K: Eq + Hash + std::fmt::Display,
{
    let current = map.get(id).map(stored_version);
    match (version, current) {
        (0, None) => Ok(()),
        (v, Some(c)) if v != 0 && v == c => Ok(()),
        _ => Err(Error::conflict(entity, id)),
    }
}

impl JournalStore for MemoryStore {
    async fn get_account(&self, id: AccountId) -> Result<Option<TradingAccount>> {
        Ok(self.state.read().accounts.get(&id).cloned())
    }

    async fn list_accounts(
        &self,
        user_id: &UserId,
        include_deleted: bool,
    ) -> Result<Vec<TradingAccount>> {
        let state = self.state.read();
        let mut accounts: Vec<TradingAccount> = state
            .accounts
            .values()
            .filter(|a| a.user_id == *user_id && (include_deleted || !a.is_deleted))
            .cloned()
            .collect();
        accounts.sort_by_key(|a| a.created_at);
        Ok(accounts)
    }

    async fn get_trade(&self, id: TradeId) -> Result<Option<Trade>> {
        Ok(self.state.read().trades.get(&id).cloned())
    }

    async fn list_trades(&self, query: &TradeQuery) -> Result<Vec<Trade>> {
        let state = self.state.read();
        let mut trades: Vec<Trade> = state
            .trades
            .values()
            .filter(|t| query.matches(t))
            .cloned()
            .collect();
        trades.sort_by(|a, b| {
            a.entry_date
                .cmp(&b.entry_date)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        Ok(trades)
    }

    async fn get_group(&self, id: GroupId) -> Result<Option<GroupTrade>> {
        Ok(self.state.read().groups.get(&id).cloned())
    }

    async fn list_groups(&self, user_id: &UserId) -> Result<Vec<GroupTrade>> {
        let state = self.state.read();
        let mut groups: Vec<GroupTrade> = state
            .groups
            .values()
            .filter(|g| g.user_id == *user_id && !g.is_deleted)
            .cloned()
            .collect();
        groups.sort_by_key(|g| g.created_at);
        Ok(groups)
    }

    async fn commit(&self, changes: ChangeSet) -> Result<()> {
        let mut state = self.state.write();

        for account in &changes.accounts {
            check_version(&state.accounts, &account.id, account.version, |a| a.version, Entity::Account)?;
            // staged accounts shadow their stored copies
            let stored = state
                .accounts
                .values()
                .filter(|a| !changes.accounts.iter().any(|c| c.id == a.id));
            if stored.chain(&changes.accounts).any(|a| a.clashes_with(account)) {
                return Err(DomainError::DuplicateAccountName(account.name.clone()).into());
            }
        }
        for trade in &changes.trades {
            check_version(&state.trades, &trade.id, trade.version, |t| t.version, Entity::Trade)?;
        }
        for group in &changes.groups {
            check_version(&state.groups, &group.id, group.version, |g| g.version, Entity::Group)?;
        }

        for mut account in changes.accounts {
            account.version += 1;
            state.accounts.insert(account.id, account);
        }
        for mut trade in changes.trades {
            trade.version += 1;
            state.trades.insert(trade.id, trade);
        }
        for mut group in changes.groups {
            group.version += 1;
            state.groups.insert(group.id, group);
        }
        Ok(())
    }
}
