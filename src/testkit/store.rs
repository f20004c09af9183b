//! Store fixtures.

use std::sync::Arc;

use crate::adapter::memory::MemoryStore;
use crate::domain::{TradingAccount, UserId};
use crate::port::{ChangeSet, JournalStore};

/// A memory store holding one account named "Main" for `user`.
pub async fn seeded(user: &str) -> (Arc<MemoryStore>, TradingAccount) {
    let store = Arc::new(MemoryStore::new());
    let mut account = TradingAccount::new(UserId::from(user), "Main");
    store
        .commit(ChangeSet::new().account(account.clone()))
        .await
        .expect("seed account");
    account.version = 1;
    (store, account)
}
