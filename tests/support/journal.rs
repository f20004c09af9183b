use std::sync::Arc;

use tradelog::adapter::cli::Journal;
use tradelog::adapter::memory::MemoryStore;
use tradelog::application::ConflictRetry;
use tradelog::domain::{TradingAccount, UserId};
use tradelog::port::JournalStore;

pub const USER: &str = "trader-1";

pub fn user() -> UserId {
    UserId::new(USER)
}

/// Services over `store` plus one account named "Main" for [`USER`].
pub struct Fixture<S> {
    pub store: Arc<S>,
    pub journal: Journal<S>,
    pub account: TradingAccount,
}

pub async fn fixture_on<S: JournalStore>(store: S) -> Fixture<S> {
    let store = Arc::new(store);
    let journal = Journal::new(store.clone(), ConflictRetry::new(16));
    let account = journal
        .accounts
        .create_account(&user(), "Main")
        .await
        .expect("create account");
    Fixture {
        store,
        journal,
        account,
    }
}

pub async fn fixture() -> Fixture<MemoryStore> {
    fixture_on(MemoryStore::new()).await
}
