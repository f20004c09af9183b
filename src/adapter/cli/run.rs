//! Command dispatch.
//!
//! Opens the configured store and hands the parsed command to the handler
//! of its group. Handlers are generic over [`JournalStore`] so the memory
//! and SQLite stores run the same code.

use std::sync::Arc;

use tracing::{debug, error};

use super::command::{Cli, Commands};
use super::{account, group, output, stats, trade};
use crate::adapter::memory::MemoryStore;
use crate::adapter::sqlite::SqliteStore;
use crate::application::{
    AccountService, AnalyticsService, ConflictRetry, GroupingService, TradeService,
};
use crate::config::Config;
use crate::domain::UserId;
use crate::port::JournalStore;
use crate::response::Envelope;

/// The application services over one store.
pub struct Journal<S> {
    pub accounts: AccountService<S>,
    pub trades: TradeService<S>,
    pub groups: GroupingService<S>,
    pub analytics: AnalyticsService<S>,
}

impl<S: JournalStore> Journal<S> {
    pub fn new(store: Arc<S>, retry: ConflictRetry) -> Self {
        Self {
            accounts: AccountService::new(store.clone(), retry),
            trades: TradeService::new(store.clone(), retry),
            groups: GroupingService::new(store.clone(), retry),
            analytics: AnalyticsService::new(store),
        }
    }
}

/// Run `cli` against the store named by `config`.
///
/// Returns whether the command succeeded.
pub async fn execute(cli: Cli, config: &Config) -> bool {
    let retry = config.accounting.retry();
    if config.is_memory() {
        debug!("Using in-memory store");
        return dispatch(&Journal::new(Arc::new(MemoryStore::new()), retry), cli).await;
    }

    match SqliteStore::open(&config.database) {
        Ok(store) => {
            debug!(database = %config.database, "Opened SQLite store");
            dispatch(&Journal::new(Arc::new(store), retry), cli).await
        }
        Err(err) => {
            error!(database = %config.database, error = %err, "Failed to open database");
            let envelope: Envelope<()> = Envelope::failure(err.status_code(), err.public_message());
            output::emit(&envelope, |_| {})
        }
    }
}

async fn dispatch<S: JournalStore>(journal: &Journal<S>, cli: Cli) -> bool {
    let user = UserId::new(cli.user);
    match cli.command {
        Commands::Account(command) => account::execute(journal, &user, command).await,
        Commands::Trade(command) => trade::execute(journal, &user, command).await,
        Commands::Group(command) => group::execute(journal, &user, command).await,
        Commands::Stats(args) => stats::execute(journal, &user, args).await,
    }
}
