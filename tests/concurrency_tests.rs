//! Concurrent writers against one trade must be linearized.

mod support;

use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use support::journal::{fixture_on, user};
use support::temp_db::TempDb;
use tradelog::adapter::cli::Journal;
use tradelog::adapter::memory::MemoryStore;
use tradelog::application::ConflictRetry;
use tradelog::domain::{DomainError, PositionStatus, TradeType};
use tradelog::error::Error;
use tradelog::port::JournalStore;
use tradelog::testkit::domain::{exit_after, new_trade};

/// Fire `writers` exits of `quantity` each at one trade of size 100 and
/// return how many were accepted.
async fn race_exits<S>(store: S, writers: usize, quantity: Decimal) -> (usize, Arc<Journal<S>>)
where
    S: JournalStore + 'static,
{
    let f = fixture_on(store).await;
    let trade = f
        .journal
        .trades
        .create_trade(f.account.id, new_trade(TradeType::Buy, dec!(100), dec!(50)))
        .await
        .unwrap();
    let journal = Arc::new(Journal::new(f.store.clone(), ConflictRetry::new(64)));

    let handles: Vec<_> = (0..writers)
        .map(|i| {
            let journal = journal.clone();
            tokio::spawn(async move {
                let request = exit_after(i as i64 % 5, quantity, dec!(55));
                let result = journal.trades.apply_exit(trade.id, request).await;
                result
            })
        })
        .collect();

    let mut accepted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(Error::Domain(DomainError::QuantityExceeded { .. })) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    let stored = f.store.get_trade(trade.id).await.unwrap().unwrap();
    assert_eq!(stored.exits.len(), accepted);
    assert_eq!(
        stored.open_quantity + stored.exited_quantity(),
        stored.entry_quantity
    );
    assert!(stored.exited_quantity() <= stored.entry_quantity);
    (accepted, journal)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_exits_never_overshoot_in_memory() {
    let (accepted, journal) = race_exits(MemoryStore::new(), 12, dec!(30)).await;
    assert_eq!(accepted, 3);

    let trades = journal.trades.list_trades_by_user(&user()).await.unwrap();
    assert_eq!(trades[0].open_quantity, dec!(10));
    assert_eq!(trades[0].status, PositionStatus::Open);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_exits_never_overshoot_in_sqlite() {
    let db = TempDb::create();
    let (accepted, journal) = race_exits(db.open(), 8, dec!(25)).await;
    assert_eq!(accepted, 4);

    let trades = journal.trades.list_trades_by_user(&user()).await.unwrap();
    assert_eq!(trades[0].status, PositionStatus::Close);
    assert_eq!(trades[0].profit_closed, dec!(125));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_group_creation_claims_each_trade_once() {
    let f = fixture_on(MemoryStore::new()).await;
    let trade = f
        .journal
        .trades
        .create_trade(f.account.id, new_trade(TradeType::Buy, dec!(10), dec!(10)))
        .await
        .unwrap();
    let journal = Arc::new(Journal::new(f.store.clone(), ConflictRetry::new(64)));

    let handles: Vec<_> = (0..6)
        .map(|i| {
            let journal = journal.clone();
            tokio::spawn(async move {
                let name = format!("g{i}");
                let result = journal
                    .groups
                    .create_group(&user(), &name, &[trade.id])
                    .await;
                result
            })
        })
        .collect();

    let mut created = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            created += 1;
        }
    }

    assert_eq!(created, 1);
    assert_eq!(journal.groups.list_groups(&user()).await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_account_creation_keeps_names_unique_in_sqlite() {
    let db = TempDb::create();
    let f = fixture_on(db.open()).await;
    let journal = Arc::new(Journal::new(f.store.clone(), ConflictRetry::new(64)));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let journal = journal.clone();
            tokio::spawn(async move {
                let name = if i % 2 == 0 { "Joint" } else { "JOINT" };
                let result = journal.accounts.create_account(&user(), name).await;
                result
            })
        })
        .collect();

    let mut created = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(Error::Domain(DomainError::DuplicateAccountName(_))) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(journal.accounts.list_accounts(&user()).await.unwrap().len(), 2);
}
