//! Tradelog - a trading journal with exit accounting and analytics.
//!
//! Users record trades under trading accounts, close them through one or
//! more exits, bundle related trades into groups and aggregate results per
//! day or week.
//!
//! # Architecture
//!
//! - [`domain`] - Trades, exits, analyses, groups and accounts
//! - [`application`] - The accounting engine and the services built on it
//!   - `accounting` - Prefix-cumulative replay of exits into P&L, ROI and
//!     holding-period classification
//!   - `TradeService` - Trade lifecycle and exit routing
//!   - `GroupingService` - Group membership and totals
//!   - `AnalyticsService` - Daily and weekly aggregation
//! - [`port`] - The `JournalStore` trait with optimistic, versioned commits
//! - [`adapter`] - Memory and SQLite stores, and the CLI
//! - [`response`] - The `{ code, data, message }` result envelope
//! - [`config`] - TOML configuration and logging setup
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use tradelog::adapter::memory::MemoryStore;
//! use tradelog::application::{AccountService, ConflictRetry};
//! use tradelog::domain::UserId;
//!
//! # async fn demo() -> tradelog::error::Result<()> {
//! let store = Arc::new(MemoryStore::new());
//! let accounts = AccountService::new(store, ConflictRetry::default());
//! let account = accounts.create_account(&UserId::new("alice"), "Main").await?;
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod port;
pub mod response;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
