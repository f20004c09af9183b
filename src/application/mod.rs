//! Application services (use cases).
//!
//! These services orchestrate the accounting engine and the journal store
//! to implement the application's use cases.

pub mod account;
pub mod accounting;
pub mod analytics;
pub mod grouping;
pub mod lifecycle;
pub mod retry;

pub use account::AccountService;
pub use analytics::{AnalyticsFilter, AnalyticsReport, AnalyticsService};
pub use grouping::{GroupView, GroupingService};
pub use lifecycle::{ExitChange, ExitOutcome, NewTrade, TradeReport, TradeService, TradeUpdate};
pub use retry::ConflictRetry;
