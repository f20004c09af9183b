//! Journal domain: trades, exits, analyses, groups and accounts.

pub mod account;
pub mod analysis;
pub mod error;
pub mod exit;
pub mod group;
pub mod id;
pub mod money;
pub mod trade;

pub use account::TradingAccount;
pub use analysis::{ClosedResult, TradeAnalysis, TradeStrategy, SWING_MAX_DAYS};
pub use error::DomainError;
pub use exit::{Exit, ExitRequest};
pub use group::GroupTrade;
pub use id::{AccountId, AnalysisId, ExitId, GroupId, TradeId, UserId};
pub use money::{Amount, Price, Quantity};
pub use trade::{PositionStatus, Trade, TradeDetails, TradeType};
