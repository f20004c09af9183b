//! Per-exit accounting snapshots.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{AnalysisId, ExitId, TradeId};
use super::money::Amount;
use super::trade::PositionStatus;

/// Longest holding period, in days, still classified as a swing trade.
pub const SWING_MAX_DAYS: i64 = 10;

/// Outcome of an exit that closed the position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClosedResult {
    Profit,
    Loss,
}

impl ClosedResult {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Profit => "Profit",
            Self::Loss => "Loss",
        }
    }
}

impl fmt::Display for ClosedResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClosedResult {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Profit" => Ok(Self::Profit),
            "Loss" => Ok(Self::Loss),
            other => Err(format!("unknown closed result '{other}'")),
        }
    }
}

/// Holding-period classification derived from trade duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeStrategy {
    Intraday,
    Swing,
    Investment,
}

impl TradeStrategy {
    /// Classify a holding period in days.
    ///
    /// Same-day (or earlier) exits are intraday, up to ten days is a swing,
    /// anything longer or still open is an investment.
    #[must_use]
    pub fn classify(duration_days: Option<i64>) -> Self {
        match duration_days {
            None => Self::Investment,
            Some(days) if days > SWING_MAX_DAYS => Self::Investment,
            Some(days) if days <= 0 => Self::Intraday,
            Some(_) => Self::Swing,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Intraday => "Intraday",
            Self::Swing => "Swing",
            Self::Investment => "Investment",
        }
    }
}

impl fmt::Display for TradeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradeStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Intraday" => Ok(Self::Intraday),
            "Swing" => Ok(Self::Swing),
            "Investment" => Ok(Self::Investment),
            other => Err(format!("unknown trade strategy '{other}'")),
        }
    }
}

/// The computed accounting snapshot for one exit event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeAnalysis {
    pub id: AnalysisId,
    pub trade_id: TradeId,
    pub exit_id: ExitId,
    pub position: PositionStatus,
    pub result_closed_position: Option<ClosedResult>,
    pub profit_closed_position: Amount,
    pub loss_closed_position: Amount,
    pub profit_and_loss_open_position: Amount,
    pub trade_duration: Option<i64>,
    pub trade_strategy: TradeStrategy,
    pub investment: Amount,
    pub roi: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TradeAnalysis {
    /// Realized profit or loss crystallized by this exit.
    #[must_use]
    pub fn realized(&self) -> Amount {
        self.profit_closed_position + self.loss_closed_position
    }

    /// True when both snapshots carry the same computed values.
    ///
    /// Identity and timestamps are ignored.
    #[must_use]
    pub fn same_figures(&self, other: &Self) -> bool {
        self.position == other.position
            && self.result_closed_position == other.result_closed_position
            && self.profit_closed_position == other.profit_closed_position
            && self.loss_closed_position == other.loss_closed_position
            && self.profit_and_loss_open_position == other.profit_and_loss_open_position
            && self.trade_duration == other.trade_duration
            && self.trade_strategy == other.trade_strategy
            && self.investment == other.investment
            && self.roi == other.roi
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_boundaries() {
        assert_eq!(TradeStrategy::classify(Some(-2)), TradeStrategy::Intraday);
        assert_eq!(TradeStrategy::classify(Some(0)), TradeStrategy::Intraday);
        assert_eq!(TradeStrategy::classify(Some(1)), TradeStrategy::Swing);
        assert_eq!(TradeStrategy::classify(Some(10)), TradeStrategy::Swing);
        assert_eq!(TradeStrategy::classify(Some(11)), TradeStrategy::Investment);
        assert_eq!(TradeStrategy::classify(None), TradeStrategy::Investment);
    }

    #[test]
    fn enums_round_trip_through_str() {
        for s in [TradeStrategy::Intraday, TradeStrategy::Swing, TradeStrategy::Investment] {
            assert_eq!(s.as_str().parse::<TradeStrategy>().unwrap(), s);
        }
        for r in [ClosedResult::Profit, ClosedResult::Loss] {
            assert_eq!(r.as_str().parse::<ClosedResult>().unwrap(), r);
        }
    }
}
