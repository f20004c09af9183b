//! The trade aggregate: one instrument position and its ordered exits.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::exit::Exit;
use super::id::{AccountId, ExitId, GroupId, TradeId, UserId};
use super::money::{Amount, Price, Quantity};

/// Direction of the opening fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeType {
    Buy,
    Sell,
}

impl TradeType {
    /// +1 for long positions, -1 for short positions.
    #[must_use]
    pub fn sign(self) -> Decimal {
        match self {
            Self::Buy => Decimal::ONE,
            Self::Sell => Decimal::NEGATIVE_ONE,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "Buy",
            Self::Sell => "Sell",
        }
    }
}

impl fmt::Display for TradeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" | "long" => Ok(Self::Buy),
            "sell" | "short" => Ok(Self::Sell),
            other => Err(format!("unknown trade type '{other}'")),
        }
    }
}

/// Whether a position still has unexited quantity.
///
/// Used both for the trade status and for the position recorded in each
/// exit's analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PositionStatus {
    Open,
    Close,
}

impl PositionStatus {
    /// Returns true if the position is open.
    #[must_use]
    pub fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::Close => "Close",
        }
    }
}

impl fmt::Display for PositionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PositionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Open" => Ok(Self::Open),
            "Close" => Ok(Self::Close),
            other => Err(format!("unknown position status '{other}'")),
        }
    }
}

/// Descriptive fields that never take part in accounting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strike_price: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brokerage: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lot_size: Option<Quantity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_of_lots: Option<Quantity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_assessment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

/// One instrument position opened by a user under a trading account.
///
/// The accounting fields (`open_quantity`, `status`, `profit_closed`,
/// `profit_open`) are owned by the accounting engine; everything else is
/// user-supplied. `version` is the optimistic-concurrency token checked by
/// the store on commit (0 means not yet persisted).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    pub account_id: AccountId,
    pub user_id: UserId,

    pub market: String,
    pub instrument: String,
    pub exchange: String,
    pub broker: String,
    pub trade_type: TradeType,
    pub entry_date: NaiveDate,
    pub entry_time: String,
    pub entry_month: String,
    pub entry_weekday: String,
    pub entry_quantity: Quantity,
    pub entry_price: Price,
    #[serde(flatten)]
    pub details: TradeDetails,

    pub cmp: Option<Price>,
    pub open_quantity: Quantity,
    pub status: PositionStatus,
    pub profit_closed: Amount,
    pub profit_open: Amount,

    pub is_grouped: bool,
    pub group_id: Option<GroupId>,
    pub is_deleted: bool,

    pub exits: Vec<Exit>,
    pub created_at: DateTime<Utc>,
    pub version: u64,
}

impl Trade {
    /// Sum of all exit quantities.
    #[must_use]
    pub fn exited_quantity(&self) -> Quantity {
        self.exits.iter().map(|e| e.quantity).sum()
    }

    /// Position of an exit in the chronological (insertion) order.
    #[must_use]
    pub fn exit_index(&self, exit_id: ExitId) -> Option<usize> {
        self.exits.iter().position(|e| e.id == exit_id)
    }

    #[must_use]
    pub fn exit(&self, exit_id: ExitId) -> Option<&Exit> {
        self.exits.iter().find(|e| e.id == exit_id)
    }

    /// Capital committed at entry.
    #[must_use]
    pub fn entry_value(&self) -> Amount {
        self.entry_quantity * self.entry_price
    }

    /// Realized plus unrealized profit.
    #[must_use]
    pub fn net_profit(&self) -> Amount {
        self.profit_closed + self.profit_open
    }

    /// Eligible to join a group: alive and not grouped elsewhere.
    #[must_use]
    pub fn is_groupable(&self) -> bool {
        !self.is_deleted && !self.is_grouped
    }
}
