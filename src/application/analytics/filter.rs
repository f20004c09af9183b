//! Analytics filter and its modes.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::domain::Trade;
use crate::error::Error;

/// Time bucketing of the report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[default]
    Daily,
    /// Week of month, `week-1` to `week-4`.
    Weekly,
}

/// The value each trade contributes to its buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Realized plus open P&L.
    #[default]
    ProfitAndLoss,
    /// Realized plus open P&L as a percentage of entry value.
    Roi,
    /// Realized P&L only.
    WinLoss,
}

/// The key of the per-bucket breakdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    #[default]
    Market,
    Instrument,
}

impl Period {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
        }
    }
}

impl Metric {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ProfitAndLoss => "pnl",
            Self::Roi => "roi",
            Self::WinLoss => "winloss",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Market => "market",
            Self::Instrument => "instrument",
        })
    }
}

impl FromStr for Period {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "daily" | "day" => Ok(Self::Daily),
            "weekly" | "week" => Ok(Self::Weekly),
            other => Err(Error::Parse(format!("unknown period: {other}"))),
        }
    }
}

impl FromStr for Metric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pnl" | "profit_and_loss" => Ok(Self::ProfitAndLoss),
            "roi" => Ok(Self::Roi),
            "winloss" | "win_loss" => Ok(Self::WinLoss),
            other => Err(Error::Parse(format!("unknown metric: {other}"))),
        }
    }
}

impl FromStr for GroupBy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "market" => Ok(Self::Market),
            "instrument" => Ok(Self::Instrument),
            other => Err(Error::Parse(format!("unknown grouping: {other}"))),
        }
    }
}

impl GroupBy {
    /// The breakdown key of `trade`.
    #[must_use]
    pub fn key<'a>(self, trade: &'a Trade) -> &'a str {
        match self {
            Self::Market => &trade.market,
            Self::Instrument => &trade.instrument,
        }
    }
}

/// Which trades to aggregate and how.
///
/// Empty allow-lists admit everything. `year` and `month` default to the
/// current date and are always applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyticsFilter {
    #[serde(default)]
    pub instruments: Vec<String>,
    #[serde(default)]
    pub markets: Vec<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub month: Option<u32>,
    #[serde(default)]
    pub period: Period,
    #[serde(default)]
    pub metric: Metric,
    #[serde(default)]
    pub group_by: GroupBy,
}

impl AnalyticsFilter {
    /// The `(year, month)` window anchored on `today` when unset.
    #[must_use]
    pub fn window(&self, today: NaiveDate) -> (i32, u32) {
        (
            self.year.unwrap_or_else(|| today.year()),
            self.month.unwrap_or_else(|| today.month()),
        )
    }

    /// Whether `trade` passes the allow-lists and the date window.
    #[must_use]
    pub fn admits(&self, trade: &Trade, window: (i32, u32)) -> bool {
        allowed(&self.instruments, &trade.instrument)
            && allowed(&self.markets, &trade.market)
            && trade.entry_date.year() == window.0
            && trade.entry_date.month() == window.1
    }
}

fn allowed(list: &[String], value: &str) -> bool {
    list.is_empty() || list.iter().any(|v| v.eq_ignore_ascii_case(value))
}
