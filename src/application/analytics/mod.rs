//! Analytics aggregator.
//!
//! Scans a user's trades, filters them by allow-list and calendar month,
//! and buckets each trade's net contribution by entry day (or week of month)
//! and by market or instrument.
//!
//! [`aggregate`] is a pure function of the trades, the filter and the date
//! used as the default window anchor.

mod filter;
mod tally;

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

pub use filter::{AnalyticsFilter, GroupBy, Metric, Period};
pub use tally::{compute_percentage, KeySummary, PeriodBucket, Tally};

use super::accounting;
use crate::domain::{Trade, UserId};
use crate::error::Result;
use crate::port::{JournalStore, TradeQuery};

/// Weekly buckets per month; days 29 to 31 fold into the last one.
pub const WEEKS_PER_MONTH: usize = 4;

const ROI_SCALE: u32 = 4;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsReport {
    pub year: i32,
    pub month: u32,
    pub period: Period,
    pub metric: Metric,
    pub group_by: GroupBy,
    pub trade_count: usize,
    pub periods: Vec<PeriodBucket>,
    pub summary: Vec<KeySummary>,
}

/// Aggregate `trades` per `filter`, anchoring the default window on `today`.
#[must_use]
pub fn aggregate(trades: &[Trade], filter: &AnalyticsFilter, today: NaiveDate) -> AnalyticsReport {
    let (year, month) = filter.window(today);
    let mut daily: BTreeMap<NaiveDate, PeriodBucket> = BTreeMap::new();
    let mut trade_count = 0;

    for trade in trades
        .iter()
        .filter(|t| !t.is_deleted && filter.admits(t, (year, month)))
    {
        trade_count += 1;
        let value = contribution(trade, filter.metric);
        daily
            .entry(trade.entry_date)
            .or_insert_with(|| PeriodBucket::new(trade.entry_date.to_string()))
            .record(filter.group_by.key(trade), value);
    }

    let periods = match filter.period {
        Period::Daily => daily.into_values().collect(),
        Period::Weekly => fold_weeks(daily),
    };

    let mut by_key: BTreeMap<String, Tally> = BTreeMap::new();
    for bucket in &periods {
        for (key, tally) in &bucket.by_key {
            by_key.entry(key.clone()).or_default().merge(tally);
        }
    }

    AnalyticsReport {
        year,
        month,
        period: filter.period,
        metric: filter.metric,
        group_by: filter.group_by,
        trade_count,
        periods,
        summary: by_key
            .into_iter()
            .map(|(key, tally)| KeySummary::new(key, tally))
            .collect(),
    }
}

/// The value `trade` adds to its buckets under `metric`.
///
/// Realized P&L is summed from the exit analyses; exits that were never
/// analysed are evaluated on the fly.
#[must_use]
pub fn contribution(trade: &Trade, metric: Metric) -> Decimal {
    let realized = realized(trade);
    match metric {
        Metric::WinLoss => realized,
        Metric::ProfitAndLoss => realized + trade.profit_open,
        Metric::Roi => ((realized + trade.profit_open) * Decimal::ONE_HUNDRED)
            .checked_div(trade.entry_value())
            .map_or(Decimal::ZERO, |r| r.round_dp(ROI_SCALE)),
    }
}

fn realized(trade: &Trade) -> Decimal {
    let mut cumulative = Decimal::ZERO;
    trade
        .exits
        .iter()
        .map(|exit| {
            cumulative += exit.quantity;
            match &exit.analysis {
                Some(analysis) => analysis.realized(),
                None => {
                    accounting::evaluate(trade, exit, cumulative, None, trade.created_at).realized()
                }
            }
        })
        .sum()
}

/// Week of month, 1-based, capped at [`WEEKS_PER_MONTH`].
#[must_use]
pub fn week_of_month(date: NaiveDate) -> usize {
    (date.day() as usize).div_ceil(7).min(WEEKS_PER_MONTH)
}

fn fold_weeks(daily: BTreeMap<NaiveDate, PeriodBucket>) -> Vec<PeriodBucket> {
    let mut weeks: Vec<PeriodBucket> = (1..=WEEKS_PER_MONTH)
        .map(|week| PeriodBucket::new(format!("week-{week}")))
        .collect();
    for (date, day) in &daily {
        weeks[week_of_month(*date) - 1].merge(day);
    }
    weeks
}

/// Store-backed entry point for analytics.
pub struct AnalyticsService<S> {
    store: Arc<S>,
}

impl<S: JournalStore> AnalyticsService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Aggregate every live trade of `user_id`, grouped ones included.
    ///
    /// # Errors
    /// Store failures only.
    pub async fn aggregate(
        &self,
        user_id: &UserId,
        filter: &AnalyticsFilter,
    ) -> Result<AnalyticsReport> {
        let query = TradeQuery::for_user(user_id.clone()).with_grouped();
        let trades = self.store.list_trades(&query).await?;
        let report = aggregate(&trades, filter, Utc::now().date_naive());
        debug!(
            user_id = %user_id,
            scanned = trades.len(),
            matched = report.trade_count,
            year = report.year,
            month = report.month,
            "Analytics aggregated"
        );
        Ok(report)
    }
}
