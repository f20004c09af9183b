//! Handler for the `stats` command.

use tabled::Tabled;

use super::command::StatsArgs;
use super::output;
use super::run::Journal;
use crate::application::analytics::{AnalyticsFilter, AnalyticsReport, KeySummary, PeriodBucket};
use crate::domain::UserId;
use crate::port::JournalStore;
use crate::response::Envelope;

#[derive(Tabled)]
struct PeriodRow {
    #[tabled(rename = "Period")]
    label: String,
    #[tabled(rename = "Trades")]
    count: u64,
    #[tabled(rename = "Wins")]
    wins: u64,
    #[tabled(rename = "Losses")]
    losses: u64,
    #[tabled(rename = "Profit")]
    profit: String,
    #[tabled(rename = "Loss")]
    loss: String,
    #[tabled(rename = "Net")]
    net: String,
}

impl From<&PeriodBucket> for PeriodRow {
    fn from(bucket: &PeriodBucket) -> Self {
        let totals = &bucket.totals;
        Self {
            label: bucket.label.clone(),
            count: totals.count,
            wins: totals.win_count,
            losses: totals.loss_count,
            profit: totals.total_profit.normalize().to_string(),
            loss: totals.total_loss.normalize().to_string(),
            net: totals.net().normalize().to_string(),
        }
    }
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Trades")]
    count: u64,
    #[tabled(rename = "Net")]
    net: String,
    #[tabled(rename = "Win %")]
    win_ratio: String,
}

impl From<&KeySummary> for SummaryRow {
    fn from(summary: &KeySummary) -> Self {
        Self {
            key: summary.key.clone(),
            count: summary.tally.count,
            net: summary.tally.net().normalize().to_string(),
            win_ratio: format!("{:.1}", summary.win_ratio),
        }
    }
}

impl From<StatsArgs> for AnalyticsFilter {
    fn from(args: StatsArgs) -> Self {
        Self {
            instruments: args.instruments,
            markets: args.markets,
            year: args.year,
            month: args.month,
            period: args.period,
            metric: args.metric,
            group_by: args.group_by,
        }
    }
}

fn render(report: &AnalyticsReport) {
    output::field("month", format!("{}-{:02}", report.year, report.month));
    output::field("metric", report.metric);
    output::field("trades", report.trade_count);

    output::section(&format!("By {} period", report.period));
    output::table(report.periods.iter().map(PeriodRow::from).collect(), "no trades");

    output::section(&format!("By {}", report.group_by));
    output::table(report.summary.iter().map(SummaryRow::from).collect(), "no trades");
}

pub async fn execute<S: JournalStore>(
    journal: &Journal<S>,
    user: &UserId,
    args: StatsArgs,
) -> bool {
    let filter = AnalyticsFilter::from(args);
    let result = journal.analytics.aggregate(user, &filter).await;
    let envelope = Envelope::from_result(result, 200, "Analytics computed");
    output::emit(&envelope, render)
}
