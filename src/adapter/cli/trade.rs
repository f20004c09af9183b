//! Handler for the `trade` command group.

use rust_decimal::Decimal;
use tabled::Tabled;

use super::command::{DetailArgs, ExitArgs, TradeAddArgs, TradeCommand, TradeUpdateArgs};
use super::output;
use super::run::Journal;
use crate::application::{NewTrade, TradeReport, TradeUpdate};
use crate::domain::{Exit, ExitRequest, Trade, TradeAnalysis, TradeDetails, UserId};
use crate::error::Result;
use crate::port::JournalStore;
use crate::response::Envelope;

#[derive(Tabled)]
struct TradeRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Market")]
    market: String,
    #[tabled(rename = "Instrument")]
    instrument: String,
    #[tabled(rename = "Type")]
    trade_type: String,
    #[tabled(rename = "Qty")]
    quantity: String,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Open")]
    open: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Closed P&L")]
    profit_closed: String,
    #[tabled(rename = "Open P&L")]
    profit_open: String,
}

impl From<&Trade> for TradeRow {
    fn from(trade: &Trade) -> Self {
        Self {
            id: trade.id.to_string(),
            date: trade.entry_date.to_string(),
            market: trade.market.clone(),
            instrument: trade.instrument.clone(),
            trade_type: trade.trade_type.to_string(),
            quantity: amount(trade.entry_quantity),
            price: amount(trade.entry_price),
            open: amount(trade.open_quantity),
            status: trade.status.to_string(),
            profit_closed: amount(trade.profit_closed),
            profit_open: amount(trade.profit_open),
        }
    }
}

#[derive(Tabled)]
struct ExitRow {
    #[tabled(rename = "Exit ID")]
    id: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Qty")]
    quantity: String,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Position")]
    position: String,
    #[tabled(rename = "Realized")]
    realized: String,
}

impl From<&Exit> for ExitRow {
    fn from(exit: &Exit) -> Self {
        Self {
            id: exit.id.to_string(),
            date: exit.exit_date.to_string(),
            time: output::opt(exit.exit_time.as_deref()),
            quantity: amount(exit.quantity),
            price: amount(exit.price),
            position: output::opt(exit.analysis.as_ref().map(|a| a.position)),
            realized: output::opt(exit.analysis.as_ref().map(|a| amount(a.realized()))),
        }
    }
}

#[derive(Tabled)]
struct AnalysisRow {
    #[tabled(rename = "Exit ID")]
    exit_id: String,
    #[tabled(rename = "Position")]
    position: String,
    #[tabled(rename = "Result")]
    result: String,
    #[tabled(rename = "Profit")]
    profit: String,
    #[tabled(rename = "Loss")]
    loss: String,
    #[tabled(rename = "Open P&L")]
    open: String,
    #[tabled(rename = "Days")]
    duration: String,
    #[tabled(rename = "Strategy")]
    strategy: String,
    #[tabled(rename = "ROI %")]
    roi: String,
}

impl From<&TradeAnalysis> for AnalysisRow {
    fn from(analysis: &TradeAnalysis) -> Self {
        Self {
            exit_id: analysis.exit_id.to_string(),
            position: analysis.position.to_string(),
            result: output::opt(analysis.result_closed_position),
            profit: amount(analysis.profit_closed_position),
            loss: amount(analysis.loss_closed_position),
            open: amount(analysis.profit_and_loss_open_position),
            duration: output::opt(analysis.trade_duration),
            strategy: analysis.trade_strategy.to_string(),
            roi: output::opt(analysis.roi.map(amount)),
        }
    }
}

fn amount(value: Decimal) -> String {
    value.normalize().to_string()
}

impl DetailArgs {
    /// Overlay the given fields on `base`.
    fn merge_into(self, base: TradeDetails) -> TradeDetails {
        TradeDetails {
            strike_price: self.strike_price.or(base.strike_price),
            expiry: self.expiry.or(base.expiry),
            stop_loss: self.stop_loss.or(base.stop_loss),
            brokerage: self.brokerage.or(base.brokerage),
            lot_size: self.lot_size.or(base.lot_size),
            num_of_lots: self.num_of_lots.or(base.num_of_lots),
            market_assessment: self.market_assessment.or(base.market_assessment),
            asset_name: self.asset_name.or(base.asset_name),
            remarks: self.remarks.or(base.remarks),
        }
    }
}

fn new_trade(args: TradeAddArgs) -> NewTrade {
    NewTrade {
        market: args.market,
        instrument: args.instrument,
        exchange: args.exchange,
        broker: args.broker,
        trade_type: args.trade_type,
        entry_date: args.date,
        entry_time: args.time,
        entry_quantity: args.quantity,
        entry_price: args.price,
        cmp: args.cmp,
        details: args.details.merge_into(TradeDetails::default()),
        exits: Vec::new(),
    }
}

fn render_trade(trade: &Trade) {
    output::field("id", trade.id);
    output::field("account", trade.account_id);
    output::field(
        "entry",
        format!(
            "{} {} {} @ {} on {} {}",
            trade.trade_type,
            amount(trade.entry_quantity),
            trade.instrument,
            amount(trade.entry_price),
            trade.entry_date,
            trade.entry_time
        ),
    );
    output::field("market", format!("{} / {} / {}", trade.market, trade.exchange, trade.broker));
    output::field("cmp", output::opt(trade.cmp.map(amount)));
    output::field("status", trade.status);
    output::field("open quantity", amount(trade.open_quantity));
    output::field("closed P&L", output::pnl(trade.profit_closed));
    output::field("open P&L", output::pnl(trade.profit_open));
    if let Some(group_id) = trade.group_id {
        output::field("group", group_id);
    }
}

fn render_report(report: &TradeReport) {
    output::table(
        report.exit_analyses.iter().map(AnalysisRow::from).collect(),
        "no exits",
    );
    let overall = &report.overall;
    output::section("Overall");
    output::field("exited", amount(overall.cumulative_exit_quantity));
    output::field("remaining", amount(overall.remaining_quantity));
    output::field("position", overall.position);
    output::field("closed P&L", output::pnl(overall.profit_closed));
    output::field("open P&L", output::pnl(overall.profit_open));
}

async fn update<S: JournalStore>(journal: &Journal<S>, args: TradeUpdateArgs) -> Result<Trade> {
    let details = if args.details.is_empty() {
        None
    } else {
        let current = journal.trades.get_trade(args.trade_id).await?;
        Some(args.details.merge_into(current.details))
    };
    let update = TradeUpdate {
        market: args.market,
        instrument: args.instrument,
        exchange: args.exchange,
        broker: args.broker,
        entry_time: args.time,
        trade_type: args.trade_type,
        entry_date: args.date,
        entry_quantity: args.quantity,
        entry_price: args.price,
        cmp: args.cmp,
        details,
        exits: Vec::new(),
    };
    journal.trades.update_trade(args.trade_id, update).await
}

async fn exit<S: JournalStore>(journal: &Journal<S>, args: ExitArgs) -> bool {
    let mut request = ExitRequest::new(args.date, args.quantity, args.price);
    request.exit_time = args.time;

    let (result, message) = match args.exit_id {
        Some(exit_id) => (
            journal.trades.revise_exit(args.trade_id, exit_id, request).await,
            "Exit revised",
        ),
        None => (
            journal.trades.apply_exit(args.trade_id, request).await,
            "Exit recorded",
        ),
    };
    let code = if args.exit_id.is_some() { 200 } else { 201 };
    let envelope = Envelope::from_result(result, code, message);
    output::emit(&envelope, |outcome| {
        output::field("exit", outcome.exit.id);
        output::field("status", outcome.trade.status);
        output::field("open quantity", amount(outcome.trade.open_quantity));
        if let Some(analysis) = outcome.analysis() {
            output::field("realized", output::pnl(analysis.realized()));
            output::field("strategy", analysis.trade_strategy);
            output::field("ROI %", output::opt(analysis.roi.map(amount)));
        }
        output::field("closed P&L", output::pnl(outcome.trade.profit_closed));
        output::field("open P&L", output::pnl(outcome.trade.profit_open));
    })
}

pub async fn execute<S: JournalStore>(
    journal: &Journal<S>,
    user: &UserId,
    command: TradeCommand,
) -> bool {
    match command {
        TradeCommand::Add(args) => {
            let account_id = args.account;
            let result = journal.trades.create_trade(account_id, new_trade(args)).await;
            let envelope = Envelope::from_result(result, 201, "Trade created");
            output::emit(&envelope, render_trade)
        }
        TradeCommand::Exit(args) => exit(journal, args).await,
        TradeCommand::Update(args) => {
            let result = update(journal, args).await;
            let envelope = Envelope::from_result(result, 200, "Trade updated");
            output::emit(&envelope, render_trade)
        }
        TradeCommand::Delete { trade_id } => {
            let result = journal.trades.delete_trade(trade_id).await;
            let envelope = Envelope::from_result(result, 200, "Trade deleted");
            output::emit(&envelope, |trade| output::field("id", trade.id))
        }
        TradeCommand::List { account } => {
            let result = match account {
                Some(account_id) => journal.trades.list_trades_by_account(account_id).await,
                None => journal.trades.list_trades_by_user(user).await,
            };
            let envelope = Envelope::from_result(result, 200, "Trades listed");
            output::emit(&envelope, |trades| {
                output::table(trades.iter().map(TradeRow::from).collect(), "no trades");
            })
        }
        TradeCommand::Show { trade_id } => {
            let result = journal.trades.get_trade(trade_id).await;
            let envelope = Envelope::from_result(result, 200, "Trade found");
            output::emit(&envelope, |trade| {
                render_trade(trade);
                output::section("Exits");
                output::table(trade.exits.iter().map(ExitRow::from).collect(), "no exits");
            })
        }
        TradeCommand::Report { trade_id } => {
            let result = journal.trades.trade_report(trade_id).await;
            let envelope = Envelope::from_result(result, 200, "Trade analysed");
            output::emit(&envelope, render_report)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn detail_overlay_keeps_unset_fields() {
        let base = TradeDetails {
            stop_loss: Some(dec!(45)),
            remarks: Some("breakout".into()),
            ..TradeDetails::default()
        };
        let args = DetailArgs {
            remarks: Some("failed breakout".into()),
            ..DetailArgs::default()
        };

        let merged = args.merge_into(base);
        assert_eq!(merged.stop_loss, Some(dec!(45)));
        assert_eq!(merged.remarks.as_deref(), Some("failed breakout"));
    }
}
