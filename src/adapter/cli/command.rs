//! Command-line interface definitions.
//!
//! Every command runs against the journal database named in the config file
//! (or `TRADELOG_DATABASE`) on behalf of the user given with `--user`.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;

use crate::application::analytics::{GroupBy, Metric, Period};
use crate::domain::{AccountId, ExitId, GroupId, TradeId, TradeType};

/// Trading journal: record trades and exits, derive P&L, ROI and analytics
#[derive(Parser, Debug)]
#[command(name = "tradelog")]
#[command(version)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true, default_value = "tradelog.toml")]
    pub config: PathBuf,

    /// Acting user
    #[arg(long, global = true, default_value = "local")]
    pub user: String,

    /// Print the result envelope as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage trading accounts
    #[command(subcommand)]
    Account(AccountCommand),

    /// Record and inspect trades
    #[command(subcommand)]
    Trade(TradeCommand),

    /// Bundle trades into groups
    #[command(subcommand)]
    Group(GroupCommand),

    /// Aggregate P&L, ROI or win/loss over a month
    Stats(StatsArgs),
}

#[derive(Subcommand, Debug)]
pub enum AccountCommand {
    /// Open a new account
    Create {
        /// Account name, unique per user
        name: String,
    },
    /// List live accounts
    List,
    /// Delete an account and all of its trades
    Delete {
        account_id: AccountId,
    },
}

#[derive(Subcommand, Debug)]
pub enum TradeCommand {
    /// Record a new trade
    Add(TradeAddArgs),
    /// Record an exit, or revise an existing one with `--exit-id`
    Exit(ExitArgs),
    /// Change entry fields of a trade
    Update(TradeUpdateArgs),
    /// Delete a trade
    Delete {
        trade_id: TradeId,
    },
    /// List trades of the user, or of one account
    List {
        #[arg(long)]
        account: Option<AccountId>,
    },
    /// Show a trade with its exits
    Show {
        trade_id: TradeId,
    },
    /// Per-exit analyses and the overall position of a trade
    Report {
        trade_id: TradeId,
    },
}

/// Descriptive fields shared by `trade add` and `trade update`.
#[derive(Args, Debug, Clone, Default)]
pub struct DetailArgs {
    #[arg(long)]
    pub strike_price: Option<Decimal>,
    #[arg(long)]
    pub expiry: Option<String>,
    #[arg(long)]
    pub stop_loss: Option<Decimal>,
    #[arg(long)]
    pub brokerage: Option<Decimal>,
    #[arg(long)]
    pub lot_size: Option<Decimal>,
    #[arg(long)]
    pub num_of_lots: Option<Decimal>,
    #[arg(long)]
    pub market_assessment: Option<String>,
    #[arg(long)]
    pub asset_name: Option<String>,
    #[arg(long)]
    pub remarks: Option<String>,
}

impl DetailArgs {
    /// Whether any descriptive field was given.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strike_price.is_none()
            && self.expiry.is_none()
            && self.stop_loss.is_none()
            && self.brokerage.is_none()
            && self.lot_size.is_none()
            && self.num_of_lots.is_none()
            && self.market_assessment.is_none()
            && self.asset_name.is_none()
            && self.remarks.is_none()
    }
}

#[derive(Args, Debug)]
pub struct TradeAddArgs {
    /// Account the trade is recorded under
    #[arg(long)]
    pub account: AccountId,
    #[arg(long)]
    pub market: String,
    #[arg(long)]
    pub instrument: String,
    #[arg(long)]
    pub exchange: String,
    #[arg(long)]
    pub broker: String,
    /// Buy or Sell
    #[arg(long = "type")]
    pub trade_type: TradeType,
    /// Entry date (YYYY-MM-DD)
    #[arg(long)]
    pub date: NaiveDate,
    /// Entry time (HH:MM)
    #[arg(long, default_value = "09:15")]
    pub time: String,
    #[arg(long)]
    pub quantity: Decimal,
    #[arg(long)]
    pub price: Decimal,
    /// Current market price of the instrument
    #[arg(long)]
    pub cmp: Option<Decimal>,
    #[command(flatten)]
    pub details: DetailArgs,
}

#[derive(Args, Debug)]
pub struct ExitArgs {
    pub trade_id: TradeId,
    /// Revise this exit instead of recording a new one
    #[arg(long)]
    pub exit_id: Option<ExitId>,
    /// Exit date (YYYY-MM-DD)
    #[arg(long)]
    pub date: NaiveDate,
    /// Exit time (HH:MM)
    #[arg(long)]
    pub time: Option<String>,
    #[arg(long)]
    pub quantity: Decimal,
    #[arg(long)]
    pub price: Decimal,
}

#[derive(Args, Debug)]
pub struct TradeUpdateArgs {
    pub trade_id: TradeId,
    #[arg(long)]
    pub market: Option<String>,
    #[arg(long)]
    pub instrument: Option<String>,
    #[arg(long)]
    pub exchange: Option<String>,
    #[arg(long)]
    pub broker: Option<String>,
    #[arg(long = "type")]
    pub trade_type: Option<TradeType>,
    #[arg(long)]
    pub date: Option<NaiveDate>,
    #[arg(long)]
    pub time: Option<String>,
    #[arg(long)]
    pub quantity: Option<Decimal>,
    #[arg(long)]
    pub price: Option<Decimal>,
    #[arg(long)]
    pub cmp: Option<Decimal>,
    #[command(flatten)]
    pub details: DetailArgs,
}

#[derive(Subcommand, Debug)]
pub enum GroupCommand {
    /// Bundle trades into a new group
    Create {
        name: String,
        /// Member trade ids
        #[arg(required = true, num_args = 1..)]
        trades: Vec<TradeId>,
    },
    /// Add trades to a group, optionally renaming it
    Add {
        group_id: GroupId,
        #[arg(required = true, num_args = 1..)]
        trades: Vec<TradeId>,
        #[arg(long)]
        name: Option<String>,
    },
    /// Take trades out of a group
    Remove {
        group_id: GroupId,
        #[arg(required = true, num_args = 1..)]
        trades: Vec<TradeId>,
    },
    /// Dissolve a group
    Delete {
        group_id: GroupId,
    },
    /// List groups with their members
    List,
}

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Only these instruments (repeatable)
    #[arg(long = "instrument")]
    pub instruments: Vec<String>,
    /// Only these markets (repeatable)
    #[arg(long = "market")]
    pub markets: Vec<String>,
    /// Calendar year, defaults to the current one
    #[arg(long)]
    pub year: Option<i32>,
    /// Calendar month (1-12), defaults to the current one
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: Option<u32>,
    /// daily or weekly
    #[arg(long, default_value = "daily")]
    pub period: Period,
    /// profit_and_loss, roi or win_loss
    #[arg(long, default_value = "profit_and_loss")]
    pub metric: Metric,
    /// market or instrument
    #[arg(long, default_value = "market")]
    pub group_by: GroupBy,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_tree_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_trade_add() {
        let account = AccountId::generate();
        let cli = Cli::try_parse_from([
            "tradelog",
            "--json",
            "trade",
            "add",
            "--account",
            &account.to_string(),
            "--market",
            "Indian",
            "--instrument",
            "Cash/Equity",
            "--exchange",
            "NSE",
            "--broker",
            "Zerodha",
            "--type",
            "sell",
            "--date",
            "2024-05-06",
            "--quantity",
            "100",
            "--price",
            "50.5",
            "--stop-loss",
            "55",
        ])
        .unwrap();

        assert!(cli.json);
        let Commands::Trade(TradeCommand::Add(args)) = cli.command else {
            panic!("expected trade add");
        };
        assert_eq!(args.account, account);
        assert_eq!(args.trade_type, TradeType::Sell);
        assert_eq!(args.price, Decimal::new(505, 1));
        assert_eq!(args.time, "09:15");
        assert!(!args.details.is_empty());
    }

    #[test]
    fn stats_defaults() {
        let cli = Cli::try_parse_from(["tradelog", "stats", "--market", "Indian"]).unwrap();
        let Commands::Stats(args) = cli.command else {
            panic!("expected stats");
        };
        assert_eq!(args.period, Period::Daily);
        assert_eq!(args.metric, Metric::ProfitAndLoss);
        assert_eq!(args.group_by, GroupBy::Market);
        assert_eq!(args.markets, ["Indian"]);
        assert_eq!(cli.user, "local");
    }

    #[test]
    fn rejects_bad_ids_and_months() {
        assert!(Cli::try_parse_from(["tradelog", "trade", "show", "nope"]).is_err());
        assert!(Cli::try_parse_from(["tradelog", "stats", "--month", "13"]).is_err());
        assert!(Cli::try_parse_from(["tradelog", "group", "create", "g"]).is_err());
    }
}
