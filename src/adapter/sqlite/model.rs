//! Diesel models for database tables and their domain conversions.
//!
//! Decimals, dates and identifiers are stored as TEXT. A row's `version` is
//! the version the aggregate will have once the write commits.

use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;

use super::schema::{accounts, exits, group_trades, trade_analyses, trades};
use crate::domain::{
    Exit, GroupTrade, Trade, TradeAnalysis, TradeDetails, TradeId, TradingAccount, UserId,
};
use crate::error::{Error, Result};

/// Database row for trading accounts.
#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = accounts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct AccountRow {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub created_at: String,
    pub is_deleted: bool,
    pub deleted_at: Option<String>,
    pub version: i64,
}

/// Database row for trades. Descriptive details are kept as a JSON object.
#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = trades)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct TradeRow {
    pub id: String,
    pub account_id: String,
    pub user_id: String,
    pub market: String,
    pub instrument: String,
    pub exchange: String,
    pub broker: String,
    pub trade_type: String,
    pub entry_date: String,
    pub entry_time: String,
    pub entry_month: String,
    pub entry_weekday: String,
    pub entry_quantity: String,
    pub entry_price: String,
    pub details: String,
    pub cmp: Option<String>,
    pub open_quantity: String,
    pub status: String,
    pub profit_closed: String,
    pub profit_open: String,
    pub is_grouped: bool,
    pub group_id: Option<String>,
    pub is_deleted: bool,
    pub created_at: String,
    pub version: i64,
}

/// Database row for exits; `seq` keeps insertion order.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = exits)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ExitRow {
    pub id: String,
    pub trade_id: String,
    pub seq: i32,
    pub exit_date: String,
    pub exit_time: Option<String>,
    pub quantity: String,
    pub price: String,
}

/// Database row for per-exit analyses.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = trade_analyses)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AnalysisRow {
    pub id: String,
    pub trade_id: String,
    pub exit_id: String,
    pub position: String,
    pub result_closed_position: Option<String>,
    pub profit_closed_position: String,
    pub loss_closed_position: String,
    pub profit_and_loss_open_position: String,
    pub trade_duration: Option<i64>,
    pub trade_strategy: String,
    pub investment: String,
    pub roi: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Database row for group trades. Member ids are a JSON array.
#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = group_trades)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct GroupRow {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub market: String,
    pub broker: String,
    pub quantity: String,
    pub price: String,
    pub trade_ids: String,
    pub is_deleted: bool,
    pub created_at: String,
    pub version: i64,
}

fn parse<T>(field: &'static str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .parse()
        .map_err(|e| Error::Parse(format!("{field} {value:?}: {e}")))
}

fn parse_opt<T>(field: &'static str, value: Option<&str>) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    value.map(|v| parse(field, v)).transpose()
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(field: &'static str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::Parse(format!("{field} {value:?}: {e}")))
}

fn stored_version(version: u64) -> Result<i64> {
    i64::try_from(version + 1).map_err(|e| Error::Parse(format!("version {version}: {e}")))
}

fn loaded_version(version: i64) -> Result<u64> {
    u64::try_from(version).map_err(|e| Error::Parse(format!("version {version}: {e}")))
}

impl AccountRow {
    pub fn from_account(account: &TradingAccount) -> Result<Self> {
        Ok(Self {
            id: account.id.to_string(),
            user_id: account.user_id.to_string(),
            name: account.name.clone(),
            created_at: timestamp(&account.created_at),
            is_deleted: account.is_deleted,
            deleted_at: account.deleted_at.as_ref().map(timestamp),
            version: stored_version(account.version)?,
        })
    }

    pub fn into_account(self) -> Result<TradingAccount> {
        Ok(TradingAccount {
            id: parse("accounts.id", &self.id)?,
            user_id: UserId::from(self.user_id),
            name: self.name,
            created_at: parse_timestamp("accounts.created_at", &self.created_at)?,
            is_deleted: self.is_deleted,
            deleted_at: self
                .deleted_at
                .as_deref()
                .map(|t| parse_timestamp("accounts.deleted_at", t))
                .transpose()?,
            version: loaded_version(self.version)?,
        })
    }
}

impl TradeRow {
    pub fn from_trade(trade: &Trade) -> Result<Self> {
        Ok(Self {
            id: trade.id.to_string(),
            account_id: trade.account_id.to_string(),
            user_id: trade.user_id.to_string(),
            market: trade.market.clone(),
            instrument: trade.instrument.clone(),
            exchange: trade.exchange.clone(),
            broker: trade.broker.clone(),
            trade_type: trade.trade_type.as_str().to_string(),
            entry_date: trade.entry_date.to_string(),
            entry_time: trade.entry_time.clone(),
            entry_month: trade.entry_month.clone(),
            entry_weekday: trade.entry_weekday.clone(),
            entry_quantity: trade.entry_quantity.to_string(),
            entry_price: trade.entry_price.to_string(),
            details: serde_json::to_string(&trade.details)?,
            cmp: trade.cmp.map(|c| c.to_string()),
            open_quantity: trade.open_quantity.to_string(),
            status: trade.status.as_str().to_string(),
            profit_closed: trade.profit_closed.to_string(),
            profit_open: trade.profit_open.to_string(),
            is_grouped: trade.is_grouped,
            group_id: trade.group_id.map(|g| g.to_string()),
            is_deleted: trade.is_deleted,
            created_at: timestamp(&trade.created_at),
            version: stored_version(trade.version)?,
        })
    }

    /// Rebuild the trade around its already ordered exits.
    pub fn into_trade(self, exits: Vec<Exit>) -> Result<Trade> {
        let details: TradeDetails = serde_json::from_str(&self.details)?;
        Ok(Trade {
            id: parse("trades.id", &self.id)?,
            account_id: parse("trades.account_id", &self.account_id)?,
            user_id: UserId::from(self.user_id),
            market: self.market,
            instrument: self.instrument,
            exchange: self.exchange,
            broker: self.broker,
            trade_type: parse("trades.trade_type", &self.trade_type)?,
            entry_date: parse("trades.entry_date", &self.entry_date)?,
            entry_time: self.entry_time,
            entry_month: self.entry_month,
            entry_weekday: self.entry_weekday,
            entry_quantity: parse("trades.entry_quantity", &self.entry_quantity)?,
            entry_price: parse("trades.entry_price", &self.entry_price)?,
            details,
            cmp: parse_opt("trades.cmp", self.cmp.as_deref())?,
            open_quantity: parse("trades.open_quantity", &self.open_quantity)?,
            status: parse("trades.status", &self.status)?,
            profit_closed: parse("trades.profit_closed", &self.profit_closed)?,
            profit_open: parse("trades.profit_open", &self.profit_open)?,
            is_grouped: self.is_grouped,
            group_id: parse_opt("trades.group_id", self.group_id.as_deref())?,
            is_deleted: self.is_deleted,
            exits,
            created_at: parse_timestamp("trades.created_at", &self.created_at)?,
            version: loaded_version(self.version)?,
        })
    }
}

impl ExitRow {
    pub fn from_exit(exit: &Exit, seq: usize) -> Result<Self> {
        Ok(Self {
            id: exit.id.to_string(),
            trade_id: exit.trade_id.to_string(),
            seq: i32::try_from(seq).map_err(|e| Error::Parse(format!("exit seq {seq}: {e}")))?,
            exit_date: exit.exit_date.to_string(),
            exit_time: exit.exit_time.clone(),
            quantity: exit.quantity.to_string(),
            price: exit.price.to_string(),
        })
    }

    pub fn into_exit(self, analysis: Option<TradeAnalysis>) -> Result<Exit> {
        Ok(Exit {
            id: parse("exits.id", &self.id)?,
            trade_id: parse::<TradeId>("exits.trade_id", &self.trade_id)?,
            exit_date: parse("exits.exit_date", &self.exit_date)?,
            exit_time: self.exit_time,
            quantity: parse("exits.quantity", &self.quantity)?,
            price: parse("exits.price", &self.price)?,
            analysis,
        })
    }
}

impl AnalysisRow {
    pub fn from_analysis(analysis: &TradeAnalysis) -> Self {
        Self {
            id: analysis.id.to_string(),
            trade_id: analysis.trade_id.to_string(),
            exit_id: analysis.exit_id.to_string(),
            position: analysis.position.as_str().to_string(),
            result_closed_position: analysis.result_closed_position.map(|r| r.as_str().to_string()),
            profit_closed_position: analysis.profit_closed_position.to_string(),
            loss_closed_position: analysis.loss_closed_position.to_string(),
            profit_and_loss_open_position: analysis.profit_and_loss_open_position.to_string(),
            trade_duration: analysis.trade_duration,
            trade_strategy: analysis.trade_strategy.as_str().to_string(),
            investment: analysis.investment.to_string(),
            roi: analysis.roi.map(|r| r.to_string()),
            created_at: timestamp(&analysis.created_at),
            updated_at: timestamp(&analysis.updated_at),
        }
    }

    pub fn into_analysis(self) -> Result<TradeAnalysis> {
        Ok(TradeAnalysis {
            id: parse("trade_analyses.id", &self.id)?,
            trade_id: parse("trade_analyses.trade_id", &self.trade_id)?,
            exit_id: parse("trade_analyses.exit_id", &self.exit_id)?,
            position: parse("trade_analyses.position", &self.position)?,
            result_closed_position: parse_opt(
                "trade_analyses.result_closed_position",
                self.result_closed_position.as_deref(),
            )?,
            profit_closed_position: parse(
                "trade_analyses.profit_closed_position",
                &self.profit_closed_position,
            )?,
            loss_closed_position: parse(
                "trade_analyses.loss_closed_position",
                &self.loss_closed_position,
            )?,
            profit_and_loss_open_position: parse(
                "trade_analyses.profit_and_loss_open_position",
                &self.profit_and_loss_open_position,
            )?,
            trade_duration: self.trade_duration,
            trade_strategy: parse("trade_analyses.trade_strategy", &self.trade_strategy)?,
            investment: parse("trade_analyses.investment", &self.investment)?,
            roi: parse_opt::<Decimal>("trade_analyses.roi", self.roi.as_deref())?,
            created_at: parse_timestamp("trade_analyses.created_at", &self.created_at)?,
            updated_at: parse_timestamp("trade_analyses.updated_at", &self.updated_at)?,
        })
    }
}

impl GroupRow {
    pub fn from_group(group: &GroupTrade) -> Result<Self> {
        Ok(Self {
            id: group.id.to_string(),
            user_id: group.user_id.to_string(),
            name: group.name.clone(),
            market: group.market.clone(),
            broker: group.broker.clone(),
            quantity: group.quantity.to_string(),
            price: group.price.to_string(),
            trade_ids: serde_json::to_string(&group.trade_ids)?,
            is_deleted: group.is_deleted,
            created_at: timestamp(&group.created_at),
            version: stored_version(group.version)?,
        })
    }

    pub fn into_group(self) -> Result<GroupTrade> {
        Ok(GroupTrade {
            id: parse("group_trades.id", &self.id)?,
            user_id: UserId::from(self.user_id),
            name: self.name,
            market: self.market,
            broker: self.broker,
            quantity: parse("group_trades.quantity", &self.quantity)?,
            price: parse("group_trades.price", &self.price)?,
            trade_ids: serde_json::from_str(&self.trade_ids)?,
            is_deleted: self.is_deleted,
            created_at: parse_timestamp("group_trades.created_at", &self.created_at)?,
            version: loaded_version(self.version)?,
        })
    }
}
