//! Trade lifecycle service.
//!
//! Orchestrates creation, update and soft deletion of trades and routes exit
//! events through the accounting engine. Every mutation is one
//! read-modify-commit cycle retried on version conflicts, so the trade, its
//! exits and their analyses are always written together.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::accounting;
use super::retry::ConflictRetry;
use crate::domain::{
    AccountId, Exit, ExitId, ExitRequest, PositionStatus, Price, Quantity, Trade, TradeAnalysis,
    TradeDetails, TradeId, TradeType, UserId,
};
use crate::error::{Entity, Error, Result};
use crate::port::{ChangeSet, JournalStore, TradeQuery};

/// Request to open a new trade, optionally with exits already taken.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTrade {
    pub market: String,
    pub instrument: String,
    pub exchange: String,
    pub broker: String,
    pub trade_type: TradeType,
    pub entry_date: NaiveDate,
    pub entry_time: String,
    pub entry_quantity: Quantity,
    pub entry_price: Price,
    #[serde(default)]
    pub cmp: Option<Price>,
    #[serde(default, flatten)]
    pub details: TradeDetails,
    #[serde(default)]
    pub exits: Vec<ExitRequest>,
}

/// An exit carried by a trade update: revises `exit_id` when present,
/// otherwise records a new exit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExitChange {
    #[serde(default)]
    pub exit_id: Option<ExitId>,
    #[serde(flatten)]
    pub request: ExitRequest,
}

/// Partial update of a trade. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TradeUpdate {
    #[serde(default)]
    pub market: Option<String>,
    #[serde(default)]
    pub instrument: Option<String>,
    #[serde(default)]
    pub exchange: Option<String>,
    #[serde(default)]
    pub broker: Option<String>,
    #[serde(default)]
    pub entry_time: Option<String>,
    #[serde(default)]
    pub trade_type: Option<TradeType>,
    #[serde(default)]
    pub entry_date: Option<NaiveDate>,
    #[serde(default)]
    pub entry_quantity: Option<Quantity>,
    #[serde(default)]
    pub entry_price: Option<Price>,
    #[serde(default)]
    pub cmp: Option<Price>,
    #[serde(default)]
    pub details: Option<TradeDetails>,
    #[serde(default)]
    pub exits: Vec<ExitChange>,
}

impl TradeUpdate {
    fn changes_basis(&self) -> bool {
        self.trade_type.is_some()
            || self.entry_date.is_some()
            || self.entry_quantity.is_some()
            || self.entry_price.is_some()
            || self.cmp.is_some()
    }
}

/// Result of an exit operation: the trade after accounting and the exit
/// (with its analysis) that was written.
#[derive(Debug, Clone, Serialize)]
pub struct ExitOutcome {
    pub trade: Trade,
    pub exit: Exit,
}

impl ExitOutcome {
    #[must_use]
    pub fn analysis(&self) -> Option<&TradeAnalysis> {
        self.exit.analysis.as_ref()
    }
}

/// Cumulative view of a trade's exits.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallAnalysis {
    pub cumulative_exit_quantity: Quantity,
    pub remaining_quantity: Quantity,
    pub position: PositionStatus,
    pub profit_closed: Decimal,
    pub profit_open: Decimal,
}

/// Every exit analysis of a trade plus the cumulative summary.
#[derive(Debug, Clone, Serialize)]
pub struct TradeReport {
    pub trade_id: TradeId,
    pub exit_analyses: Vec<TradeAnalysis>,
    pub overall: OverallAnalysis,
}

/// Trade lifecycle operations over a journal store.
pub struct TradeService<S> {
    store: Arc<S>,
    retry: ConflictRetry,
}

impl<S: JournalStore> TradeService<S> {
    pub fn new(store: Arc<S>, retry: ConflictRetry) -> Self {
        Self { store, retry }
    }

    /// Open a trade under `account_id` and process any exits it carries,
    /// each against the state left by the previous one.
    ///
    /// # Errors
    /// `NotFound` for a missing or deleted account, `InvalidTradeData` for an
    /// unusable entry, and any accounting error raised by the exits. Nothing
    /// is written on failure.
    pub async fn create_trade(&self, account_id: AccountId, request: NewTrade) -> Result<Trade> {
        let account = self
            .store
            .get_account(account_id)
            .await?
            .filter(|a| !a.is_deleted)
            .ok_or_else(|| Error::not_found(Entity::Account, account_id))?;

        let now = Utc::now();
        let mut trade = Trade {
            id: TradeId::generate(),
            account_id,
            user_id: account.user_id,
            market: request.market,
            instrument: request.instrument,
            exchange: request.exchange,
            broker: request.broker,
            trade_type: request.trade_type,
            entry_date: request.entry_date,
            entry_time: request.entry_time,
            entry_month: now.format("%B").to_string(),
            entry_weekday: now.format("%A").to_string(),
            entry_quantity: request.entry_quantity,
            entry_price: request.entry_price,
            details: request.details,
            cmp: request.cmp,
            open_quantity: request.entry_quantity,
            status: PositionStatus::Open,
            profit_closed: Decimal::ZERO,
            profit_open: Decimal::ZERO,
            is_grouped: false,
            group_id: None,
            is_deleted: false,
            exits: Vec::new(),
            created_at: now,
            version: 0,
        };
        accounting::rebase(&mut trade)?;
        for exit in &request.exits {
            accounting::apply_exit(&mut trade, exit)?;
        }

        self.store.commit(ChangeSet::new().trade(trade.clone())).await?;
        trade.version += 1;
        info!(
            trade_id = %trade.id,
            account_id = %account_id,
            instrument = %trade.instrument,
            exits = trade.exits.len(),
            "Trade created"
        );
        Ok(trade)
    }

    /// Record a new exit against a trade.
    ///
    /// # Errors
    /// `NotFound` for a missing or deleted trade, otherwise the accounting
    /// engine's errors. Version conflicts are retried.
    pub async fn apply_exit(&self, trade_id: TradeId, request: ExitRequest) -> Result<ExitOutcome> {
        let result = self
            .retry
            .run("apply_exit", || async {
                let mut trade = self.load_trade(trade_id).await?;
                let exit = accounting::apply_exit(&mut trade, &request)?;
                self.persist(trade, exit).await
            })
            .await;

        match &result {
            Ok(outcome) => info!(
                trade_id = %trade_id,
                exit_id = %outcome.exit.id,
                status = %outcome.trade.status,
                open_quantity = %outcome.trade.open_quantity,
                "Exit applied"
            ),
            Err(err) => warn!(trade_id = %trade_id, error = %err, "Exit rejected"),
        }
        result
    }

    /// Replace the values of an existing exit.
    ///
    /// # Errors
    /// `NotFound` for a missing trade or exit, otherwise the accounting
    /// engine's errors. Version conflicts are retried.
    pub async fn revise_exit(
        &self,
        trade_id: TradeId,
        exit_id: ExitId,
        request: ExitRequest,
    ) -> Result<ExitOutcome> {
        let result = self
            .retry
            .run("revise_exit", || async {
                let mut trade = self.load_trade(trade_id).await?;
                let exit = accounting::revise_exit(&mut trade, exit_id, &request)?;
                self.persist(trade, exit).await
            })
            .await;

        match &result {
            Ok(outcome) => info!(
                trade_id = %trade_id,
                exit_id = %exit_id,
                status = %outcome.trade.status,
                open_quantity = %outcome.trade.open_quantity,
                "Exit revised"
            ),
            Err(err) => warn!(trade_id = %trade_id, exit_id = %exit_id, error = %err, "Exit revision rejected"),
        }
        result
    }

    /// Apply exit changes, then scalar field updates.
    ///
    /// Exits carrying an id are revised, the rest are appended in order.
    /// Changes to the accounting basis (direction, entry date, quantity,
    /// price or market price) re-run the accounting for every exit. If the
    /// trade is grouped, its market and broker must keep matching the group,
    /// and a changed entry value adjusts the group totals in the same commit.
    ///
    /// # Errors
    /// As [`TradeService::apply_exit`] and [`TradeService::revise_exit`];
    /// nothing is written if any step fails.
    pub async fn update_trade(&self, trade_id: TradeId, update: TradeUpdate) -> Result<Trade> {
        let trade = self
            .retry
            .run("update_trade", || async {
                let mut trade = self.load_trade(trade_id).await?;
                let (old_quantity, old_value) = (trade.entry_quantity, trade.entry_value());

                for change in &update.exits {
                    match change.exit_id {
                        Some(exit_id) => {
                            accounting::revise_exit(&mut trade, exit_id, &change.request)?;
                        }
                        None => {
                            accounting::apply_exit(&mut trade, &change.request)?;
                        }
                    }
                }

                apply_fields(&mut trade, &update);
                if update.changes_basis() {
                    accounting::rebase(&mut trade)?;
                }

                let mut changes = ChangeSet::new();
                let value_changed =
                    trade.entry_quantity != old_quantity || trade.entry_value() != old_value;
                let touches_group_fields = update.market.is_some() || update.broker.is_some();
                let needs_group = value_changed || touches_group_fields;
                if let (Some(group_id), true) = (trade.group_id, needs_group) {
                    let mut group = self
                        .store
                        .get_group(group_id)
                        .await?
                        .ok_or_else(|| Error::not_found(Entity::Group, group_id))?;
                    if let Err(err) = group.check_fields(&trade) {
                        warn!(
                            trade_id = %trade_id,
                            group_id = %group_id,
                            error = %err,
                            "Trade update rejected"
                        );
                        return Err(err.into());
                    }
                    if value_changed {
                        group.quantity += trade.entry_quantity - old_quantity;
                        group.price += trade.entry_value() - old_value;
                        changes = changes.group(group);
                    }
                }

                self.store.commit(changes.trade(trade.clone())).await?;
                trade.version += 1;
                Ok(trade)
            })
            .await?;

        info!(trade_id = %trade_id, status = %trade.status, "Trade updated");
        Ok(trade)
    }

    /// Soft-delete a trade. Exits and analyses are left in place.
    ///
    /// # Errors
    /// `NotFound` for a missing or already deleted trade.
    pub async fn delete_trade(&self, trade_id: TradeId) -> Result<Trade> {
        let trade = self
            .retry
            .run("delete_trade", || async {
                let mut trade = self.load_trade(trade_id).await?;
                trade.is_deleted = true;
                self.store.commit(ChangeSet::new().trade(trade.clone())).await?;
                trade.version += 1;
                Ok(trade)
            })
            .await?;
        info!(trade_id = %trade_id, "Trade deleted");
        Ok(trade)
    }

    /// Fetch a live trade with its exits.
    ///
    /// # Errors
    /// `NotFound` for a missing or deleted trade.
    pub async fn get_trade(&self, trade_id: TradeId) -> Result<Trade> {
        self.load_trade(trade_id).await
    }

    /// Live, ungrouped trades of an account.
    ///
    /// # Errors
    /// `NotFound` when the account does not exist.
    pub async fn list_trades_by_account(&self, account_id: AccountId) -> Result<Vec<Trade>> {
        if self.store.get_account(account_id).await?.is_none() {
            return Err(Error::not_found(Entity::Account, account_id));
        }
        self.store.list_trades(&TradeQuery::for_account(account_id)).await
    }

    /// Live, ungrouped trades of a user across all accounts.
    ///
    /// # Errors
    /// Store failures only.
    pub async fn list_trades_by_user(&self, user_id: &UserId) -> Result<Vec<Trade>> {
        self.store
            .list_trades(&TradeQuery::for_user(user_id.clone()))
            .await
    }

    /// Every exit analysis of a trade plus the cumulative position.
    ///
    /// # Errors
    /// `NotFound` for a missing or deleted trade.
    pub async fn trade_report(&self, trade_id: TradeId) -> Result<TradeReport> {
        let trade = self.load_trade(trade_id).await?;
        let cumulative = trade.exited_quantity();
        Ok(TradeReport {
            trade_id,
            exit_analyses: trade
                .exits
                .iter()
                .filter_map(|e| e.analysis.clone())
                .collect(),
            overall: OverallAnalysis {
                cumulative_exit_quantity: cumulative,
                remaining_quantity: trade.entry_quantity - cumulative,
                position: trade.status,
                profit_closed: trade.profit_closed,
                profit_open: trade.profit_open,
            },
        })
    }

    async fn load_trade(&self, trade_id: TradeId) -> Result<Trade> {
        self.store
            .get_trade(trade_id)
            .await?
            .filter(|t| !t.is_deleted)
            .ok_or_else(|| Error::not_found(Entity::Trade, trade_id))
    }

    async fn persist(&self, mut trade: Trade, exit: Exit) -> Result<ExitOutcome> {
        self.store.commit(ChangeSet::new().trade(trade.clone())).await?;
        trade.version += 1;
        Ok(ExitOutcome { trade, exit })
    }
}

fn apply_fields(trade: &mut Trade, update: &TradeUpdate) {
    if let Some(market) = &update.market {
        trade.market.clone_from(market);
    }
    if let Some(instrument) = &update.instrument {
        trade.instrument.clone_from(instrument);
    }
    if let Some(exchange) = &update.exchange {
        trade.exchange.clone_from(exchange);
    }
    if let Some(broker) = &update.broker {
        trade.broker.clone_from(broker);
    }
    if let Some(entry_time) = &update.entry_time {
        trade.entry_time.clone_from(entry_time);
    }
    if let Some(details) = &update.details {
        trade.details = details.clone();
    }
    if let Some(trade_type) = update.trade_type {
        trade.trade_type = trade_type;
    }
    if let Some(entry_date) = update.entry_date {
        trade.entry_date = entry_date;
    }
    if let Some(quantity) = update.entry_quantity {
        trade.entry_quantity = quantity;
    }
    if let Some(price) = update.entry_price {
        trade.entry_price = price;
    }
    if update.cmp.is_some() {
        trade.cmp = update.cmp;
    }
}
