//! SQLite journal store implementation.
//!
//! Persists accounts, trades (with exits and analyses) and groups using
//! Diesel. A commit runs in one immediate transaction; versioned updates use
//! `WHERE id = ? AND version = ?` and treat zero affected rows as a conflict.

use std::collections::HashMap;

use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, PooledConnection};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

use super::connection::{create_pool, run_migrations, DbPool};
use super::model::{AccountRow, AnalysisRow, ExitRow, GroupRow, TradeRow};
use super::schema::{accounts, exits, group_trades, trade_analyses, trades};
use crate::domain::{
    AccountId, DomainError, Exit, GroupId, GroupTrade, Trade, TradeAnalysis, TradeId,
    TradingAccount, UserId,
};
use crate::error::{Entity, Error, Result};
use crate::port::{ChangeSet, JournalStore, TradeQuery};

type Conn = PooledConnection<ConnectionManager<SqliteConnection>>;

/// SQLite-backed journal store.
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    /// Create a new SQLite store with the given connection pool.
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Open (or create) the database at `path` and apply pending migrations.
    ///
    /// # Errors
    /// Returns an error if the pool cannot be built or migrations fail.
    pub fn open(path: &str) -> Result<Self> {
        let pool = create_pool(path)?;
        run_migrations(&pool)?;
        Ok(Self::new(pool))
    }

    fn conn(&self) -> Result<Conn> {
        self.pool.get().map_err(|e| Error::Connection(e.to_string()))
    }
}

/// Attach exits and analyses to trade rows, preserving row order.
fn hydrate(conn: &mut SqliteConnection, rows: Vec<TradeRow>) -> Result<Vec<Trade>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();

    let mut analyses: HashMap<String, AnalysisRow> = trade_analyses::table
        .filter(trade_analyses::trade_id.eq_any(ids.clone()))
        .select(AnalysisRow::as_select())
        .load(conn)?
        .into_iter()
        .map(|row| (row.exit_id.clone(), row))
        .collect();

    let mut exits_by_trade: HashMap<String, Vec<Exit>> = HashMap::new();
    let exit_rows: Vec<ExitRow> = exits::table
        .filter(exits::trade_id.eq_any(ids))
        .order((exits::trade_id, exits::seq))
        .select(ExitRow::as_select())
        .load(conn)?;
    for row in exit_rows {
        let analysis: Option<TradeAnalysis> = analyses
            .remove(&row.id)
            .map(AnalysisRow::into_analysis)
            .transpose()?;
        let trade_id = row.trade_id.clone();
        exits_by_trade
            .entry(trade_id)
            .or_default()
            .push(row.into_exit(analysis)?);
    }

    rows.into_iter()
        .map(|row| {
            let exits = exits_by_trade.remove(&row.id).unwrap_or_default();
            row.into_trade(exits)
        })
        .collect()
}

fn insert_conflict(entity: Entity, id: String) -> impl FnOnce(DieselError) -> Error {
    move |err| match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            Error::conflict(entity, id)
        }
        other => other.into(),
    }
}

/// Map an account insert failure. Id clashes are caught before the insert,
/// so a unique violation can only come from `idx_accounts_live_name`.
fn account_insert_error(account: &TradingAccount) -> impl FnOnce(DieselError) -> Error + '_ {
    move |err| match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            DomainError::DuplicateAccountName(account.name.clone()).into()
        }
        other => other.into(),
    }
}

fn expected_version(version: u64) -> Result<i64> {
    i64::try_from(version).map_err(|e| Error::Parse(format!("version {version}: {e}")))
}

fn write_account(conn: &mut SqliteConnection, account: &TradingAccount) -> Result<()> {
    let row = AccountRow::from_account(account)?;
    if account.version == 0 {
        let taken: i64 = accounts::table
            .filter(accounts::id.eq(&row.id))
            .count()
            .get_result(conn)?;
        if taken > 0 {
            return Err(Error::conflict(Entity::Account, account.id));
        }
        diesel::insert_into(accounts::table)
            .values(&row)
            .execute(conn)
            .map_err(account_insert_error(account))?;
        return Ok(());
    }
    let updated = diesel::update(
        accounts::table
            .filter(accounts::id.eq(&row.id))
            .filter(accounts::version.eq(expected_version(account.version)?)),
    )
    .set(&row)
    .execute(conn)?;
    if updated == 0 {
        return Err(Error::conflict(Entity::Account, account.id));
    }
    Ok(())
}

fn write_trade(conn: &mut SqliteConnection, trade: &Trade) -> Result<()> {
    let row = TradeRow::from_trade(trade)?;
    if trade.version == 0 {
        diesel::insert_into(trades::table)
            .values(&row)
            .execute(conn)
            .map_err(insert_conflict(Entity::Trade, row.id.clone()))?;
    } else {
        let updated = diesel::update(
            trades::table
                .filter(trades::id.eq(&row.id))
                .filter(trades::version.eq(expected_version(trade.version)?)),
        )
        .set(&row)
        .execute(conn)?;
        if updated == 0 {
            return Err(Error::conflict(Entity::Trade, trade.id));
        }
    }

    // exits and analyses are owned by the trade and rewritten with it
    diesel::delete(trade_analyses::table.filter(trade_analyses::trade_id.eq(&row.id)))
        .execute(conn)?;
    diesel::delete(exits::table.filter(exits::trade_id.eq(&row.id))).execute(conn)?;

    let exit_rows = trade
        .exits
        .iter()
        .enumerate()
        .map(|(seq, exit)| ExitRow::from_exit(exit, seq))
        .collect::<Result<Vec<_>>>()?;
    let analysis_rows: Vec<AnalysisRow> = trade
        .exits
        .iter()
        .filter_map(|e| e.analysis.as_ref())
        .map(AnalysisRow::from_analysis)
        .collect();

    if !exit_rows.is_empty() {
        diesel::insert_into(exits::table)
            .values(&exit_rows)
            .execute(conn)?;
    }
    if !analysis_rows.is_empty() {
        diesel::insert_into(trade_analyses::table)
            .values(&analysis_rows)
            .execute(conn)?;
    }
    Ok(())
}

fn write_group(conn: &mut SqliteConnection, group: &GroupTrade) -> Result<()> {
    let row = GroupRow::from_group(group)?;
    if group.version == 0 {
        diesel::insert_into(group_trades::table)
            .values(&row)
            .execute(conn)
            .map_err(insert_conflict(Entity::Group, row.id.clone()))?;
        return Ok(());
    }
    let updated = diesel::update(
        group_trades::table
            .filter(group_trades::id.eq(&row.id))
            .filter(group_trades::version.eq(expected_version(group.version)?)),
    )
    .set(&row)
    .execute(conn)?;
    if updated == 0 {
        return Err(Error::conflict(Entity::Group, group.id));
    }
    Ok(())
}

impl JournalStore for SqliteStore {
    async fn get_account(&self, id: AccountId) -> Result<Option<TradingAccount>> {
        let mut conn = self.conn()?;
        let row: Option<AccountRow> = accounts::table
            .find(id.to_string())
            .select(AccountRow::as_select())
            .first(&mut conn)
            .optional()?;
        row.map(AccountRow::into_account).transpose()
    }

    async fn list_accounts(
        &self,
        user_id: &UserId,
        include_deleted: bool,
    ) -> Result<Vec<TradingAccount>> {
        let mut conn = self.conn()?;
        let mut query = accounts::table
            .filter(accounts::user_id.eq(user_id.as_str()))
            .into_boxed();
        if !include_deleted {
            query = query.filter(accounts::is_deleted.eq(false));
        }
        query
            .order(accounts::created_at)
            .select(AccountRow::as_select())
            .load(&mut conn)?
            .into_iter()
            .map(AccountRow::into_account)
            .collect()
    }

    async fn get_trade(&self, id: TradeId) -> Result<Option<Trade>> {
        let mut conn = self.conn()?;
        let row: Option<TradeRow> = trades::table
            .find(id.to_string())
            .select(TradeRow::as_select())
            .first(&mut conn)
            .optional()?;
        match row {
            Some(row) => Ok(hydrate(&mut conn, vec![row])?.pop()),
            None => Ok(None),
        }
    }

    async fn list_trades(&self, query: &TradeQuery) -> Result<Vec<Trade>> {
        let mut conn = self.conn()?;
        let mut statement = trades::table.into_boxed();
        if let Some(user_id) = &query.user_id {
            statement = statement.filter(trades::user_id.eq(user_id.as_str().to_owned()));
        }
        if let Some(account_id) = query.account_id {
            statement = statement.filter(trades::account_id.eq(account_id.to_string()));
        }
        if !query.include_deleted {
            statement = statement.filter(trades::is_deleted.eq(false));
        }
        if !query.include_grouped {
            statement = statement.filter(trades::is_grouped.eq(false));
        }
        let rows = statement
            .order((trades::entry_date, trades::created_at))
            .select(TradeRow::as_select())
            .load(&mut conn)?;
        hydrate(&mut conn, rows)
    }

    async fn get_group(&self, id: GroupId) -> Result<Option<GroupTrade>> {
        let mut conn = self.conn()?;
        let row: Option<GroupRow> = group_trades::table
            .find(id.to_string())
            .select(GroupRow::as_select())
            .first(&mut conn)
            .optional()?;
        row.map(GroupRow::into_group).transpose()
    }

    async fn list_groups(&self, user_id: &UserId) -> Result<Vec<GroupTrade>> {
        let mut conn = self.conn()?;
        group_trades::table
            .filter(group_trades::user_id.eq(user_id.as_str()))
            .filter(group_trades::is_deleted.eq(false))
            .order(group_trades::created_at)
            .select(GroupRow::as_select())
            .load(&mut conn)?
            .into_iter()
            .map(GroupRow::into_group)
            .collect()
    }

    async fn commit(&self, changes: ChangeSet) -> Result<()> {
        if changes.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn()?;
        conn.immediate_transaction(|conn| {
            for account in &changes.accounts {
                write_account(conn, account)?;
            }
            for trade in &changes.trades {
                write_trade(conn, trade)?;
            }
            for group in &changes.groups {
                write_group(conn, group)?;
            }
            Ok::<(), Error>(())
        })
    }
}
