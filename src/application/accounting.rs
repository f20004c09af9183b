//! Exit accounting engine.
//!
//! Turns a stream of exit events into open-quantity tracking, realized and
//! unrealized P&L, trade duration, strategy classification and ROI. Every
//! function here is pure over a [`Trade`] aggregate: it either returns an
//! error and leaves the trade untouched, or applies the whole change.
//!
//! Each exit's analysis is a snapshot of the position *at that exit*: it is
//! evaluated against the cumulative quantity of the exits up to and including
//! it, in insertion order. Revising an exit re-evaluates it and every later
//! exit, so analyses never go stale and realized profit is never counted
//! twice.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::debug;

use crate::domain::{
    AnalysisId, ClosedResult, DomainError, Exit, ExitId, ExitRequest, PositionStatus, Quantity,
    Trade, TradeAnalysis, TradeStrategy, TradeType,
};
use crate::error::{Entity, Error, Result};

/// Decimal places kept on stored ROI percentages.
const ROI_SCALE: u32 = 4;

/// Record a new exit against `trade`.
///
/// Returns the stored exit (with its analysis). The trade's accounting fields
/// are updated in place.
///
/// # Errors
/// [`DomainError::InvalidExitData`] for non-positive quantity or price and
/// [`DomainError::QuantityExceeded`] when the exit would take cumulative
/// exited quantity past the entry quantity.
pub fn apply_exit(trade: &mut Trade, request: &ExitRequest) -> Result<Exit> {
    request.validate()?;
    let available = trade.entry_quantity - trade.exited_quantity();
    if request.quantity > available {
        return Err(DomainError::QuantityExceeded {
            requested: request.quantity,
            available,
        }
        .into());
    }

    let mut next = trade.clone();
    next.exits.push(Exit::from_request(next.id, request));
    let index = next.exits.len() - 1;
    replay(&mut next, index, Utc::now());

    let exit = next.exits[index].clone();
    *trade = next;
    debug!(trade_id = %trade.id, exit_id = %exit.id, open_quantity = %trade.open_quantity, "exit applied");
    Ok(exit)
}

/// Replace the values of an existing exit and recompute downstream analyses.
///
/// # Errors
/// `NotFound` when the trade has no such exit, otherwise as [`apply_exit`],
/// where the quantity check uses the net change against the other exits.
pub fn revise_exit(trade: &mut Trade, exit_id: ExitId, request: &ExitRequest) -> Result<Exit> {
    request.validate()?;
    let index = trade
        .exit_index(exit_id)
        .ok_or_else(|| Error::not_found(Entity::Exit, exit_id))?;

    let others = trade.exited_quantity() - trade.exits[index].quantity;
    let available = trade.entry_quantity - others;
    if request.quantity > available {
        return Err(DomainError::QuantityExceeded {
            requested: request.quantity,
            available,
        }
        .into());
    }

    let mut next = trade.clone();
    next.exits[index].apply(request);
    replay(&mut next, index, Utc::now());

    let exit = next.exits[index].clone();
    *trade = next;
    debug!(trade_id = %trade.id, exit_id = %exit.id, open_quantity = %trade.open_quantity, "exit revised");
    Ok(exit)
}

/// Recompute every analysis after the trade's accounting basis changed
/// (entry quantity, price, date, direction or current market price).
///
/// # Errors
/// [`DomainError::InvalidTradeData`] for an unusable basis and
/// [`DomainError::QuantityExceeded`] if the entry quantity no longer covers
/// the already exited quantity.
pub fn rebase(trade: &mut Trade) -> Result<()> {
    validate_basis(trade)?;
    let exited = trade.exited_quantity();
    if exited > trade.entry_quantity {
        return Err(DomainError::QuantityExceeded {
            requested: exited,
            available: trade.entry_quantity,
        }
        .into());
    }
    replay(trade, 0, Utc::now());
    Ok(())
}

/// Entry quantity must be positive and entry price non-negative.
///
/// # Errors
/// Returns [`DomainError::InvalidTradeData`] naming the offending field.
pub fn validate_basis(trade: &Trade) -> std::result::Result<(), DomainError> {
    if trade.entry_quantity <= Decimal::ZERO {
        return Err(DomainError::InvalidTradeData(format!(
            "entry quantity must be positive, got {}",
            trade.entry_quantity
        )));
    }
    if trade.entry_price < Decimal::ZERO {
        return Err(DomainError::InvalidTradeData(format!(
            "entry price cannot be negative, got {}",
            trade.entry_price
        )));
    }
    if trade.cmp.is_some_and(|cmp| cmp < Decimal::ZERO) {
        return Err(DomainError::InvalidTradeData(
            "current market price cannot be negative".into(),
        ));
    }
    Ok(())
}

/// Analysis for `exit` given the cumulative exited quantity including it.
///
/// `previous` supplies the identity to keep when upserting.
#[must_use]
pub fn evaluate(
    trade: &Trade,
    exit: &Exit,
    cumulative_after: Quantity,
    previous: Option<&TradeAnalysis>,
    now: DateTime<Utc>,
) -> TradeAnalysis {
    let sign = trade.trade_type.sign();
    let position = if trade.entry_quantity > cumulative_after {
        PositionStatus::Open
    } else {
        PositionStatus::Close
    };
    let event_pl = sign * (exit.price - trade.entry_price) * exit.quantity;

    let (result, profit_closed, loss_closed, open_pl) = match position {
        PositionStatus::Close => {
            if event_pl < Decimal::ZERO {
                (Some(ClosedResult::Loss), Decimal::ZERO, event_pl, Decimal::ZERO)
            } else {
                (Some(ClosedResult::Profit), event_pl, Decimal::ZERO, Decimal::ZERO)
            }
        }
        PositionStatus::Open => {
            let remaining = trade.entry_quantity - cumulative_after;
            (None, Decimal::ZERO, Decimal::ZERO, mark_to_market(trade, remaining))
        }
    };

    let trade_duration = match position {
        PositionStatus::Close => Some((exit.exit_date - trade.entry_date).num_days()),
        PositionStatus::Open => None,
    };

    let investment = match trade.trade_type {
        TradeType::Buy => trade.entry_quantity * trade.entry_price,
        TradeType::Sell => exit.quantity * exit.price,
    };
    let basis = if position.is_open() { open_pl } else { profit_closed };
    let roi = (basis * Decimal::ONE_HUNDRED)
        .checked_div(investment)
        .map(|r| r.round_dp(ROI_SCALE));

    TradeAnalysis {
        id: previous.map_or_else(AnalysisId::generate, |p| p.id),
        trade_id: trade.id,
        exit_id: exit.id,
        position,
        result_closed_position: result,
        profit_closed_position: profit_closed,
        loss_closed_position: loss_closed,
        profit_and_loss_open_position: open_pl,
        trade_duration,
        trade_strategy: TradeStrategy::classify(trade_duration),
        investment,
        roi,
        created_at: previous.map_or(now, |p| p.created_at),
        updated_at: now,
    }
}

/// Unrealized P&L of `quantity` units valued at the trade's current market
/// price. Zero when no market price is known.
#[must_use]
pub fn mark_to_market(trade: &Trade, quantity: Quantity) -> Decimal {
    trade.cmp.map_or(Decimal::ZERO, |cmp| {
        trade.trade_type.sign() * (cmp - trade.entry_price) * quantity
    })
}

/// Re-evaluate exits from `from` onward and refresh trade-level fields.
fn replay(trade: &mut Trade, from: usize, now: DateTime<Utc>) {
    let mut cumulative: Quantity = trade.exits[..from.min(trade.exits.len())]
        .iter()
        .map(|e| e.quantity)
        .sum();
    let mut profit_closed = trade.profit_closed;

    let snapshot = trade.clone();
    for exit in trade.exits.iter_mut().skip(from) {
        cumulative += exit.quantity;
        let analysis = evaluate(&snapshot, exit, cumulative, exit.analysis.as_ref(), now);
        if let Some(old) = &exit.analysis {
            profit_closed -= old.realized();
        }
        profit_closed += analysis.realized();
        exit.analysis = Some(analysis);
    }

    trade.profit_closed = profit_closed;
    refresh_position(trade);
}

/// Derive open quantity, status and open P&L from the exit list.
fn refresh_position(trade: &mut Trade) {
    trade.open_quantity = trade.entry_quantity - trade.exited_quantity();
    if trade.open_quantity > Decimal::ZERO {
        trade.status = PositionStatus::Open;
        trade.profit_open = mark_to_market(trade, trade.open_quantity);
    } else {
        trade.status = PositionStatus::Close;
        trade.profit_open = Decimal::ZERO;
    }
}
