//! Builders for journal primitives used across tests.
//!
//! Every builder uses the same fixed entry date, market and broker so tests
//! only spell out the values they assert on.

use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::application::accounting;
use crate::application::lifecycle::NewTrade;
use crate::domain::{
    AccountId, ExitRequest, PositionStatus, Trade, TradeDetails, TradeId, TradeType, UserId,
};

pub const MARKET: &str = "Indian";
pub const BROKER: &str = "Zerodha";
pub const INSTRUMENT: &str = "Cash/Equity";

/// Monday 2024-05-06.
pub fn entry_date() -> NaiveDate {
    date(2024, 5, 6)
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid calendar date")
}

/// An exit `days` after [`entry_date`].
pub fn exit_after(days: i64, quantity: Decimal, price: Decimal) -> ExitRequest {
    ExitRequest::new(entry_date() + Duration::days(days), quantity, price)
}

/// A request for a trade on [`entry_date`] with a market price of 52.
pub fn new_trade(trade_type: TradeType, quantity: Decimal, price: Decimal) -> NewTrade {
    NewTrade {
        market: MARKET.into(),
        instrument: INSTRUMENT.into(),
        exchange: "NSE".into(),
        broker: BROKER.into(),
        trade_type,
        entry_date: entry_date(),
        entry_time: "09:20".into(),
        entry_quantity: quantity,
        entry_price: price,
        cmp: Some(dec!(52)),
        details: TradeDetails::default(),
        exits: Vec::new(),
    }
}

/// An unsaved trade built from [`new_trade`] and run through the engine.
pub fn trade(trade_type: TradeType, quantity: Decimal, price: Decimal) -> Trade {
    let request = new_trade(trade_type, quantity, price);
    let mut trade = Trade {
        id: TradeId::generate(),
        account_id: AccountId::generate(),
        user_id: UserId::from("u1"),
        market: request.market,
        instrument: request.instrument,
        exchange: request.exchange,
        broker: request.broker,
        trade_type,
        entry_date: request.entry_date,
        entry_time: request.entry_time,
        entry_month: "May".into(),
        entry_weekday: "Monday".into(),
        entry_quantity: quantity,
        entry_price: price,
        details: request.details,
        cmp: request.cmp,
        open_quantity: quantity,
        status: PositionStatus::Open,
        profit_closed: Decimal::ZERO,
        profit_open: Decimal::ZERO,
        is_grouped: false,
        group_id: None,
        is_deleted: false,
        exits: Vec::new(),
        created_at: Utc::now(),
        version: 0,
    };
    accounting::rebase(&mut trade).expect("valid trade basis");
    trade
}
