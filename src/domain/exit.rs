//! Exit fills that reduce a trade's open quantity.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::analysis::TradeAnalysis;
use super::error::DomainError;
use super::id::{ExitId, TradeId};
use super::money::{Price, Quantity};

/// One recorded fill against a trade.
///
/// The analysis is logically owned by the exit: exactly one exists once the
/// exit has been through the accounting engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exit {
    pub id: ExitId,
    pub trade_id: TradeId,
    pub exit_date: NaiveDate,
    pub exit_time: Option<String>,
    pub quantity: Quantity,
    pub price: Price,
    pub analysis: Option<TradeAnalysis>,
}

impl Exit {
    /// Build a new exit for `trade_id` from a request.
    #[must_use]
    pub fn from_request(trade_id: TradeId, request: &ExitRequest) -> Self {
        Self {
            id: ExitId::generate(),
            trade_id,
            exit_date: request.exit_date,
            exit_time: request.exit_time.clone(),
            quantity: request.quantity,
            price: request.price,
            analysis: None,
        }
    }

    /// Overwrite the fill values in place, keeping identity and analysis.
    pub fn apply(&mut self, request: &ExitRequest) {
        self.exit_date = request.exit_date;
        self.exit_time = request.exit_time.clone();
        self.quantity = request.quantity;
        self.price = request.price;
    }

    /// The request that would reproduce this exit unchanged.
    #[must_use]
    pub fn to_request(&self) -> ExitRequest {
        ExitRequest {
            exit_date: self.exit_date,
            exit_time: self.exit_time.clone(),
            quantity: self.quantity,
            price: self.price,
        }
    }
}

/// User-supplied fill values for a new or revised exit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitRequest {
    pub exit_date: NaiveDate,
    #[serde(default)]
    pub exit_time: Option<String>,
    pub quantity: Quantity,
    pub price: Price,
}

impl ExitRequest {
    #[must_use]
    pub fn new(exit_date: NaiveDate, quantity: Quantity, price: Price) -> Self {
        Self {
            exit_date,
            exit_time: None,
            quantity,
            price,
        }
    }

    #[must_use]
    pub fn at(mut self, exit_time: impl Into<String>) -> Self {
        self.exit_time = Some(exit_time.into());
        self
    }

    /// Quantity and price must both be strictly positive.
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidExitData`] naming the offending field.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.quantity <= Decimal::ZERO {
            return Err(DomainError::InvalidExitData(format!(
                "quantity must be positive, got {}",
                self.quantity
            )));
        }
        if self.price <= Decimal::ZERO {
            return Err(DomainError::InvalidExitData(format!(
                "price must be positive, got {}",
                self.price
            )));
        }
        Ok(())
    }
}
