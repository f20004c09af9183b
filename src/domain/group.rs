//! Group trades: user-defined bundles of same-market, same-broker trades.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::{GroupId, TradeId, UserId};
use super::money::{Amount, Quantity};
use super::trade::Trade;

/// A virtual aggregate over several trades.
///
/// `quantity` is the sum of member entry quantities and `price` the sum of
/// member entry values (`entry_price * entry_quantity`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupTrade {
    pub id: GroupId,
    pub user_id: UserId,
    pub name: String,
    pub market: String,
    pub broker: String,
    pub quantity: Quantity,
    pub price: Amount,
    pub trade_ids: Vec<TradeId>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub version: u64,
}

impl GroupTrade {
    /// Build a group from its first members.
    ///
    /// # Errors
    /// Fails when `members` is empty, when a member is deleted or already
    /// grouped, or when members disagree on market or broker.
    pub fn from_members(
        user_id: UserId,
        name: impl Into<String>,
        members: &[Trade],
    ) -> Result<Self, DomainError> {
        let first = members.first().ok_or(DomainError::EmptyGroup)?;
        let mut group = Self {
            id: GroupId::generate(),
            user_id,
            name: name.into(),
            market: first.market.clone(),
            broker: first.broker.clone(),
            quantity: Decimal::ZERO,
            price: Decimal::ZERO,
            trade_ids: Vec::with_capacity(members.len()),
            is_deleted: false,
            created_at: Utc::now(),
            version: 0,
        };
        group.admit(members)?;
        Ok(group)
    }

    /// Check that `members` may join, then append them and add their totals.
    ///
    /// Nothing is modified when any member is rejected.
    ///
    /// # Errors
    /// See [`GroupTrade::from_members`].
    pub fn admit(&mut self, members: &[Trade]) -> Result<(), DomainError> {
        for (i, trade) in members.iter().enumerate() {
            let repeated = members[..i].iter().any(|t| t.id == trade.id);
            if !trade.is_groupable() || repeated || self.trade_ids.contains(&trade.id) {
                return Err(DomainError::TradeAlreadyGrouped(trade.id));
            }
            self.check_fields(trade)?;
        }
        for trade in members {
            self.trade_ids.push(trade.id);
            self.quantity += trade.entry_quantity;
            self.price += trade.entry_value();
        }
        Ok(())
    }

    /// Whether `trade` shares the group's market and broker.
    ///
    /// # Errors
    /// `InconsistentGroupFields` naming the first field that differs.
    pub fn check_fields(&self, trade: &Trade) -> Result<(), DomainError> {
        if trade.market != self.market {
            return Err(DomainError::InconsistentGroupFields { field: "market" });
        }
        if trade.broker != self.broker {
            return Err(DomainError::InconsistentGroupFields { field: "broker" });
        }
        Ok(())
    }

    /// Drop `members` and subtract their totals.
    ///
    /// Marks the group deleted once no members remain.
    ///
    /// # Errors
    /// Returns [`DomainError::TradeNotInGroup`] if any trade is not a member;
    /// nothing is modified in that case.
    pub fn release(&mut self, members: &[Trade]) -> Result<(), DomainError> {
        for (i, trade) in members.iter().enumerate() {
            let repeated = members[..i].iter().any(|t| t.id == trade.id);
            if repeated || !self.trade_ids.contains(&trade.id) {
                return Err(DomainError::TradeNotInGroup(trade.id));
            }
        }
        for trade in members {
            self.trade_ids.retain(|id| *id != trade.id);
            self.quantity -= trade.entry_quantity;
            self.price -= trade.entry_value();
        }
        if self.trade_ids.is_empty() {
            self.is_deleted = true;
        }
        Ok(())
    }

    #[must_use]
    pub fn contains(&self, trade_id: TradeId) -> bool {
        self.trade_ids.contains(&trade_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TradeType;
    use crate::testkit::domain::trade;
    use rust_decimal_macros::dec;

    fn member(quantity: Decimal, price: Decimal) -> Trade {
        trade(TradeType::Buy, quantity, price)
    }

    #[test]
    fn totals_sum_member_entries() {
        let a = member(dec!(10), dec!(100));
        let b = member(dec!(5), dec!(200));
        let group = GroupTrade::from_members(UserId::from("u1"), "pair", &[a, b]).unwrap();

        assert_eq!(group.quantity, dec!(15));
        assert_eq!(group.price, dec!(2000));
        assert_eq!(group.trade_ids.len(), 2);
    }

    #[test]
    fn empty_group_is_rejected() {
        let err = GroupTrade::from_members(UserId::from("u1"), "none", &[]).unwrap_err();
        assert_eq!(err, DomainError::EmptyGroup);
    }

    #[test]
    fn broker_mismatch_is_rejected() {
        let a = member(dec!(10), dec!(100));
        let mut b = member(dec!(5), dec!(200));
        b.broker = "Upstox".into();

        let err = GroupTrade::from_members(UserId::from("u1"), "pair", &[a, b]).unwrap_err();
        assert_eq!(err, DomainError::InconsistentGroupFields { field: "broker" });
    }

    #[test]
    fn admit_checks_against_existing_group() {
        let a = member(dec!(10), dec!(100));
        let mut group = GroupTrade::from_members(UserId::from("u1"), "g", &[a]).unwrap();
        let mut other = member(dec!(1), dec!(1));
        other.market = "US".into();

        let err = group.admit(&[other]).unwrap_err();
        assert_eq!(err, DomainError::InconsistentGroupFields { field: "market" });
        assert_eq!(group.trade_ids.len(), 1);
        assert_eq!(group.quantity, dec!(10));
    }

    #[test]
    fn check_fields_names_the_diverging_field() {
        let a = member(dec!(10), dec!(100));
        let group = GroupTrade::from_members(UserId::from("u1"), "g", &[a.clone()]).unwrap();
        assert_eq!(group.check_fields(&a), Ok(()));

        let mut moved = a;
        moved.broker = "Upstox".into();
        assert_eq!(
            group.check_fields(&moved),
            Err(DomainError::InconsistentGroupFields { field: "broker" })
        );
    }

    #[test]
    fn grouped_deleted_or_repeated_trades_are_rejected() {
        let a = member(dec!(10), dec!(100));
        let mut grouped = member(dec!(1), dec!(1));
        grouped.is_grouped = true;
        let mut deleted = member(dec!(1), dec!(1));
        deleted.is_deleted = true;

        for bad in [grouped.clone(), deleted.clone()] {
            let err = GroupTrade::from_members(UserId::from("u1"), "g", &[bad.clone()]).unwrap_err();
            assert_eq!(err, DomainError::TradeAlreadyGrouped(bad.id));
        }
        let err = GroupTrade::from_members(UserId::from("u1"), "g", &[a.clone(), a.clone()]).unwrap_err();
        assert_eq!(err, DomainError::TradeAlreadyGrouped(a.id));
    }

    #[test]
    fn releasing_last_member_deletes_group() {
        let a = member(dec!(10), dec!(100));
        let b = member(dec!(5), dec!(200));
        let mut group =
            GroupTrade::from_members(UserId::from("u1"), "pair", &[a.clone(), b.clone()]).unwrap();

        group.release(&[a]).unwrap();
        assert_eq!(group.quantity, dec!(5));
        assert_eq!(group.price, dec!(1000));
        assert!(!group.is_deleted);

        group.release(&[b]).unwrap();
        assert!(group.trade_ids.is_empty());
        assert!(group.is_deleted);
    }

    #[test]
    fn releasing_a_stranger_changes_nothing() {
        let a = member(dec!(10), dec!(100));
        let stranger = member(dec!(1), dec!(1));
        let mut group = GroupTrade::from_members(UserId::from("u1"), "g", &[a.clone()]).unwrap();

        let err = group.release(&[a, stranger.clone()]).unwrap_err();
        assert_eq!(err, DomainError::TradeNotInGroup(stranger.id));
        assert_eq!(group.quantity, dec!(10));
    }
}
