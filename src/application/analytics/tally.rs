//! Win/loss and profit/loss counters.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

/// Running counts for one bucket.
///
/// A contribution above zero is a win; zero or below is a loss.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Tally {
    pub count: u64,
    pub win_count: u64,
    pub loss_count: u64,
    pub total_profit: Decimal,
    pub total_loss: Decimal,
}

impl Tally {
    pub fn record(&mut self, value: Decimal) {
        self.count += 1;
        if value > Decimal::ZERO {
            self.win_count += 1;
            self.total_profit += value;
        } else {
            self.loss_count += 1;
            self.total_loss += value;
        }
    }

    pub fn merge(&mut self, other: &Self) {
        self.count += other.count;
        self.win_count += other.win_count;
        self.loss_count += other.loss_count;
        self.total_profit += other.total_profit;
        self.total_loss += other.total_loss;
    }

    #[must_use]
    pub fn net(&self) -> Decimal {
        self.total_profit + self.total_loss
    }

    /// Wins as a percentage of all contributions, 0 when empty.
    #[must_use]
    pub fn win_ratio(&self) -> f64 {
        compute_percentage(self.win_count, self.count).unwrap_or(0.0)
    }
}

/// Compute a percentage, returning None if the denominator is zero.
pub fn compute_percentage(numerator: u64, denominator: u64) -> Option<f64> {
    if denominator > 0 {
        Some(numerator as f64 / denominator as f64 * 100.0)
    } else {
        None
    }
}

/// One time bucket: overall totals plus a per-key breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodBucket {
    /// `YYYY-MM-DD` for daily buckets, `week-N` for weekly ones.
    pub label: String,
    pub totals: Tally,
    pub by_key: BTreeMap<String, Tally>,
}

impl PeriodBucket {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            totals: Tally::default(),
            by_key: BTreeMap::new(),
        }
    }

    pub fn record(&mut self, key: &str, value: Decimal) {
        self.totals.record(value);
        self.by_key.entry(key.to_string()).or_default().record(value);
    }

    pub fn merge(&mut self, other: &Self) {
        self.totals.merge(&other.totals);
        for (key, tally) in &other.by_key {
            self.by_key.entry(key.clone()).or_default().merge(tally);
        }
    }
}

/// Totals of one market or instrument across every period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeySummary {
    pub key: String,
    #[serde(flatten)]
    pub tally: Tally,
    pub win_ratio: f64,
}

impl KeySummary {
    pub fn new(key: String, tally: Tally) -> Self {
        let win_ratio = tally.win_ratio();
        Self {
            key,
            tally,
            win_ratio,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn zero_counts_as_loss() {
        let mut tally = Tally::default();
        tally.record(dec!(0));
        tally.record(dec!(10));
        tally.record(dec!(-4));

        assert_eq!(tally.count, 3);
        assert_eq!(tally.win_count, 1);
        assert_eq!(tally.loss_count, 2);
        assert_eq!(tally.total_profit, dec!(10));
        assert_eq!(tally.total_loss, dec!(-4));
        assert_eq!(tally.net(), dec!(6));
    }

    #[test]
    fn win_ratio_of_empty_tally_is_zero() {
        assert_eq!(Tally::default().win_ratio(), 0.0);
    }

    #[test]
    fn win_ratio_is_a_percentage() {
        let mut tally = Tally::default();
        for value in [dec!(1), dec!(2), dec!(3), dec!(-1)] {
            tally.record(value);
        }
        assert_eq!(tally.win_ratio(), 75.0);
    }

    #[test]
    fn compute_percentage_zero_denominator_returns_none() {
        assert!(compute_percentage(5, 0).is_none());
        assert_eq!(compute_percentage(1, 4), Some(25.0));
    }

    #[test]
    fn buckets_merge_per_key() {
        let mut a = PeriodBucket::new("week-1");
        a.record("Indian", dec!(5));
        let mut b = PeriodBucket::new("2024-05-02");
        b.record("Indian", dec!(-2));
        b.record("US", dec!(7));

        a.merge(&b);
        assert_eq!(a.totals.count, 3);
        assert_eq!(a.by_key["Indian"].count, 2);
        assert_eq!(a.by_key["Indian"].net(), dec!(3));
        assert_eq!(a.by_key["US"].win_count, 1);
    }
}
