//! Monetary types for price, quantity and profit representation.

use rust_decimal::Decimal;

/// Price represented as a Decimal for precision.
pub type Price = Decimal;

/// Quantity (units, shares, contracts) represented as a Decimal.
pub type Quantity = Decimal;

/// Profit or loss amount; negative values are losses.
pub type Amount = Decimal;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn price_times_quantity_is_amount() {
        let price: Price = dec!(50.25);
        let quantity: Quantity = dec!(4);
        let amount: Amount = price * quantity;

        assert_eq!(amount, dec!(201.00));
    }
}
