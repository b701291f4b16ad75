//! Amount helpers for signed settlement balances.
//!
//! Amounts are stored and computed at full `Decimal` precision. Rounding to two
//! places happens only when an amount is rendered.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Direction of a signed closing balance.
///
/// Positive balances mean the customer owes the vendor, negative balances mean
/// the vendor owes the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceDirection {
    /// Customer owes the vendor (receivable).
    CustomerOwes,
    /// Vendor owes the customer (payable).
    VendorOwes,
    /// Nothing outstanding.
    Settled,
}

impl BalanceDirection {
    /// Classifies a signed balance.
    #[must_use]
    pub fn of(balance: Decimal) -> Self {
        if balance > Decimal::ZERO {
            Self::CustomerOwes
        } else if balance < Decimal::ZERO {
            Self::VendorOwes
        } else {
            Self::Settled
        }
    }
}

/// Renders an amount with the two-place display convention.
#[must_use]
pub fn display_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{rounded:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_direction_of_positive_balance() {
        assert_eq!(BalanceDirection::of(dec!(0.01)), BalanceDirection::CustomerOwes);
    }

    #[test]
    fn test_direction_of_negative_balance() {
        assert_eq!(BalanceDirection::of(dec!(-250)), BalanceDirection::VendorOwes);
    }

    #[test]
    fn test_direction_of_zero_balance() {
        assert_eq!(BalanceDirection::of(Decimal::ZERO), BalanceDirection::Settled);
    }

    #[test]
    fn test_display_amount_pads_and_rounds() {
        assert_eq!(display_amount(dec!(12)), "12.00");
        assert_eq!(display_amount(dec!(12.345)), "12.35");
        assert_eq!(display_amount(dec!(-0.125)), "-0.13");
    }
}
