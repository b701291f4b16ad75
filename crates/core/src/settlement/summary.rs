//! Ledger summaries over settlement history.

use std::collections::HashMap;

use bahi_shared::types::{BalanceDirection, CustomerId};
use rust_decimal::Decimal;
use serde::Serialize;

use super::carry_over::{latest, sort_newest_first};
use super::types::SettlementRecord;

/// Number of recent settlements kept in customer statistics.
pub const RECENT_SETTLEMENTS: usize = 10;

/// Vendor-wide position built from each customer's latest settlement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LedgerSummary {
    /// Customers with at least one settlement.
    pub customer_count: usize,
    /// Customers whose latest balance is owed to the vendor.
    pub owing_customers: usize,
    /// Customers the vendor owes.
    pub owed_customers: usize,
    /// Sum of positive latest balances.
    pub receivable_total: Decimal,
    /// Sum of the absolute values of negative latest balances.
    pub payable_total: Decimal,
    /// Receivable less payable.
    pub net_position: Decimal,
    /// Sum of positive latest advance nets.
    pub advance_total: Decimal,
}

impl LedgerSummary {
    /// Summarizes history across all customers.
    #[must_use]
    pub fn from_history(history: &[SettlementRecord]) -> Self {
        let mut by_customer: HashMap<CustomerId, Vec<&SettlementRecord>> = HashMap::new();
        for record in history {
            by_customer.entry(record.customer_id).or_default().push(record);
        }

        let mut summary = Self {
            customer_count: by_customer.len(),
            ..Self::default()
        };

        for records in by_customer.into_values() {
            let Some(record) = latest(records) else {
                continue;
            };
            let balance = record.breakdown.closing_balance;

            match BalanceDirection::of(balance) {
                BalanceDirection::CustomerOwes => {
                    summary.owing_customers += 1;
                    summary.receivable_total = summary.receivable_total.saturating_add(balance);
                }
                BalanceDirection::VendorOwes => {
                    summary.owed_customers += 1;
                    summary.payable_total = summary.payable_total.saturating_add(balance.abs());
                }
                BalanceDirection::Settled => {}
            }

            if record.breakdown.advance_net > Decimal::ZERO {
                summary.advance_total = summary
                    .advance_total
                    .saturating_add(record.breakdown.advance_net);
            }
        }

        summary.net_position = summary.receivable_total.saturating_sub(summary.payable_total);
        summary
    }
}

/// Activity figures for one customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerStatistics {
    /// Customer described.
    pub customer_id: CustomerId,
    /// Number of settlements.
    pub settlement_count: usize,
    /// Sum of gross income.
    pub total_income: Decimal,
    /// Sum of payout totals.
    pub total_payout: Decimal,
    /// Sum of deductions.
    pub total_deduction: Decimal,
    /// Gross income per settlement.
    pub average_income: Decimal,
    /// Closing balance of the latest settlement.
    pub latest_closing_balance: Option<Decimal>,
    /// Direction of the latest closing balance.
    pub latest_direction: Option<BalanceDirection>,
    /// Most recent settlements, newest first.
    pub recent: Vec<SettlementRecord>,
}

impl CustomerStatistics {
    /// Computes statistics for `customer_id`. Other customers' records are ignored.
    #[must_use]
    pub fn from_history(customer_id: CustomerId, history: &[SettlementRecord]) -> Self {
        let mut own: Vec<SettlementRecord> = history
            .iter()
            .filter(|record| record.customer_id == customer_id)
            .cloned()
            .collect();
        sort_newest_first(&mut own);

        let sum = |field: fn(&SettlementRecord) -> Decimal| {
            own.iter()
                .map(field)
                .fold(Decimal::ZERO, Decimal::saturating_add)
        };
        let total_income = sum(|record| record.breakdown.gross_income);
        let total_payout = sum(|record| record.breakdown.payout_total);
        let total_deduction = sum(|record| record.breakdown.deduction_amount);

        let average_income = if own.is_empty() {
            Decimal::ZERO
        } else {
            total_income
                .checked_div(Decimal::from(own.len()))
                .unwrap_or(Decimal::ZERO)
        };

        let latest_closing_balance = own.first().map(|record| record.breakdown.closing_balance);

        Self {
            customer_id,
            settlement_count: own.len(),
            total_income,
            total_payout,
            total_deduction,
            average_income,
            latest_closing_balance,
            latest_direction: latest_closing_balance.map(BalanceDirection::of),
            recent: own.into_iter().take(RECENT_SETTLEMENTS).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settlement::types::{SettlementBreakdown, SettlementScalars};
    use bahi_shared::types::SettlementId;
    use chrono::{Datelike, TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn record(customer_id: CustomerId, day: u32, income: Decimal, closing: Decimal) -> SettlementRecord {
        SettlementRecord {
            id: Some(SettlementId::new()),
            customer_id,
            occurred_at: Utc.with_ymd_and_hms(2026, 10, day, 10, 0, 0).unwrap(),
            rows: Vec::new(),
            pair_c_category: Default::default(),
            scalars: SettlementScalars::default(),
            breakdown: SettlementBreakdown {
                gross_income: income,
                deduction_amount: income / dec!(10),
                payout_total: dec!(5),
                closing_balance: closing,
                advance_net: closing / dec!(2),
                ..SettlementBreakdown::default()
            },
        }
    }

    #[test]
    fn test_summary_uses_latest_balance_per_customer() {
        let a = CustomerId::new();
        let b = CustomerId::new();
        let c = CustomerId::new();
        let history = vec![
            record(a, 1, dec!(0), dec!(999)),
            record(a, 3, dec!(0), dec!(300)),
            record(b, 2, dec!(0), dec!(-120)),
            record(c, 2, dec!(0), dec!(0)),
        ];

        let summary = LedgerSummary::from_history(&history);

        assert_eq!(summary.customer_count, 3);
        assert_eq!(summary.owing_customers, 1);
        assert_eq!(summary.owed_customers, 1);
        assert_eq!(summary.receivable_total, dec!(300));
        assert_eq!(summary.payable_total, dec!(120));
        assert_eq!(summary.net_position, dec!(180));
        assert_eq!(summary.advance_total, dec!(150));
    }

    #[test]
    fn test_summary_of_empty_history() {
        assert_eq!(LedgerSummary::from_history(&[]), LedgerSummary::default());
    }

    #[test]
    fn test_customer_statistics() {
        let a = CustomerId::new();
        let history = vec![
            record(a, 1, dec!(100), dec!(10)),
            record(a, 4, dec!(300), dec!(-40)),
            record(CustomerId::new(), 5, dec!(5000), dec!(1)),
        ];

        let stats = CustomerStatistics::from_history(a, &history);

        assert_eq!(stats.settlement_count, 2);
        assert_eq!(stats.total_income, dec!(400));
        assert_eq!(stats.total_payout, dec!(10));
        assert_eq!(stats.total_deduction, dec!(40));
        assert_eq!(stats.average_income, dec!(200));
        assert_eq!(stats.latest_closing_balance, Some(dec!(-40)));
        assert_eq!(stats.latest_direction, Some(BalanceDirection::VendorOwes));
        assert_eq!(stats.recent[0].occurred_at.day(), 4);
    }

    #[test]
    fn test_recent_is_capped() {
        let a = CustomerId::new();
        let history: Vec<_> = (1..=15).map(|day| record(a, day, dec!(1), dec!(1))).collect();

        let stats = CustomerStatistics::from_history(a, &history);

        assert_eq!(stats.settlement_count, 15);
        assert_eq!(stats.recent.len(), RECENT_SETTLEMENTS);
        assert_eq!(stats.recent[0].occurred_at.day(), 15);
    }

    #[test]
    fn test_statistics_without_history() {
        let stats = CustomerStatistics::from_history(CustomerId::new(), &[]);

        assert_eq!(stats.settlement_count, 0);
        assert_eq!(stats.average_income, Decimal::ZERO);
        assert!(stats.latest_closing_balance.is_none());
    }
}
