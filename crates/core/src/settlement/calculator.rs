//! Settlement totals.

use rust_decimal::Decimal;

use super::types::{AdjustmentInput, EntryRow, RowTotals, SettlementBreakdown, SettlementScalars};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Computes the itemized settlement breakdown.
///
/// Pure and total: the same rows and scalars always produce the same
/// breakdown, and no input makes it fail.
pub struct SettlementCalculator;

impl SettlementCalculator {
    /// Computes the full breakdown in the fixed step order:
    ///
    /// 1. gross income = sum of row incomes
    /// 2. payout total = sum of the six row aggregates
    /// 3. deduction = gross income × rate / 100
    /// 4. net after deduction = gross income − deduction
    /// 5. balance before carry = net after deduction − payout total
    /// 6. total due = balance before carry + opening pending balance
    /// 7. pre-adjustment total = total due − deposit
    /// 8. adjustment = entered amount, or pre-adjustment total × rate / 100
    /// 9. closing balance = pre-adjustment total − adjustment
    /// 10. advance net = opening advance − cutting fee
    ///
    /// The deduction rate is not clamped.
    #[must_use]
    pub fn compute(rows: &[EntryRow], scalars: &SettlementScalars) -> SettlementBreakdown {
        let row_totals: RowTotals = rows.iter().sum();
        Self::from_row_totals(rows, row_totals, scalars)
    }

    /// Computes the breakdown from already aggregated row totals.
    #[must_use]
    pub fn from_row_totals(
        rows: &[EntryRow],
        row_totals: RowTotals,
        scalars: &SettlementScalars,
    ) -> SettlementBreakdown {
        let gross_income = rows
            .iter()
            .map(|row| row.income_amount)
            .fold(Decimal::ZERO, Decimal::saturating_add);
        let payout_total = row_totals.payout();

        let deduction_amount = percent_of(gross_income, scalars.deduction_rate_percent);
        let net_after_deduction = gross_income.saturating_sub(deduction_amount);
        let balance_before_carry = net_after_deduction.saturating_sub(payout_total);
        let total_due = balance_before_carry.saturating_add(scalars.opening_pending_balance);
        let pre_adjustment_total = total_due.saturating_sub(scalars.deposit_amount);

        let adjustment = match scalars.adjustment {
            AdjustmentInput::Manual { amount } => amount,
            AdjustmentInput::Rate { percent } => percent_of(pre_adjustment_total, percent),
        };
        let closing_balance = pre_adjustment_total.saturating_sub(adjustment);
        let advance_net = scalars.opening_advance.saturating_sub(scalars.cutting_fee);

        SettlementBreakdown {
            row_totals,
            gross_income,
            payout_total,
            deduction_amount,
            net_after_deduction,
            balance_before_carry,
            total_due,
            pre_adjustment_total,
            adjustment,
            closing_balance,
            advance_net,
        }
    }
}

fn percent_of(amount: Decimal, percent: Decimal) -> Decimal {
    amount
        .checked_mul(percent)
        .and_then(|scaled| scaled.checked_div(HUNDRED))
        .unwrap_or(Decimal::ZERO)
}
