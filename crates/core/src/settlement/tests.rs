//! Property-based tests for the settlement engine.

use bahi_shared::types::{CustomerId, SettlementId};
use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::calculator::SettlementCalculator;
use super::carry_over::CarryOverResolver;
use super::expression;
use super::types::{
    AdjustmentInput, EntryRow, ProductPair, RowKind, RowTotals, SettlementBreakdown,
    SettlementRecord, SettlementScalars,
};

fn cents(value: i64) -> Decimal {
    Decimal::new(value, 2)
}

fn row_strategy() -> impl Strategy<Value = EntryRow> {
    (
        0i64..10_000_000,
        0u32..1_000,
        0u32..1_000,
        0u32..1_000,
        prop::option::of(1u32..20),
        (-1_000i64..1_000, -1_000i64..1_000),
        (-1_000i64..1_000, -1_000i64..1_000),
        (-1_000i64..1_000, -1_000i64..1_000),
    )
        .prop_map(|(income, a, b, c, multiplier, pa, pb, pc)| {
            let mut row = EntryRow::new(RowKind::Custom("prop".into()));
            row.income_amount = cents(income);
            row.field_a = a.to_string();
            row.field_b = format!("{b}+");
            row.field_c = c.to_string();
            row.multiplier = multiplier.map(Decimal::from);
            row.pair_a = ProductPair::new(Decimal::from(pa.0), Decimal::from(pa.1));
            row.pair_b = ProductPair::new(Decimal::from(pb.0), Decimal::from(pb.1));
            row.pair_c = ProductPair::new(Decimal::from(pc.0), Decimal::from(pc.1));
            row
        })
}

fn scalars_strategy() -> impl Strategy<Value = SettlementScalars> {
    (
        0i64..10_000,
        -10_000_000i64..10_000_000,
        0i64..1_000_000,
        0i64..100_000,
        0i64..1_000_000,
        prop_oneof![
            (-100_000i64..100_000).prop_map(|a| AdjustmentInput::Manual { amount: cents(a) }),
            (0i64..10_000).prop_map(|p| AdjustmentInput::Rate { percent: cents(p) }),
        ],
    )
        .prop_map(|(rate, pending, advance, cutting, deposit, adjustment)| SettlementScalars {
            deduction_rate_percent: cents(rate),
            opening_pending_balance: cents(pending),
            opening_advance: cents(advance),
            cutting_fee: cents(cutting),
            deposit_amount: cents(deposit),
            adjustment,
            ..SettlementScalars::default()
        })
}

fn settled(customer_id: CustomerId, occurred_at: DateTime<Utc>, closing: Decimal) -> SettlementRecord {
    SettlementRecord {
        id: Some(SettlementId::new()),
        customer_id,
        occurred_at,
        rows: Vec::new(),
        pair_c_category: Default::default(),
        scalars: SettlementScalars::default(),
        breakdown: SettlementBreakdown {
            closing_balance: closing,
            ..SettlementBreakdown::default()
        },
    }
}

proptest! {
    /// fieldB contributes v * m * 10, or v unscaled without a multiplier.
    #[test]
    fn test_field_b_tens_convention(
        value in 0u32..100_000,
        multiplier in prop::option::of(1u32..50),
    ) {
        let mut row = EntryRow::new(RowKind::Custom("x".into()));
        row.field_b = value.to_string();
        row.multiplier = multiplier.map(Decimal::from);

        let totals = RowTotals::for_row(&row);

        let expected = match multiplier {
            Some(m) => Decimal::from(value) * Decimal::from(m) * dec!(10),
            None => Decimal::from(value),
        };
        prop_assert_eq!(totals.field_b_total, expected);
    }

    /// Pair contributions are the signed product of the two factors.
    #[test]
    fn test_pair_product_sign_preserved(v1 in -10_000i64..10_000, v2 in -10_000i64..10_000) {
        let mut row = EntryRow::new(RowKind::Custom("x".into()));
        row.pair_a = ProductPair::new(Decimal::from(v1), Decimal::from(v2));

        let totals = RowTotals::for_row(&row);

        prop_assert_eq!(totals.pair_a_total, Decimal::from(v1 * v2));
    }

    /// Computing the same input twice yields the same breakdown.
    #[test]
    fn test_calculator_idempotent(
        rows in prop::collection::vec(row_strategy(), 0..10),
        scalars in scalars_strategy(),
    ) {
        let first = SettlementCalculator::compute(&rows, &scalars);
        let second = SettlementCalculator::compute(&rows, &scalars);

        prop_assert_eq!(first, second);
    }

    /// The itemized steps chain into each other in the fixed order.
    #[test]
    fn test_breakdown_steps_chain(
        rows in prop::collection::vec(row_strategy(), 0..10),
        scalars in scalars_strategy(),
    ) {
        let b = SettlementCalculator::compute(&rows, &scalars);

        prop_assert_eq!(b.payout_total, b.row_totals.payout());
        prop_assert_eq!(b.net_after_deduction, b.gross_income - b.deduction_amount);
        prop_assert_eq!(b.balance_before_carry, b.net_after_deduction - b.payout_total);
        prop_assert_eq!(b.total_due, b.balance_before_carry + scalars.opening_pending_balance);
        prop_assert_eq!(b.pre_adjustment_total, b.total_due - scalars.deposit_amount);
        prop_assert_eq!(b.closing_balance, b.pre_adjustment_total - b.adjustment);
        prop_assert_eq!(b.advance_net, scalars.opening_advance - scalars.cutting_fee);
    }

    /// Row order does not change the breakdown.
    #[test]
    fn test_row_order_irrelevant(
        rows in prop::collection::vec(row_strategy(), 0..10),
        scalars in scalars_strategy(),
    ) {
        let mut reversed = rows.clone();
        reversed.reverse();

        prop_assert_eq!(
            SettlementCalculator::compute(&rows, &scalars),
            SettlementCalculator::compute(&reversed, &scalars)
        );
    }

    /// The customer's latest settlement seeds the balance, whatever the list order.
    #[test]
    fn test_carry_over_picks_latest(
        offsets in prop::collection::hash_set(0i64..10_000, 1..12),
        rotate in 0usize..12,
    ) {
        let customer = CustomerId::new();
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let mut history: Vec<SettlementRecord> = offsets
            .iter()
            .map(|&minutes| settled(customer, base + Duration::minutes(minutes), Decimal::from(minutes)))
            .collect();
        let len = history.len();
        history.rotate_left(rotate % len);

        let now = base + Duration::days(30);
        let seed = CarryOverResolver::new(chrono_tz::UTC).resolve(customer, &history, now);

        let newest = offsets.iter().copied().max().unwrap_or_default();
        prop_assert_eq!(seed.opening_pending_balance, Decimal::from(newest));
    }

    /// Evaluation never panics and ignores anything outside the arithmetic alphabet.
    #[test]
    fn test_evaluate_total(input in ".{0,40}") {
        let _ = expression::evaluate(&input);
        prop_assert_eq!(
            expression::evaluate(&input),
            expression::evaluate(&expression::sanitize(&input))
        );
    }

    /// Chained additions evaluate to their sum.
    #[test]
    fn test_evaluate_sum(values in prop::collection::vec(0u32..100_000, 1..8)) {
        let text = values.iter().map(u32::to_string).collect::<Vec<_>>().join("+");
        let expected: Decimal = values.iter().copied().map(Decimal::from).sum();

        prop_assert_eq!(expression::evaluate(&format!("{text}+")), expected);
    }
}
