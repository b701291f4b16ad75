//! Per-row payout contributions.

use std::iter::Sum;
use std::ops::{Add, AddAssign};

use rust_decimal::Decimal;

use super::expression;
use super::types::{EntryRow, ProductPair, RowTotals};

impl RowTotals {
    /// Computes one row's contribution to each of the six payout aggregates.
    ///
    /// `field_b` is quoted in tens, so it is scaled by ten times the
    /// multiplier. Without a multiplier every field counts unscaled, including
    /// `field_b`.
    #[must_use]
    pub fn for_row(row: &EntryRow) -> Self {
        let (scale, tens_scale) = match row.multiplier {
            Some(multiplier) => (multiplier, multiplier.checked_mul(Decimal::TEN)),
            None => (Decimal::ONE, Some(Decimal::ONE)),
        };

        Self {
            field_a_total: scaled(&row.field_a, Some(scale)),
            field_b_total: scaled(&row.field_b, tens_scale),
            field_c_total: scaled(&row.field_c, Some(scale)),
            pair_a_total: product(row.pair_a),
            pair_b_total: product(row.pair_b),
            pair_c_total: product(row.pair_c),
        }
    }

    /// Sums the six aggregates into the payout total.
    #[must_use]
    pub fn payout(&self) -> Decimal {
        [
            self.field_a_total,
            self.field_b_total,
            self.field_c_total,
            self.pair_a_total,
            self.pair_b_total,
            self.pair_c_total,
        ]
        .into_iter()
        .fold(Decimal::ZERO, Decimal::saturating_add)
    }
}

fn scaled(expression_text: &str, scale: Option<Decimal>) -> Decimal {
    scale
        .and_then(|scale| expression::evaluate(expression_text).checked_mul(scale))
        .unwrap_or(Decimal::ZERO)
}

fn product(pair: ProductPair) -> Decimal {
    pair.v1.checked_mul(pair.v2).unwrap_or(Decimal::ZERO)
}

impl Add for RowTotals {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            field_a_total: self.field_a_total.saturating_add(rhs.field_a_total),
            field_b_total: self.field_b_total.saturating_add(rhs.field_b_total),
            field_c_total: self.field_c_total.saturating_add(rhs.field_c_total),
            pair_a_total: self.pair_a_total.saturating_add(rhs.pair_a_total),
            pair_b_total: self.pair_b_total.saturating_add(rhs.pair_b_total),
            pair_c_total: self.pair_c_total.saturating_add(rhs.pair_c_total),
        }
    }
}

impl AddAssign for RowTotals {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for RowTotals {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl<'a> Sum<&'a EntryRow> for RowTotals {
    fn sum<I: Iterator<Item = &'a EntryRow>>(iter: I) -> Self {
        iter.map(Self::for_row).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settlement::types::RowKind;
    use rust_decimal_macros::dec;

    fn row(multiplier: Option<Decimal>) -> EntryRow {
        let mut row = EntryRow::new(RowKind::Custom("test".into()));
        row.multiplier = multiplier;
        row
    }

    #[test]
    fn test_field_b_scaled_by_ten_times_multiplier() {
        let mut entry = row(Some(dec!(8)));
        entry.field_b = "5".into();

        let totals = RowTotals::for_row(&entry);

        assert_eq!(totals.field_b_total, dec!(400));
    }

    #[test]
    fn test_fields_unscaled_without_multiplier() {
        let mut entry = row(None);
        entry.field_a = "12+3".into();
        entry.field_b = "7".into();
        entry.field_c = "2*2".into();

        let totals = RowTotals::for_row(&entry);

        assert_eq!(totals.field_a_total, dec!(15));
        assert_eq!(totals.field_b_total, dec!(7));
        assert_eq!(totals.field_c_total, dec!(4));
    }

    #[test]
    fn test_fields_a_and_c_scaled_by_multiplier() {
        let mut entry = row(Some(dec!(9)));
        entry.field_a = "10".into();
        entry.field_c = "1+1".into();

        let totals = RowTotals::for_row(&entry);

        assert_eq!(totals.field_a_total, dec!(90));
        assert_eq!(totals.field_c_total, dec!(18));
    }

    #[test]
    fn test_pair_products_preserve_sign() {
        let mut entry = row(None);
        entry.pair_a = ProductPair::new(dec!(-3), dec!(4));
        entry.pair_b = ProductPair::new(dec!(2.5), dec!(2));
        entry.pair_c = ProductPair::new(dec!(-1), dec!(-6));

        let totals = RowTotals::for_row(&entry);

        assert_eq!(totals.pair_a_total, dec!(-12));
        assert_eq!(totals.pair_b_total, dec!(5));
        assert_eq!(totals.pair_c_total, dec!(6));
        assert_eq!(totals.payout(), dec!(-1));
    }

    #[test]
    fn test_overflowing_product_is_zero() {
        let mut entry = row(None);
        entry.pair_a = ProductPair::new(Decimal::MAX, dec!(2));

        assert_eq!(RowTotals::for_row(&entry).pair_a_total, Decimal::ZERO);
    }

    #[test]
    fn test_sum_over_rows() {
        let mut first = row(Some(dec!(8)));
        first.field_a = "1".into();
        let mut second = row(Some(dec!(9)));
        second.field_a = "1".into();
        second.pair_b = ProductPair::new(dec!(10), dec!(10));

        let totals: RowTotals = [first, second].iter().sum();

        assert_eq!(totals.field_a_total, dec!(17));
        assert_eq!(totals.pair_b_total, dec!(100));
        assert_eq!(totals.payout(), dec!(117));
    }

    #[test]
    fn test_empty_sum_is_zero() {
        let totals: RowTotals = std::iter::empty::<&EntryRow>().sum();
        assert_eq!(totals, RowTotals::default());
    }
}
