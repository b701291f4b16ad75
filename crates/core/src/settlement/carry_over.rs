//! Carry-over resolution.
//!
//! Balances carry per customer: a new settlement opens with the closing
//! balance and advance net of that customer's latest settlement. Reference
//! values carry per business day: they come from the latest settlement of the
//! current day, whichever customer it belongs to.

use bahi_shared::types::CustomerId;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use super::types::{CustomerLedgerSeed, ReferenceValues, SettlementRecord};

/// Picks seed values for new settlements out of unsorted history.
#[derive(Debug, Clone, Copy)]
pub struct CarryOverResolver {
    timezone: Tz,
}

impl CarryOverResolver {
    /// Creates a resolver whose business days follow `timezone`.
    #[must_use]
    pub const fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    /// The business timezone.
    #[must_use]
    pub const fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Business day an instant falls on.
    #[must_use]
    pub fn business_day(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.timezone).date_naive()
    }

    /// UTC bounds `[start, end)` of a business day.
    #[must_use]
    pub fn day_bounds(&self, day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = self.start_of(day);
        let end = day
            .succ_opt()
            .map_or(DateTime::<Utc>::MAX_UTC, |next| self.start_of(next));
        (start, end)
    }

    fn start_of(&self, day: NaiveDate) -> DateTime<Utc> {
        let midnight = day.and_time(NaiveTime::MIN);
        self.timezone
            .from_local_datetime(&midnight)
            .earliest()
            .map_or_else(|| midnight.and_utc(), |local| local.with_timezone(&Utc))
    }

    /// Resolves the seed for a new settlement of `customer_id` at `now`.
    ///
    /// Never fails: without history the balances are zero and the reference
    /// values blank.
    #[must_use]
    pub fn resolve(
        &self,
        customer_id: CustomerId,
        history: &[SettlementRecord],
        now: DateTime<Utc>,
    ) -> CustomerLedgerSeed {
        let (opening_pending_balance, opening_advance) =
            latest_for_customer(history, customer_id).map_or_else(Default::default, |record| {
                (
                    record.breakdown.closing_balance,
                    record.breakdown.advance_net,
                )
            });

        let reference_values = self
            .latest_on_day(history, self.business_day(now))
            .map_or_else(ReferenceValues::default, |record| {
                record.scalars.reference_values.clone()
            });

        CustomerLedgerSeed {
            opening_pending_balance,
            opening_advance,
            reference_values,
        }
    }

    /// Latest settlement, across all customers, on the given business day.
    #[must_use]
    pub fn latest_on_day<'a>(
        &self,
        history: &'a [SettlementRecord],
        day: NaiveDate,
    ) -> Option<&'a SettlementRecord> {
        latest(
            history
                .iter()
                .filter(|record| self.business_day(record.occurred_at) == day),
        )
    }
}

/// Latest settlement of one customer.
#[must_use]
pub fn latest_for_customer(
    history: &[SettlementRecord],
    customer_id: CustomerId,
) -> Option<&SettlementRecord> {
    latest(
        history
            .iter()
            .filter(|record| record.customer_id == customer_id),
    )
}

/// Latest by occurrence time; on an exact tie the larger id wins.
pub fn latest<'a, I>(records: I) -> Option<&'a SettlementRecord>
where
    I: IntoIterator<Item = &'a SettlementRecord>,
{
    records
        .into_iter()
        .max_by(|a, b| (a.occurred_at, a.id).cmp(&(b.occurred_at, b.id)))
}

/// Sorts newest first using the same order as [`latest`].
pub fn sort_newest_first(records: &mut [SettlementRecord]) {
    records.sort_by(|a, b| (b.occurred_at, b.id).cmp(&(a.occurred_at, a.id)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settlement::types::{SettlementBreakdown, SettlementScalars};
    use bahi_shared::types::SettlementId;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn record(
        customer_id: CustomerId,
        occurred_at: DateTime<Utc>,
        closing: Decimal,
        open: &str,
    ) -> SettlementRecord {
        SettlementRecord {
            id: Some(SettlementId::new()),
            customer_id,
            occurred_at,
            rows: Vec::new(),
            pair_c_category: Default::default(),
            scalars: SettlementScalars {
                reference_values: ReferenceValues {
                    open: open.into(),
                    close: String::new(),
                    jod: String::new(),
                },
                ..SettlementScalars::default()
            },
            breakdown: SettlementBreakdown {
                closing_balance: closing,
                advance_net: closing / dec!(10),
                ..SettlementBreakdown::default()
            },
        }
    }

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, day, hour, 0, 0).unwrap()
    }

    fn resolver() -> CarryOverResolver {
        CarryOverResolver::new(chrono_tz::UTC)
    }

    #[test]
    fn test_no_history_yields_blank_seed() {
        let seed = resolver().resolve(CustomerId::new(), &[], at(15, 12));
        assert_eq!(seed, CustomerLedgerSeed::default());
    }

    #[test]
    fn test_latest_settlement_wins_regardless_of_order() {
        let customer = CustomerId::new();
        let history = vec![
            record(customer, at(14, 9), dec!(500), ""),
            record(customer, at(12, 9), dec!(100), ""),
        ];

        let seed = resolver().resolve(customer, &history, at(15, 12));

        assert_eq!(seed.opening_pending_balance, dec!(500));
        assert_eq!(seed.opening_advance, dec!(50));
    }

    #[test]
    fn test_timestamp_tie_breaks_on_larger_id() {
        let customer = CustomerId::new();
        let mut low = record(customer, at(14, 9), dec!(1), "");
        let mut high = record(customer, at(14, 9), dec!(2), "");
        low.id = Some(SettlementId::from_uuid(Uuid::from_u128(1)));
        high.id = Some(SettlementId::from_uuid(Uuid::from_u128(2)));

        let seed = resolver().resolve(customer, &[high.clone(), low.clone()], at(15, 12));
        assert_eq!(seed.opening_pending_balance, dec!(2));

        let seed = resolver().resolve(customer, &[low, high], at(15, 12));
        assert_eq!(seed.opening_pending_balance, dec!(2));
    }

    #[test]
    fn test_other_customers_do_not_affect_balances() {
        let customer = CustomerId::new();
        let other = CustomerId::new();
        let history = vec![
            record(customer, at(10, 9), dec!(75), ""),
            record(other, at(14, 9), dec!(9999), ""),
        ];

        let seed = resolver().resolve(customer, &history, at(15, 12));

        assert_eq!(seed.opening_pending_balance, dec!(75));
    }

    #[test]
    fn test_reference_values_come_from_latest_today_across_customers() {
        let first = CustomerId::new();
        let second = CustomerId::new();
        let newcomer = CustomerId::new();
        let history = vec![
            record(first, at(15, 8), dec!(10), "early"),
            record(second, at(15, 11), dec!(20), "late"),
            record(first, at(14, 23), dec!(30), "yesterday"),
        ];

        let seed = resolver().resolve(newcomer, &history, at(15, 18));

        assert_eq!(seed.reference_values.open, "late");
        assert_eq!(seed.opening_pending_balance, Decimal::ZERO);
    }

    #[test]
    fn test_reference_values_blank_when_nothing_today() {
        let customer = CustomerId::new();
        let history = vec![record(customer, at(14, 9), dec!(10), "yesterday")];

        let seed = resolver().resolve(customer, &history, at(15, 9));

        assert!(seed.reference_values.is_blank());
        assert_eq!(seed.opening_pending_balance, dec!(10));
    }

    #[test]
    fn test_business_day_follows_timezone() {
        // 20:00 UTC on the 14th is already the 15th in Kolkata (UTC+5:30).
        let resolver = CarryOverResolver::new(chrono_tz::Asia::Kolkata);
        let customer = CustomerId::new();
        let history = vec![record(customer, at(14, 20), dec!(10), "kolkata")];

        let seed = resolver.resolve(customer, &history, at(15, 6));

        assert_eq!(seed.reference_values.open, "kolkata");
        assert_eq!(
            resolver.business_day(at(14, 20)),
            NaiveDate::from_ymd_opt(2026, 10, 15).unwrap()
        );
    }

    #[test]
    fn test_day_bounds_in_business_timezone() {
        let resolver = CarryOverResolver::new(chrono_tz::Asia::Kolkata);
        let day = NaiveDate::from_ymd_opt(2026, 10, 15).unwrap();

        let (start, end) = resolver.day_bounds(day);

        assert_eq!(start, Utc.with_ymd_and_hms(2026, 10, 14, 18, 30, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 10, 15, 18, 30, 0).unwrap());
        assert_eq!(resolver.business_day(start), day);
        assert_eq!(resolver.business_day(end), day.succ_opt().unwrap());
    }

    #[test]
    fn test_sort_newest_first() {
        let customer = CustomerId::new();
        let mut history = vec![
            record(customer, at(10, 9), dec!(1), ""),
            record(customer, at(12, 9), dec!(3), ""),
            record(customer, at(11, 9), dec!(2), ""),
        ];

        sort_newest_first(&mut history);

        let closings: Vec<_> = history
            .iter()
            .map(|r| r.breakdown.closing_balance)
            .collect();
        assert_eq!(closings, vec![dec!(3), dec!(2), dec!(1)]);
    }
}
