//! Memoized carry-over seeds using Moka.
//!
//! A seed is a pure function of the customer, the business day and the
//! history records that can influence it. The cache key includes a
//! fingerprint of those records, so a changed history never hits a stale
//! entry.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use bahi_shared::types::CustomerId;
use chrono::{DateTime, NaiveDate, Utc};
use moka::sync::Cache;

use super::carry_over::CarryOverResolver;
use super::types::{CustomerLedgerSeed, SettlementRecord};

/// Default cache capacity (number of entries).
const DEFAULT_CACHE_CAPACITY: u64 = 1_000;

/// Default time-to-live for cache entries (5 minutes).
const DEFAULT_TTL_SECS: u64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct SeedKey {
    customer_id: CustomerId,
    day: NaiveDate,
    fingerprint: u64,
}

/// Cache for carry-over seeds.
#[derive(Clone)]
pub struct SeedCache {
    cache: Cache<SeedKey, CustomerLedgerSeed>,
}

impl SeedCache {
    /// Creates a cache with default settings.
    ///
    /// Default: 1000 entries max, 5 minute TTL.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DEFAULT_CACHE_CAPACITY, DEFAULT_TTL_SECS)
    }

    /// Creates a cache with custom capacity and time-to-live.
    #[must_use]
    pub fn with_config(max_capacity: u64, ttl_secs: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self { cache }
    }

    /// Resolves a seed, returning the memoized value when the inputs are unchanged.
    #[must_use]
    pub fn resolve_cached(
        &self,
        resolver: &CarryOverResolver,
        customer_id: CustomerId,
        history: &[SettlementRecord],
        now: DateTime<Utc>,
    ) -> CustomerLedgerSeed {
        let day = resolver.business_day(now);
        let key = SeedKey {
            customer_id,
            day,
            fingerprint: fingerprint(resolver, customer_id, day, history),
        };

        self.cache
            .get_with(key, || resolver.resolve(customer_id, history, now))
    }

    /// Invalidates all cached entries.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    /// Returns the number of entries currently in the cache.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Runs cache maintenance tasks.
    pub fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks();
    }
}

impl Default for SeedCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Order-independent fingerprint of the records that can affect a seed:
/// the customer's own settlements and every settlement on `day`.
fn fingerprint(
    resolver: &CarryOverResolver,
    customer_id: CustomerId,
    day: NaiveDate,
    history: &[SettlementRecord],
) -> u64 {
    history
        .iter()
        .filter(|record| {
            record.customer_id == customer_id || resolver.business_day(record.occurred_at) == day
        })
        .map(|record| {
            let mut hasher = DefaultHasher::new();
            record.id.hash(&mut hasher);
            record.customer_id.hash(&mut hasher);
            record.occurred_at.hash(&mut hasher);
            record.breakdown.closing_balance.hash(&mut hasher);
            record.breakdown.advance_net.hash(&mut hasher);
            record.scalars.reference_values.hash(&mut hasher);
            hasher.finish()
        })
        .fold(0u64, u64::wrapping_add)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settlement::types::{ReferenceValues, SettlementBreakdown, SettlementScalars};
    use bahi_shared::types::SettlementId;
    use chrono::TimeZone;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn record(customer_id: CustomerId, hour: u32, closing: Decimal) -> SettlementRecord {
        SettlementRecord {
            id: Some(SettlementId::new()),
            customer_id,
            occurred_at: Utc.with_ymd_and_hms(2026, 10, 15, hour, 0, 0).unwrap(),
            rows: Vec::new(),
            pair_c_category: Default::default(),
            scalars: SettlementScalars {
                reference_values: ReferenceValues {
                    open: "1".into(),
                    ..ReferenceValues::default()
                },
                ..SettlementScalars::default()
            },
            breakdown: SettlementBreakdown {
                closing_balance: closing,
                ..SettlementBreakdown::default()
            },
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 15, 20, 0, 0).unwrap()
    }

    #[test]
    fn test_same_inputs_hit_cache() {
        let cache = SeedCache::new();
        let resolver = CarryOverResolver::new(chrono_tz::UTC);
        let customer = CustomerId::new();
        let history = vec![record(customer, 9, dec!(100))];

        let first = cache.resolve_cached(&resolver, customer, &history, now());
        let second = cache.resolve_cached(&resolver, customer, &history, now());
        cache.run_pending_tasks();

        assert_eq!(first, second);
        assert_eq!(cache.entry_count(), 1);
    }

    #[test]
    fn test_changed_history_is_not_stale() {
        let cache = SeedCache::new();
        let resolver = CarryOverResolver::new(chrono_tz::UTC);
        let customer = CustomerId::new();
        let mut history = vec![record(customer, 9, dec!(100))];

        let before = cache.resolve_cached(&resolver, customer, &history, now());
        history.push(record(customer, 10, dec!(250)));
        let after = cache.resolve_cached(&resolver, customer, &history, now());

        assert_eq!(before.opening_pending_balance, dec!(100));
        assert_eq!(after.opening_pending_balance, dec!(250));
    }

    #[test]
    fn test_fingerprint_ignores_order() {
        let resolver = CarryOverResolver::new(chrono_tz::UTC);
        let customer = CustomerId::new();
        let a = record(customer, 9, dec!(1));
        let b = record(customer, 10, dec!(2));
        let day = resolver.business_day(now());

        assert_eq!(
            fingerprint(&resolver, customer, day, &[a.clone(), b.clone()]),
            fingerprint(&resolver, customer, day, &[b, a])
        );
    }

    #[test]
    fn test_invalidate_all() {
        let cache = SeedCache::with_config(10, 60);
        let resolver = CarryOverResolver::new(chrono_tz::UTC);

        let _ = cache.resolve_cached(&resolver, CustomerId::new(), &[], now());
        cache.invalidate_all();
        cache.run_pending_tasks();

        assert_eq!(cache.entry_count(), 0);
    }
}
