//! Settlement service: preparation, submission and seeding.

use bahi_shared::types::{CustomerId, SettlementId};
use chrono::{DateTime, Utc};

use super::cache::SeedCache;
use super::calculator::SettlementCalculator;
use super::carry_over::CarryOverResolver;
use super::error::{SettlementError, StoreError};
use super::store::SettlementStore;
use super::types::{CustomerLedgerSeed, MAX_ROWS, SettlementDraft, SettlementRecord};

/// Settlement service.
///
/// Stateless: the store, resolver and cache are passed in by the caller.
pub struct SettlementService;

impl SettlementService {
    /// Checks a draft can be submitted and returns its customer.
    pub fn validate(draft: &SettlementDraft) -> Result<CustomerId, SettlementError> {
        let customer_id = draft.customer_id.ok_or(SettlementError::MissingCustomer)?;

        if draft.rows.len() > MAX_ROWS {
            return Err(SettlementError::TooManyRows {
                count: draft.rows.len(),
                max: MAX_ROWS,
            });
        }

        Ok(customer_id)
    }

    /// Validates a draft and computes its breakdown.
    ///
    /// The draft's own timestamp is kept; otherwise it occurs at `now`.
    pub fn prepare(
        draft: SettlementDraft,
        now: DateTime<Utc>,
    ) -> Result<SettlementRecord, SettlementError> {
        let customer_id = Self::validate(&draft)?;
        let breakdown = SettlementCalculator::compute(&draft.rows, &draft.scalars);

        Ok(SettlementRecord {
            id: draft.id,
            customer_id,
            occurred_at: draft.occurred_at.unwrap_or(now),
            rows: draft.rows,
            pair_c_category: draft.pair_c_category,
            scalars: draft.scalars,
            breakdown,
        })
    }

    /// Prepares and persists a draft.
    ///
    /// A draft with an id replaces that settlement. When such a draft has no
    /// timestamp, the replaced settlement keeps its original one.
    pub async fn submit(
        store: &dyn SettlementStore,
        mut draft: SettlementDraft,
        now: DateTime<Utc>,
    ) -> Result<SettlementRecord, SettlementError> {
        let customer_id = Self::validate(&draft)?;

        if let (Some(id), None) = (draft.id, draft.occurred_at) {
            let existing = store
                .find(id)
                .await
                .map_err(|e| SettlementError::persist(customer_id, e))?
                .ok_or(SettlementError::NotFound(id))?;
            draft.occurred_at = Some(existing.occurred_at);
        }

        let record = Self::prepare(draft, now)?;
        store
            .save(record)
            .await
            .map_err(|e| SettlementError::persist(customer_id, e))
    }

    /// Deletes a settlement.
    pub async fn delete(store: &dyn SettlementStore, id: SettlementId) -> Result<(), SettlementError> {
        store.delete(id).await.map_err(|e| match e {
            StoreError::NotFound(id) => SettlementError::NotFound(id),
            other => SettlementError::Load(other),
        })
    }

    /// Loads the history a seed depends on: the customer's settlements plus
    /// every settlement of the current business day.
    pub async fn seed_history(
        store: &dyn SettlementStore,
        resolver: &CarryOverResolver,
        customer_id: CustomerId,
        now: DateTime<Utc>,
    ) -> Result<Vec<SettlementRecord>, SettlementError> {
        let (start, end) = resolver.day_bounds(resolver.business_day(now));

        let mut history = store
            .history_for_customer(customer_id)
            .await
            .map_err(SettlementError::Load)?;
        let today = store
            .settlements_between(start, end)
            .await
            .map_err(SettlementError::Load)?;

        history.extend(
            today
                .into_iter()
                .filter(|record| record.customer_id != customer_id),
        );
        Ok(history)
    }

    /// Resolves the carry-over seed for a new settlement of `customer_id`.
    pub async fn seed_for(
        store: &dyn SettlementStore,
        resolver: &CarryOverResolver,
        cache: &SeedCache,
        customer_id: CustomerId,
        now: DateTime<Utc>,
    ) -> Result<CustomerLedgerSeed, SettlementError> {
        let history = Self::seed_history(store, resolver, customer_id, now).await?;
        Ok(cache.resolve_cached(resolver, customer_id, &history, now))
    }
}
