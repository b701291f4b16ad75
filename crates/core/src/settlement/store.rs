//! Persistence port for settlements.

use std::sync::Arc;

use async_trait::async_trait;
use bahi_shared::types::{CustomerId, SettlementId};
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use super::carry_over::sort_newest_first;
use super::error::StoreError;
use super::types::SettlementRecord;

/// Reads and writes persisted settlements.
///
/// Listing methods return records newest first. Records are replaced whole,
/// never patched.
#[async_trait]
pub trait SettlementStore: Send + Sync {
    /// All settlements of one customer.
    async fn history_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<SettlementRecord>, StoreError>;

    /// Settlements with `from <= occurred_at < to`, across all customers.
    async fn settlements_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<SettlementRecord>, StoreError>;

    /// Every settlement.
    async fn all_settlements(&self) -> Result<Vec<SettlementRecord>, StoreError>;

    /// One settlement by id.
    async fn find(&self, id: SettlementId) -> Result<Option<SettlementRecord>, StoreError>;

    /// Creates the record when it has no id, replaces it when it does.
    ///
    /// Returns the persisted record with its id assigned. Replacing an id that
    /// does not exist is [`StoreError::NotFound`].
    async fn save(&self, record: SettlementRecord) -> Result<SettlementRecord, StoreError>;

    /// Deletes a settlement.
    async fn delete(&self, id: SettlementId) -> Result<(), StoreError>;
}

/// Process-local store backed by a concurrent map.
#[derive(Debug, Clone, Default)]
pub struct InMemorySettlementStore {
    records: Arc<DashMap<SettlementId, SettlementRecord>>,
}

impl InMemorySettlementStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored settlements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn collect(&self, keep: impl Fn(&SettlementRecord) -> bool) -> Vec<SettlementRecord> {
        let mut records: Vec<SettlementRecord> = self
            .records
            .iter()
            .filter(|entry| keep(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        sort_newest_first(&mut records);
        records
    }
}

#[async_trait]
impl SettlementStore for InMemorySettlementStore {
    async fn history_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<SettlementRecord>, StoreError> {
        Ok(self.collect(|record| record.customer_id == customer_id))
    }

    async fn settlements_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<SettlementRecord>, StoreError> {
        Ok(self.collect(|record| record.occurred_at >= from && record.occurred_at < to))
    }

    async fn all_settlements(&self) -> Result<Vec<SettlementRecord>, StoreError> {
        Ok(self.collect(|_| true))
    }

    async fn find(&self, id: SettlementId) -> Result<Option<SettlementRecord>, StoreError> {
        Ok(self.records.get(&id).map(|entry| entry.value().clone()))
    }

    async fn save(&self, mut record: SettlementRecord) -> Result<SettlementRecord, StoreError> {
        match record.id {
            Some(id) => {
                let mut existing = self.records.get_mut(&id).ok_or(StoreError::NotFound(id))?;
                *existing = record.clone();
            }
            None => {
                let id = SettlementId::new();
                record.id = Some(id);
                self.records.insert(id, record.clone());
            }
        }
        Ok(record)
    }

    async fn delete(&self, id: SettlementId) -> Result<(), StoreError> {
        self.records
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }
}
