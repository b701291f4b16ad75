//! Settlement repository for database operations.

use async_trait::async_trait;
use bahi_core::settlement::{
    PairCategory, RawEntryRow, SettlementBreakdown, SettlementRecord, SettlementScalars,
    SettlementStore, StoreError, normalize_rows,
};
use bahi_shared::types::{CustomerId, SettlementId};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Select, Set,
};
use tracing::error;
use uuid::Uuid;

use crate::entities::settlements;

/// Settlement repository backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct SettlementRepository {
    db: DatabaseConnection,
}

impl SettlementRepository {
    /// Creates a new settlement repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn list(
        &self,
        query: Select<settlements::Entity>,
    ) -> Result<Vec<SettlementRecord>, StoreError> {
        query
            .order_by_desc(settlements::Column::OccurredAt)
            .order_by_desc(settlements::Column::Id)
            .all(&self.db)
            .await
            .map_err(backend)?
            .into_iter()
            .map(into_record)
            .collect()
    }
}

fn backend(e: DbErr) -> StoreError {
    error!(error = %e, "Settlement store query failed");
    StoreError::Backend(e.to_string())
}

fn corrupt(id: Uuid, e: &serde_json::Error) -> StoreError {
    error!(settlement_id = %id, error = %e, "Stored settlement could not be decoded");
    StoreError::Backend(format!("settlement {id} is corrupt: {e}"))
}

/// Converts a stored row into a domain record.
///
/// Stored rows go through normalization, so settlements written in older
/// shapes load as canonical rows. The category column wins over any category
/// carried inside the rows.
pub fn into_record(model: settlements::Model) -> Result<SettlementRecord, StoreError> {
    let raw_rows: Vec<RawEntryRow> =
        serde_json::from_value(model.entry_rows).map_err(|e| corrupt(model.id, &e))?;
    let normalized = normalize_rows(raw_rows);
    let scalars: SettlementScalars =
        serde_json::from_value(model.scalars).map_err(|e| corrupt(model.id, &e))?;
    let breakdown: SettlementBreakdown =
        serde_json::from_value(model.breakdown).map_err(|e| corrupt(model.id, &e))?;

    Ok(SettlementRecord {
        id: Some(SettlementId::from_uuid(model.id)),
        customer_id: CustomerId::from_uuid(model.customer_id),
        occurred_at: model.occurred_at.with_timezone(&Utc),
        rows: normalized.rows,
        pair_c_category: PairCategory::from_tag(&model.pair_c_category)
            .unwrap_or(normalized.category),
        scalars,
        breakdown,
    })
}

/// Builds the active model for a record under the given id.
pub fn to_active_model(
    record: &SettlementRecord,
    id: Uuid,
    now: DateTime<Utc>,
) -> Result<settlements::ActiveModel, StoreError> {
    let encode = |e: serde_json::Error| StoreError::Backend(format!("encode settlement: {e}"));

    Ok(settlements::ActiveModel {
        id: Set(id),
        customer_id: Set(record.customer_id.into_inner()),
        occurred_at: Set(record.occurred_at.into()),
        pair_c_category: Set(record.pair_c_category.label().to_string()),
        entry_rows: Set(serde_json::to_value(&record.rows).map_err(encode)?),
        scalars: Set(serde_json::to_value(&record.scalars).map_err(encode)?),
        breakdown: Set(serde_json::to_value(record.breakdown).map_err(encode)?),
        closing_balance: Set(record.breakdown.closing_balance),
        advance_net: Set(record.breakdown.advance_net),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    })
}

#[async_trait]
impl SettlementStore for SettlementRepository {
    async fn history_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<SettlementRecord>, StoreError> {
        self.list(
            settlements::Entity::find()
                .filter(settlements::Column::CustomerId.eq(customer_id.into_inner())),
        )
        .await
    }

    async fn settlements_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<SettlementRecord>, StoreError> {
        self.list(
            settlements::Entity::find()
                .filter(settlements::Column::OccurredAt.gte(from))
                .filter(settlements::Column::OccurredAt.lt(to)),
        )
        .await
    }

    async fn all_settlements(&self) -> Result<Vec<SettlementRecord>, StoreError> {
        self.list(settlements::Entity::find()).await
    }

    async fn find(&self, id: SettlementId) -> Result<Option<SettlementRecord>, StoreError> {
        settlements::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(backend)?
            .map(into_record)
            .transpose()
    }

    async fn save(&self, record: SettlementRecord) -> Result<SettlementRecord, StoreError> {
        let now = Utc::now();

        let model = match record.id {
            None => {
                let active = to_active_model(&record, Uuid::now_v7(), now)?;
                active.insert(&self.db).await.map_err(backend)?
            }
            Some(id) => {
                let existing = settlements::Entity::find_by_id(id.into_inner())
                    .one(&self.db)
                    .await
                    .map_err(backend)?
                    .ok_or(StoreError::NotFound(id))?;

                let mut active = to_active_model(&record, id.into_inner(), now)?;
                active.created_at = Set(existing.created_at);
                active.update(&self.db).await.map_err(backend)?
            }
        };

        into_record(model)
    }

    async fn delete(&self, id: SettlementId) -> Result<(), StoreError> {
        let result = settlements::Entity::delete_by_id(id.into_inner())
            .exec(&self.db)
            .await
            .map_err(backend)?;

        if result.rows_affected == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }
}
