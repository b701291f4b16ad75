//! Settlements migration.
//!
//! Creates the settlements table. Rows, scalars and the computed breakdown are
//! stored as JSONB; the two carried figures are duplicated into numeric
//! columns for reporting queries.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(SETTLEMENTS_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared("DROP TABLE IF EXISTS settlements CASCADE;")
            .await?;
        Ok(())
    }
}

const SETTLEMENTS_SQL: &str = r"
-- One computed settlement per customer per occasion
CREATE TABLE settlements (
    id UUID PRIMARY KEY,
    customer_id UUID NOT NULL,
    occurred_at TIMESTAMPTZ NOT NULL,
    pair_c_category VARCHAR(16) NOT NULL DEFAULT 'jackpot',
    entry_rows JSONB NOT NULL DEFAULT '[]'::jsonb,
    scalars JSONB NOT NULL,
    breakdown JSONB NOT NULL,
    closing_balance NUMERIC NOT NULL,
    advance_net NUMERIC NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_pair_c_category CHECK (pair_c_category IN ('jackpot', 'sum', 'difference')),
    CONSTRAINT chk_entry_rows_is_array CHECK (jsonb_typeof(entry_rows) = 'array')
);

-- Customer history, newest first (carry-over lookup)
CREATE INDEX idx_settlements_customer ON settlements(customer_id, occurred_at DESC, id DESC);

-- Day-level lookup across customers (reference values)
CREATE INDEX idx_settlements_occurred ON settlements(occurred_at DESC, id DESC);
";
