//! `SeaORM` Entity for settlements table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "settlements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub customer_id: Uuid,
    pub occurred_at: DateTimeWithTimeZone,
    pub pair_c_category: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub entry_rows: Json,
    #[sea_orm(column_type = "JsonBinary")]
    pub scalars: Json,
    #[sea_orm(column_type = "JsonBinary")]
    pub breakdown: Json,
    #[sea_orm(column_type = "Decimal(None)")]
    pub closing_balance: Decimal,
    #[sea_orm(column_type = "Decimal(None)")]
    pub advance_net: Decimal,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
