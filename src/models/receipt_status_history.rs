use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::goods_receipt::ReceiptStatus;

/// The `receipt_status_history` table. Append-only: entries are never
/// updated or deleted, and the newest entry's `new_status` always equals
/// the receipt's current status.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "receipt_status_history")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub receipt_id: Uuid,

    /// None only for the creation entry.
    pub previous_status: Option<ReceiptStatus>,

    pub new_status: ReceiptStatus,

    pub changed_by: Option<Uuid>,

    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::models::goods_receipt::Entity",
        from = "Column::ReceiptId",
        to = "crate::models::goods_receipt::Column::Id"
    )]
    Receipt,
}

impl Related<crate::models::goods_receipt::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Receipt.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
