use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a goods receipt.
///
/// The variants form a closed graph; `can_transition` is the only
/// legality oracle and every status write goes through it.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReceiptStatus {
    #[sea_orm(string_value = "PENDING")]
    #[strum(serialize = "PENDING")]
    Pending,
    #[sea_orm(string_value = "IN_PROGRESS")]
    #[strum(serialize = "IN_PROGRESS")]
    InProgress,
    #[sea_orm(string_value = "APPROVED")]
    #[strum(serialize = "APPROVED")]
    Approved,
    #[sea_orm(string_value = "PROCESSED")]
    #[strum(serialize = "PROCESSED")]
    Processed,
    #[sea_orm(string_value = "VOIDED")]
    #[strum(serialize = "VOIDED")]
    Voided,
    #[sea_orm(string_value = "REJECTED")]
    #[strum(serialize = "REJECTED")]
    Rejected,
}

impl ReceiptStatus {
    /// Whether the ordered pair (self, to) is a legal status transition.
    pub fn can_transition(self, to: ReceiptStatus) -> bool {
        use ReceiptStatus::*;
        matches!(
            (self, to),
            (Pending, InProgress)
                | (Pending, Voided)
                | (InProgress, Approved)
                | (InProgress, Rejected)
                | (Approved, Processed)
                | (Approved, Rejected)
                | (Processed, Voided)
        )
    }

    /// Whether the workflow has concluded for this receipt. Processed
    /// receipts are final for the workflow but may still be voided as an
    /// administrative reversal.
    pub fn is_final(self) -> bool {
        matches!(
            self,
            ReceiptStatus::Processed | ReceiptStatus::Voided | ReceiptStatus::Rejected
        )
    }

    /// Whether header fields and existing line items may still be edited.
    pub fn is_editable(self) -> bool {
        matches!(self, ReceiptStatus::Pending | ReceiptStatus::InProgress)
    }

    /// Whether new line items may still be added.
    pub fn allows_new_items(self) -> bool {
        self == ReceiptStatus::Pending
    }
}

/// The `goods_receipts` table.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "goods_receipts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Human-readable sequential number, unique and immutable once assigned.
    #[sea_orm(unique)]
    pub receipt_number: String,

    /// Originating purchase order, if the delivery was ordered.
    pub purchase_order_number: Option<String>,

    pub supplier_id: Uuid,

    pub status: ReceiptStatus,

    pub observations: Option<String>,

    /// Set only when status is Voided.
    pub voided_reason: Option<String>,
    pub voided_by: Option<Uuid>,

    /// Optimistic concurrency token, bumped on every mutation.
    pub version: i32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "crate::models::receipt_line_item::Entity")]
    LineItems,
    #[sea_orm(has_many = "crate::models::receipt_status_history::Entity")]
    StatusHistory,
    #[sea_orm(
        belongs_to = "crate::models::supplier::Entity",
        from = "Column::SupplierId",
        to = "crate::models::supplier::Column::Id"
    )]
    Supplier,
}

impl Related<crate::models::receipt_line_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LineItems.def()
    }
}

impl Related<crate::models::receipt_status_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StatusHistory.def()
    }
}

impl Related<crate::models::supplier::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supplier.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
