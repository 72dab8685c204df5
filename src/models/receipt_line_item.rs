use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The `receipt_line_items` table. Lines are owned by their receipt and
/// never outlive it.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "receipt_line_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub receipt_id: Uuid,

    pub product_id: Uuid,

    /// Quantity expected from the originating purchase order, when known.
    pub expected_quantity: Option<Decimal>,

    pub received_quantity: Decimal,

    pub unit_of_measure: String,

    pub observations: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::models::goods_receipt::Entity",
        from = "Column::ReceiptId",
        to = "crate::models::goods_receipt::Column::Id"
    )]
    Receipt,
    #[sea_orm(
        belongs_to = "crate::models::product::Entity",
        from = "Column::ProductId",
        to = "crate::models::product::Column::Id"
    )]
    Product,
}

impl Related<crate::models::goods_receipt::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Receipt.def()
    }
}

impl Related<crate::models::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Derived flag, never stored: the line is discrepant when an expected
    /// quantity is known and differs from what was received.
    pub fn is_discrepant(&self) -> bool {
        match self.expected_quantity {
            Some(expected) => expected != self.received_quantity,
            None => false,
        }
    }

    /// Signed difference (received - expected), when an expectation exists.
    pub fn difference(&self) -> Option<Decimal> {
        self.expected_quantity
            .map(|expected| self.received_quantity - expected)
    }
}
