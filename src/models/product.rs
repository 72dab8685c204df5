use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The `products` table. Master data is managed elsewhere; this crate
/// reads it for lookups and adjusts `stock_on_hand` when a receipt is
/// accepted.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique)]
    pub sku: String,

    pub name: String,

    pub unit_of_measure: String,

    pub stock_on_hand: Decimal,

    /// Reorder threshold, when defined for the product.
    pub minimum_stock: Option<Decimal>,

    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "crate::models::receipt_line_item::Entity")]
    ReceiptLineItems,
}

impl Related<crate::models::receipt_line_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReceiptLineItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether current stock sits at or below the configured minimum.
    pub fn is_below_minimum(&self) -> bool {
        match self.minimum_stock {
            Some(minimum) => self.stock_on_hand <= minimum,
            None => false,
        }
    }
}
