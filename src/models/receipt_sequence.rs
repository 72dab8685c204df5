use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The `receipt_sequences` table: a single persisted counter row so
/// receipt numbers survive restarts and are never reused.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "receipt_sequences")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,

    /// The next value to hand out.
    pub next_value: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Id of the one counter row used for receipt numbering.
pub const RECEIPT_SEQUENCE_ID: i32 = 1;
