use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use tracing::debug;

use crate::errors::ServiceError;
use crate::models::receipt_sequence::{self, Entity as SequenceEntity, RECEIPT_SEQUENCE_ID};

/// Issues unique, monotonically increasing receipt numbers backed by a
/// persisted counter row, so restarts never reuse a number.
#[derive(Debug, Clone)]
pub struct ReceiptNumberService {
    prefix: String,
}

impl ReceiptNumberService {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Draws the next receipt number inside the caller's transaction.
    ///
    /// The increment is a single conditional UPDATE, so concurrent callers
    /// serialize on the counter row at the storage layer; no two
    /// transactions can observe the same value. The unique index on
    /// `receipt_number` is the backstop should the store ever fail to
    /// serialize the increment.
    pub async fn next_number<C: ConnectionTrait>(&self, conn: &C) -> Result<String, ServiceError> {
        let result = SequenceEntity::update_many()
            .col_expr(
                receipt_sequence::Column::NextValue,
                Expr::col(receipt_sequence::Column::NextValue).add(1),
            )
            .filter(receipt_sequence::Column::Id.eq(RECEIPT_SEQUENCE_ID))
            .exec(conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::db_error("receipt sequence row is missing"));
        }

        let row = SequenceEntity::find_by_id(RECEIPT_SEQUENCE_ID)
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::db_error("receipt sequence row is missing"))?;

        // The row now holds the next value to hand out; this call owns the
        // one just before it.
        let drawn = row.next_value - 1;
        let number = self.format(drawn);
        debug!(%number, "receipt number drawn");
        Ok(number)
    }

    fn format(&self, value: i64) -> String {
        format!("{}-{:08}", self.prefix, value)
    }
}
