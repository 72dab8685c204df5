use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter};
use tracing::debug;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::product;

/// Inventory adjustment port, invoked only when a receipt is accepted.
///
/// Implementations receive the engine's open transaction so that stock
/// movements commit or roll back together with the status change and the
/// audit entry; a partial application is never observable.
#[async_trait]
pub trait StockAdjustment: Send + Sync {
    async fn increment_stock(
        &self,
        txn: &DatabaseTransaction,
        product_id: Uuid,
        quantity: Decimal,
    ) -> Result<(), ServiceError>;
}

/// Adjusts `products.stock_on_hand` in place with a single column-level
/// UPDATE, avoiding read-modify-write races between concurrent accepts of
/// different receipts touching the same product.
#[derive(Debug, Default, Clone)]
pub struct SqlStockAdjustment;

#[async_trait]
impl StockAdjustment for SqlStockAdjustment {
    async fn increment_stock(
        &self,
        txn: &DatabaseTransaction,
        product_id: Uuid,
        quantity: Decimal,
    ) -> Result<(), ServiceError> {
        let result = product::Entity::update_many()
            .col_expr(
                product::Column::StockOnHand,
                Expr::col(product::Column::StockOnHand).add(quantity),
            )
            .filter(product::Column::Id.eq(product_id))
            .exec(txn)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Product {} not found for stock adjustment",
                product_id
            )));
        }

        debug!(%product_id, %quantity, "stock incremented");
        Ok(())
    }
}
