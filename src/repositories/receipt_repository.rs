use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::goods_receipt::{
    self, Column, Entity as Receipt, Model as ReceiptModel, ReceiptStatus,
};
use crate::models::receipt_line_item::{self, Entity as LineItem, Model as LineItemModel};
use crate::models::receipt_status_history::{
    self, Entity as StatusHistory, Model as HistoryModel,
};
use crate::repositories::{BaseRepository, Repository};

/// Multi-criteria receipt search. All filters are optional and combined
/// with AND.
#[derive(Debug, Clone, Default)]
pub struct ReceiptSearchQuery {
    pub status: Option<ReceiptStatus>,
    pub supplier_id: Option<Uuid>,
    /// Substring match on the receipt number.
    pub number_contains: Option<String>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
    pub page: u64,
    pub page_size: u64,
}

/// Persistence access for receipts, line items, and their status history.
///
/// Reads run against the pool; write helpers are transaction-scoped so the
/// workflow engine composes them into a single atomic unit of work. The
/// status column is written exclusively by `record_transition`, which
/// appends the matching history entry in the same step: the newest
/// entry's `new_status` can therefore never diverge from the receipt.
#[derive(Debug)]
pub struct ReceiptRepository {
    base: BaseRepository,
}

impl ReceiptRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find a receipt by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<ReceiptModel>, ServiceError> {
        let receipt = Receipt::find_by_id(id).one(self.base.get_db()).await?;
        Ok(receipt)
    }

    /// Find a receipt by its human-readable number
    pub async fn find_by_number(
        &self,
        receipt_number: &str,
    ) -> Result<Option<ReceiptModel>, ServiceError> {
        let receipt = Receipt::find()
            .filter(Column::ReceiptNumber.eq(receipt_number))
            .one(self.base.get_db())
            .await?;
        Ok(receipt)
    }

    /// Line items of a receipt, in insertion order
    pub async fn find_line_items(
        &self,
        receipt_id: Uuid,
    ) -> Result<Vec<LineItemModel>, ServiceError> {
        self.find_line_items_in(self.base.get_db(), receipt_id).await
    }

    /// Same read against the caller's connection. The engine uses this
    /// while its transaction is open so the lines it acts on are the
    /// lines that transaction sees.
    pub async fn find_line_items_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        receipt_id: Uuid,
    ) -> Result<Vec<LineItemModel>, ServiceError> {
        let lines = LineItem::find()
            .filter(receipt_line_item::Column::ReceiptId.eq(receipt_id))
            .order_by_asc(receipt_line_item::Column::CreatedAt)
            .all(conn)
            .await?;
        Ok(lines)
    }

    pub async fn find_line_item(
        &self,
        line_item_id: Uuid,
    ) -> Result<Option<LineItemModel>, ServiceError> {
        let line = LineItem::find_by_id(line_item_id)
            .one(self.base.get_db())
            .await?;
        Ok(line)
    }

    /// Receipts in a given status, newest first, with pagination
    pub async fn list_by_status(
        &self,
        status: ReceiptStatus,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<ReceiptModel>, u64), ServiceError> {
        let paginator = Receipt::find()
            .filter(Column::Status.eq(status))
            .order_by_desc(Column::CreatedAt)
            .paginate(self.base.get_db(), page_size.max(1));

        let total = paginator.num_items().await?;
        let receipts = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((receipts, total))
    }

    /// Receipts created within the given window, newest first
    pub async fn list_by_date_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<ReceiptModel>, u64), ServiceError> {
        let paginator = Receipt::find()
            .filter(Column::CreatedAt.gte(from))
            .filter(Column::CreatedAt.lte(to))
            .order_by_desc(Column::CreatedAt)
            .paginate(self.base.get_db(), page_size.max(1));

        let total = paginator.num_items().await?;
        let receipts = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((receipts, total))
    }

    /// Multi-criteria search with pagination
    pub async fn search(
        &self,
        query: &ReceiptSearchQuery,
    ) -> Result<(Vec<ReceiptModel>, u64), ServiceError> {
        let mut select = Receipt::find();

        if let Some(status) = query.status {
            select = select.filter(Column::Status.eq(status));
        }
        if let Some(supplier_id) = query.supplier_id {
            select = select.filter(Column::SupplierId.eq(supplier_id));
        }
        if let Some(fragment) = &query.number_contains {
            select = select.filter(Column::ReceiptNumber.contains(fragment));
        }
        if let Some(from) = query.created_from {
            select = select.filter(Column::CreatedAt.gte(from));
        }
        if let Some(to) = query.created_to {
            select = select.filter(Column::CreatedAt.lte(to));
        }

        let paginator = select
            .order_by_desc(Column::CreatedAt)
            .paginate(self.base.get_db(), query.page_size.max(1));

        let total = paginator.num_items().await?;
        let receipts = paginator.fetch_page(query.page.saturating_sub(1)).await?;
        Ok((receipts, total))
    }

    /// Receipts with at least one line whose received quantity differs
    /// from a known expected quantity
    pub async fn list_discrepant(&self) -> Result<Vec<ReceiptModel>, ServiceError> {
        let discrepant_lines = LineItem::find()
            .filter(receipt_line_item::Column::ExpectedQuantity.is_not_null())
            .filter(
                Expr::col(receipt_line_item::Column::ExpectedQuantity)
                    .not_equals(receipt_line_item::Column::ReceivedQuantity),
            )
            .all(self.base.get_db())
            .await?;

        let receipt_ids: BTreeSet<Uuid> =
            discrepant_lines.iter().map(|line| line.receipt_id).collect();
        if receipt_ids.is_empty() {
            return Ok(Vec::new());
        }

        let receipts = Receipt::find()
            .filter(Column::Id.is_in(receipt_ids))
            .order_by_desc(Column::CreatedAt)
            .all(self.base.get_db())
            .await?;
        Ok(receipts)
    }

    /// Status history of a receipt, oldest entry first
    pub async fn history(&self, receipt_id: Uuid) -> Result<Vec<HistoryModel>, ServiceError> {
        let entries = StatusHistory::find()
            .filter(receipt_status_history::Column::ReceiptId.eq(receipt_id))
            .order_by_asc(receipt_status_history::Column::CreatedAt)
            .all(self.base.get_db())
            .await?;
        Ok(entries)
    }

    // ---- transaction-scoped write helpers ----

    /// Applies a status transition and appends the matching audit entry in
    /// one step. The update is conditional on the version the caller
    /// loaded; losing a concurrent race yields `ConcurrentModification`
    /// and writes nothing.
    ///
    /// `extra` carries any additional field changes that must land with
    /// the transition (observations, void bookkeeping).
    pub async fn record_transition(
        &self,
        txn: &DatabaseTransaction,
        receipt: &ReceiptModel,
        new_status: ReceiptStatus,
        changed_by: Option<Uuid>,
        notes: Option<String>,
        mut extra: goods_receipt::ActiveModel,
    ) -> Result<ReceiptModel, ServiceError> {
        let now = Utc::now();
        extra.status = Set(new_status);
        extra.updated_at = Set(now);
        extra.version = Set(receipt.version + 1);

        let result = Receipt::update_many()
            .set(extra)
            .filter(Column::Id.eq(receipt.id))
            .filter(Column::Version.eq(receipt.version))
            .exec(txn)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::ConcurrentModification(receipt.id));
        }

        receipt_status_history::ActiveModel {
            id: Set(Uuid::new_v4()),
            receipt_id: Set(receipt.id),
            previous_status: Set(Some(receipt.status)),
            new_status: Set(new_status),
            changed_by: Set(changed_by),
            notes: Set(notes),
            created_at: Set(now),
        }
        .insert(txn)
        .await?;

        self.reload(txn, receipt.id).await
    }

    /// Version-checked update of non-status fields; bumps `updated_at`
    /// and the version so concurrent lifecycle operations on the same
    /// receipt are serialized.
    pub async fn touch(
        &self,
        txn: &DatabaseTransaction,
        receipt: &ReceiptModel,
        mut changes: goods_receipt::ActiveModel,
    ) -> Result<ReceiptModel, ServiceError> {
        changes.updated_at = Set(Utc::now());
        changes.version = Set(receipt.version + 1);

        let result = Receipt::update_many()
            .set(changes)
            .filter(Column::Id.eq(receipt.id))
            .filter(Column::Version.eq(receipt.version))
            .exec(txn)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::ConcurrentModification(receipt.id));
        }

        self.reload(txn, receipt.id).await
    }

    /// Appends the creation history entry (no prior status).
    pub async fn record_creation(
        &self,
        txn: &DatabaseTransaction,
        receipt: &ReceiptModel,
        created_by: Option<Uuid>,
        notes: Option<String>,
    ) -> Result<(), ServiceError> {
        receipt_status_history::ActiveModel {
            id: Set(Uuid::new_v4()),
            receipt_id: Set(receipt.id),
            previous_status: Set(None),
            new_status: Set(receipt.status),
            changed_by: Set(created_by),
            notes: Set(notes),
            created_at: Set(receipt.created_at),
        }
        .insert(txn)
        .await?;
        Ok(())
    }

    async fn reload(
        &self,
        txn: &DatabaseTransaction,
        id: Uuid,
    ) -> Result<ReceiptModel, ServiceError> {
        Receipt::find_by_id(id)
            .one(txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Receipt {} not found", id)))
    }
}
