use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, DatabaseConnection, DatabaseTransaction, EntityTrait,
    SqlErr, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::{
    auth::{actions, AccessControl},
    config::AppConfig,
    errors::ServiceError,
    events::{Event, EventSender},
    models::goods_receipt::{self, Model as ReceiptModel, ReceiptStatus},
    models::receipt_line_item::{self, Model as LineItemModel},
    models::receipt_status_history::Model as HistoryModel,
    repositories::{ReceiptRepository, ReceiptSearchQuery},
    services::catalog::MasterDataService,
    services::discrepancy::{self, DiscrepancyFinding},
    services::numbering::ReceiptNumberService,
    services::stock::StockAdjustment,
};

/// Input for a new receipt line.
#[derive(Debug, Clone, Deserialize)]
pub struct NewLineItem {
    pub product_id: Uuid,
    pub expected_quantity: Option<Decimal>,
    pub received_quantity: Decimal,
    pub unit_of_measure: String,
    pub observations: Option<String>,
}

/// Input for creating a receipt. At least one line item is required.
#[derive(Debug, Clone, Deserialize)]
pub struct NewReceipt {
    pub supplier_id: Uuid,
    pub purchase_order_number: Option<String>,
    pub observations: Option<String>,
    pub line_items: Vec<NewLineItem>,
}

/// Editable header fields; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReceiptChanges {
    pub purchase_order_number: Option<String>,
    pub observations: Option<String>,
}

/// Editable line fields; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LineItemChanges {
    pub expected_quantity: Option<Decimal>,
    pub received_quantity: Option<Decimal>,
    pub unit_of_measure: Option<String>,
    pub observations: Option<String>,
}

/// The goods-receipt workflow engine.
///
/// Every mutating operation runs as one transaction: authorize, load
/// current state, validate against the status graph, apply the change,
/// append the audit entry, commit. Events are emitted only after a
/// successful commit.
#[derive(Clone)]
pub struct ReceivingService {
    db: Arc<DatabaseConnection>,
    repository: Arc<ReceiptRepository>,
    master_data: MasterDataService,
    access: Arc<dyn AccessControl>,
    stock: Arc<dyn StockAdjustment>,
    numbers: ReceiptNumberService,
    auto_approve_on_accept: bool,
    event_sender: Option<EventSender>,
}

impl ReceivingService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: &AppConfig,
        access: Arc<dyn AccessControl>,
        stock: Arc<dyn StockAdjustment>,
        event_sender: Option<EventSender>,
    ) -> Self {
        Self {
            repository: Arc::new(ReceiptRepository::new(db.clone())),
            master_data: MasterDataService::new(db.clone()),
            numbers: ReceiptNumberService::new(config.receipt_number_prefix.clone()),
            auto_approve_on_accept: config.auto_approve_on_accept,
            db,
            access,
            stock,
            event_sender,
        }
    }

    pub fn repository(&self) -> Arc<ReceiptRepository> {
        self.repository.clone()
    }

    /// Creates a receipt in Pending status with its lines, a fresh
    /// sequential number, and the initial history entry.
    #[instrument(skip(self, input), fields(supplier_id = %input.supplier_id))]
    pub async fn create(
        &self,
        input: NewReceipt,
        user_id: Uuid,
    ) -> Result<ReceiptModel, ServiceError> {
        self.authorize(user_id, actions::RECEIPT_CREATE, None).await?;
        self.validate_new_receipt(&input).await?;

        let txn = self.db.begin().await?;

        let receipt_number = self.numbers.next_number(&txn).await?;
        let now = Utc::now();
        let receipt_id = Uuid::new_v4();

        let receipt = goods_receipt::ActiveModel {
            id: Set(receipt_id),
            receipt_number: Set(receipt_number.clone()),
            purchase_order_number: Set(input.purchase_order_number.clone()),
            supplier_id: Set(input.supplier_id),
            status: Set(ReceiptStatus::Pending),
            observations: Set(input.observations.clone()),
            voided_reason: Set(None),
            voided_by: Set(None),
            version: Set(1),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                error!(%receipt_number, "receipt number collision");
                ServiceError::Conflict(format!(
                    "Receipt number {} is already taken",
                    receipt_number
                ))
            }
            _ => ServiceError::DatabaseError(e),
        })?;

        for line in &input.line_items {
            self.insert_line(&txn, receipt_id, line, now).await?;
        }

        self.repository
            .record_creation(&txn, &receipt, Some(user_id), None)
            .await?;

        txn.commit().await?;

        info!(%receipt_number, %receipt_id, "receipt created");
        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::ReceiptCreated {
                    receipt_id,
                    receipt_number,
                    supplier_id: input.supplier_id,
                })
                .await;
        }

        Ok(receipt)
    }

    /// Appends a line item to a receipt that still accepts new items.
    #[instrument(skip(self, line))]
    pub async fn add_line_item(
        &self,
        receipt_id: Uuid,
        line: NewLineItem,
        user_id: Uuid,
    ) -> Result<LineItemModel, ServiceError> {
        self.authorize(user_id, actions::RECEIPT_UPDATE, Some(receipt_id))
            .await?;
        self.validate_line(&line)?;

        if !self.master_data.product_exists(line.product_id).await? {
            return Err(ServiceError::NotFound(format!(
                "Product {} not found",
                line.product_id
            )));
        }

        let txn = self.db.begin().await?;
        let receipt = self.load(&txn, receipt_id).await?;

        if !receipt.status.allows_new_items() {
            return Err(ServiceError::InvalidState(format!(
                "Receipt {} is {} and no longer accepts new line items",
                receipt.receipt_number, receipt.status
            )));
        }

        let inserted = self
            .insert_line(&txn, receipt_id, &line, Utc::now())
            .await?;
        self.repository
            .touch(&txn, &receipt, Default::default())
            .await?;

        txn.commit().await?;

        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::ReceiptLineAdded {
                    receipt_id,
                    line_item_id: inserted.id,
                    product_id: inserted.product_id,
                    received_quantity: inserted.received_quantity,
                })
                .await;
        }

        Ok(inserted)
    }

    /// Edits header fields of a receipt while it is still editable.
    #[instrument(skip(self, changes))]
    pub async fn update_receipt(
        &self,
        receipt_id: Uuid,
        changes: ReceiptChanges,
        user_id: Uuid,
    ) -> Result<ReceiptModel, ServiceError> {
        self.authorize(user_id, actions::RECEIPT_UPDATE, Some(receipt_id))
            .await?;

        let txn = self.db.begin().await?;
        let receipt = self.load(&txn, receipt_id).await?;

        if !receipt.status.is_editable() {
            return Err(ServiceError::InvalidState(format!(
                "Receipt {} is {} and cannot be edited",
                receipt.receipt_number, receipt.status
            )));
        }

        let mut update: goods_receipt::ActiveModel = Default::default();
        if let Some(po_number) = changes.purchase_order_number {
            update.purchase_order_number = Set(Some(po_number));
        }
        if let Some(observations) = changes.observations {
            update.observations = Set(Some(observations));
        }

        let updated = self.repository.touch(&txn, &receipt, update).await?;
        txn.commit().await?;
        Ok(updated)
    }

    /// Edits a line item while its parent receipt is still editable.
    #[instrument(skip(self, changes))]
    pub async fn update_line_item(
        &self,
        line_item_id: Uuid,
        changes: LineItemChanges,
        user_id: Uuid,
    ) -> Result<LineItemModel, ServiceError> {
        let line = self
            .repository
            .find_line_item(line_item_id)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Line item {} not found", line_item_id))
            })?;

        self.authorize(user_id, actions::RECEIPT_UPDATE, Some(line.receipt_id))
            .await?;

        if let Some(received) = changes.received_quantity {
            if received < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "Received quantity cannot be negative".into(),
                ));
            }
        }

        let txn = self.db.begin().await?;
        let receipt = self.load(&txn, line.receipt_id).await?;

        if !receipt.status.is_editable() {
            return Err(ServiceError::InvalidState(format!(
                "Receipt {} is {} and its line items cannot be edited",
                receipt.receipt_number, receipt.status
            )));
        }

        let mut active: receipt_line_item::ActiveModel = line.into();
        if let Some(expected) = changes.expected_quantity {
            active.expected_quantity = Set(Some(expected));
        }
        if let Some(received) = changes.received_quantity {
            active.received_quantity = Set(received);
        }
        if let Some(unit) = changes.unit_of_measure {
            active.unit_of_measure = Set(unit);
        }
        if let Some(observations) = changes.observations {
            active.observations = Set(Some(observations));
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&txn).await?;
        // Bump the parent version so concurrent lifecycle operations on
        // the same receipt serialize against this edit.
        self.repository
            .touch(&txn, &receipt, Default::default())
            .await?;

        txn.commit().await?;
        Ok(updated)
    }

    /// Verifies a receipt: runs discrepancy analysis over its lines,
    /// folds the findings into the observations, and moves it to
    /// InProgress. A receipt already InProgress may be re-verified; the
    /// repeat pass is recorded in the history as well.
    #[instrument(skip(self))]
    pub async fn verify(
        &self,
        receipt_id: Uuid,
        observations: Option<String>,
        user_id: Uuid,
    ) -> Result<(ReceiptModel, Vec<DiscrepancyFinding>), ServiceError> {
        self.authorize(user_id, actions::RECEIPT_VERIFY, Some(receipt_id))
            .await?;

        let txn = self.db.begin().await?;
        let receipt = self.load(&txn, receipt_id).await?;

        let reverification = receipt.status == ReceiptStatus::InProgress;
        if !reverification && !receipt.status.can_transition(ReceiptStatus::InProgress) {
            return Err(ServiceError::InvalidState(format!(
                "Receipt {} cannot be verified from status {}",
                receipt.receipt_number, receipt.status
            )));
        }

        let lines = self.repository.find_line_items_in(&txn, receipt_id).await?;
        let findings = discrepancy::analyze(&lines);
        let summary = discrepancy::summarize(&findings);

        let mut extra: goods_receipt::ActiveModel = Default::default();
        if let Some(note) = merge_observations(receipt.observations.as_deref(), summary.as_deref())
        {
            extra.observations = Set(Some(note));
        }

        let notes = match (observations, &summary) {
            (Some(obs), Some(sum)) => Some(format!("{}\n{}", obs, sum)),
            (Some(obs), None) => Some(obs),
            (None, Some(sum)) => Some(sum.clone()),
            (None, None) => None,
        };

        let updated = self
            .repository
            .record_transition(
                &txn,
                &receipt,
                ReceiptStatus::InProgress,
                Some(user_id),
                notes,
                extra,
            )
            .await?;

        txn.commit().await?;

        info!(
            receipt_number = %updated.receipt_number,
            discrepancies = findings.len(),
            reverification,
            "receipt verified"
        );
        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::ReceiptVerified {
                    receipt_id,
                    discrepancy_count: findings.len(),
                })
                .await;
        }

        Ok((updated, findings))
    }

    /// Approves a verified receipt (InProgress -> Approved). Exposed as
    /// its own operation so callers sequence the workflow explicitly.
    #[instrument(skip(self))]
    pub async fn approve(
        &self,
        receipt_id: Uuid,
        observations: Option<String>,
        user_id: Uuid,
    ) -> Result<ReceiptModel, ServiceError> {
        self.authorize(user_id, actions::RECEIPT_APPROVE, Some(receipt_id))
            .await?;

        let txn = self.db.begin().await?;
        let receipt = self.load(&txn, receipt_id).await?;

        if !receipt.status.can_transition(ReceiptStatus::Approved) {
            return Err(ServiceError::InvalidState(format!(
                "Receipt {} cannot be approved from status {}",
                receipt.receipt_number, receipt.status
            )));
        }

        let updated = self
            .repository
            .record_transition(
                &txn,
                &receipt,
                ReceiptStatus::Approved,
                Some(user_id),
                observations,
                Default::default(),
            )
            .await?;

        txn.commit().await?;

        info!(receipt_number = %updated.receipt_number, "receipt approved");
        if let Some(sender) = &self.event_sender {
            sender.send_or_log(Event::ReceiptApproved { receipt_id }).await;
        }

        Ok(updated)
    }

    /// Accepts an approved receipt: moves it to Processed and increments
    /// stock once per line item, all inside one transaction. If any stock
    /// update fails the whole operation rolls back and the receipt keeps
    /// its prior status.
    ///
    /// With `auto_approve_on_accept` configured, an InProgress receipt is
    /// taken through Approved first; both hops are graph-checked and both
    /// land in the history.
    #[instrument(skip(self))]
    pub async fn accept(
        &self,
        receipt_id: Uuid,
        observations: Option<String>,
        user_id: Uuid,
    ) -> Result<ReceiptModel, ServiceError> {
        self.authorize(user_id, actions::RECEIPT_ACCEPT, Some(receipt_id))
            .await?;

        let txn = self.db.begin().await?;
        let mut receipt = self.load(&txn, receipt_id).await?;

        if receipt.status == ReceiptStatus::InProgress && self.auto_approve_on_accept {
            if !receipt.status.can_transition(ReceiptStatus::Approved) {
                return Err(ServiceError::InvalidState(format!(
                    "Receipt {} cannot be approved from status {}",
                    receipt.receipt_number, receipt.status
                )));
            }
            receipt = self
                .repository
                .record_transition(
                    &txn,
                    &receipt,
                    ReceiptStatus::Approved,
                    Some(user_id),
                    Some("Approved on acceptance".to_string()),
                    Default::default(),
                )
                .await?;
        }

        if !receipt.status.can_transition(ReceiptStatus::Processed) {
            return Err(ServiceError::InvalidState(format!(
                "Receipt {} cannot be accepted from status {}",
                receipt.receipt_number, receipt.status
            )));
        }

        let lines = self.repository.find_line_items_in(&txn, receipt_id).await?;
        if lines.is_empty() {
            return Err(ServiceError::ValidationError(format!(
                "Receipt {} has no line items to process",
                receipt.receipt_number
            )));
        }

        let updated = self
            .repository
            .record_transition(
                &txn,
                &receipt,
                ReceiptStatus::Processed,
                Some(user_id),
                observations,
                Default::default(),
            )
            .await?;

        // Stock reconciliation: all lines or none. Any failure here
        // aborts the transaction, rolling back the status change, the
        // history entry, and every increment applied so far.
        for line in &lines {
            self.stock
                .increment_stock(&txn, line.product_id, line.received_quantity)
                .await
                .map_err(|e| {
                    error!(
                        receipt_number = %updated.receipt_number,
                        product_id = %line.product_id,
                        "stock reconciliation failed, rolling back acceptance"
                    );
                    e
                })?;
        }

        txn.commit().await?;

        info!(
            receipt_number = %updated.receipt_number,
            lines = lines.len(),
            "receipt accepted and stock reconciled"
        );
        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::ReceiptAccepted {
                    receipt_id,
                    receipt_number: updated.receipt_number.clone(),
                    line_count: lines.len(),
                })
                .await;
            for line in &lines {
                sender
                    .send_or_log(Event::StockIncremented {
                        product_id: line.product_id,
                        quantity: line.received_quantity,
                        receipt_id,
                    })
                    .await;
            }
        }

        Ok(updated)
    }

    /// Rejects a verified or approved receipt. The reason is mandatory
    /// and stored in the history entry. No stock effect.
    #[instrument(skip(self))]
    pub async fn reject(
        &self,
        receipt_id: Uuid,
        reason: String,
        user_id: Uuid,
    ) -> Result<ReceiptModel, ServiceError> {
        self.authorize(user_id, actions::RECEIPT_REJECT, Some(receipt_id))
            .await?;

        if reason.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "A rejection reason is required".into(),
            ));
        }

        let txn = self.db.begin().await?;
        let receipt = self.load(&txn, receipt_id).await?;

        if !receipt.status.can_transition(ReceiptStatus::Rejected) {
            return Err(ServiceError::InvalidState(format!(
                "Receipt {} cannot be rejected from status {}",
                receipt.receipt_number, receipt.status
            )));
        }

        let updated = self
            .repository
            .record_transition(
                &txn,
                &receipt,
                ReceiptStatus::Rejected,
                Some(user_id),
                Some(reason.clone()),
                Default::default(),
            )
            .await?;

        txn.commit().await?;

        info!(receipt_number = %updated.receipt_number, "receipt rejected");
        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::ReceiptRejected { receipt_id, reason })
                .await;
        }

        Ok(updated)
    }

    /// Voids a receipt. Legal from Pending (never verified) or Processed
    /// (administrative reversal). Stock previously applied by `accept` is
    /// NOT reversed here; that is an explicit, separate inventory
    /// adjustment.
    #[instrument(skip(self))]
    pub async fn void(
        &self,
        receipt_id: Uuid,
        reason: String,
        user_id: Uuid,
    ) -> Result<ReceiptModel, ServiceError> {
        self.authorize(user_id, actions::RECEIPT_VOID, Some(receipt_id))
            .await?;

        if reason.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "A void reason is required".into(),
            ));
        }

        let txn = self.db.begin().await?;
        let receipt = self.load(&txn, receipt_id).await?;

        if !receipt.status.can_transition(ReceiptStatus::Voided) {
            return Err(ServiceError::InvalidState(format!(
                "Receipt {} cannot be voided from status {}",
                receipt.receipt_number, receipt.status
            )));
        }

        let mut extra: goods_receipt::ActiveModel = Default::default();
        extra.voided_reason = Set(Some(reason.clone()));
        extra.voided_by = Set(Some(user_id));

        let updated = self
            .repository
            .record_transition(
                &txn,
                &receipt,
                ReceiptStatus::Voided,
                Some(user_id),
                Some(reason.clone()),
                extra,
            )
            .await?;

        txn.commit().await?;

        info!(receipt_number = %updated.receipt_number, "receipt voided");
        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::ReceiptVoided {
                    receipt_id,
                    reason,
                    voided_by: Some(user_id),
                })
                .await;
        }

        Ok(updated)
    }

    // ---- read-only queries (snapshot semantics, no engine involvement) ----

    pub async fn get_receipt(&self, receipt_id: Uuid) -> Result<Option<ReceiptModel>, ServiceError> {
        self.repository.find_by_id(receipt_id).await
    }

    pub async fn get_receipt_with_lines(
        &self,
        receipt_id: Uuid,
    ) -> Result<Option<(ReceiptModel, Vec<LineItemModel>)>, ServiceError> {
        let Some(receipt) = self.repository.find_by_id(receipt_id).await? else {
            return Ok(None);
        };
        let lines = self.repository.find_line_items(receipt_id).await?;
        Ok(Some((receipt, lines)))
    }

    pub async fn list_by_status(
        &self,
        status: ReceiptStatus,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<ReceiptModel>, u64), ServiceError> {
        self.repository.list_by_status(status, page, page_size).await
    }

    pub async fn list_by_date_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<ReceiptModel>, u64), ServiceError> {
        self.repository
            .list_by_date_range(from, to, page, page_size)
            .await
    }

    pub async fn search(
        &self,
        query: &ReceiptSearchQuery,
    ) -> Result<(Vec<ReceiptModel>, u64), ServiceError> {
        self.repository.search(query).await
    }

    pub async fn list_discrepant(&self) -> Result<Vec<ReceiptModel>, ServiceError> {
        self.repository.list_discrepant().await
    }

    pub async fn history(&self, receipt_id: Uuid) -> Result<Vec<HistoryModel>, ServiceError> {
        self.repository.history(receipt_id).await
    }

    // ---- internal helpers ----

    async fn authorize(
        &self,
        user_id: Uuid,
        action: &str,
        receipt_id: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let allowed = self.access.is_allowed(user_id, action, receipt_id).await?;
        if allowed {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(format!(
                "User {} may not perform {}",
                user_id, action
            )))
        }
    }

    async fn load(
        &self,
        txn: &DatabaseTransaction,
        receipt_id: Uuid,
    ) -> Result<ReceiptModel, ServiceError> {
        goods_receipt::Entity::find_by_id(receipt_id)
            .one(txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Receipt {} not found", receipt_id)))
    }

    async fn validate_new_receipt(&self, input: &NewReceipt) -> Result<(), ServiceError> {
        if input.supplier_id.is_nil() {
            return Err(ServiceError::ValidationError(
                "A supplier reference is required".into(),
            ));
        }
        if input.line_items.is_empty() {
            return Err(ServiceError::ValidationError(
                "A receipt requires at least one line item".into(),
            ));
        }
        for line in &input.line_items {
            self.validate_line(line)?;
        }

        if !self.master_data.supplier_exists(input.supplier_id).await? {
            return Err(ServiceError::NotFound(format!(
                "Supplier {} not found",
                input.supplier_id
            )));
        }
        if !self
            .master_data
            .supplier_is_active(input.supplier_id)
            .await?
        {
            return Err(ServiceError::ValidationError(format!(
                "Supplier {} is not active",
                input.supplier_id
            )));
        }

        for line in &input.line_items {
            if !self.master_data.product_exists(line.product_id).await? {
                return Err(ServiceError::NotFound(format!(
                    "Product {} not found",
                    line.product_id
                )));
            }
        }

        Ok(())
    }

    fn validate_line(&self, line: &NewLineItem) -> Result<(), ServiceError> {
        if line.received_quantity < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Received quantity cannot be negative".into(),
            ));
        }
        if let Some(expected) = line.expected_quantity {
            if expected < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "Expected quantity cannot be negative".into(),
                ));
            }
        }
        if line.unit_of_measure.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "A unit of measure is required".into(),
            ));
        }
        Ok(())
    }

    async fn insert_line(
        &self,
        txn: &DatabaseTransaction,
        receipt_id: Uuid,
        line: &NewLineItem,
        now: DateTime<Utc>,
    ) -> Result<LineItemModel, ServiceError> {
        let inserted = receipt_line_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            receipt_id: Set(receipt_id),
            product_id: Set(line.product_id),
            expected_quantity: Set(line.expected_quantity),
            received_quantity: Set(line.received_quantity),
            unit_of_measure: Set(line.unit_of_measure.clone()),
            observations: Set(line.observations.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(txn)
        .await?;
        Ok(inserted)
    }
}

/// Appends a discrepancy summary to existing observations, if any.
fn merge_observations(existing: Option<&str>, summary: Option<&str>) -> Option<String> {
    match (existing, summary) {
        (Some(obs), Some(sum)) => Some(format!("{}\n{}", obs, sum)),
        (None, Some(sum)) => Some(sum.to_string()),
        _ => None,
    }
}
