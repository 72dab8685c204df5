use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::goods_receipt::{self, Entity as Receipt, ReceiptStatus};
use crate::models::receipt_line_item::{self, Entity as LineItem};

/// Receipt count for one status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: ReceiptStatus,
    pub count: u64,
}

/// Units received for one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductUnits {
    pub product_id: Uuid,
    pub units: Decimal,
}

/// Aggregated receiving figures for a date window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceivingStatistics {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub total_receipts: u64,
    pub counts_by_status: Vec<StatusCount>,
    /// Units across receipts that stood (voided and rejected excluded).
    pub total_units_received: Decimal,
    pub units_by_product: Vec<ProductUnits>,
    /// Discrepant receipts over receipts with any expected quantity.
    pub discrepancy_rate: f64,
    pub discrepant_receipts: u64,
}

/// Read-only aggregation over persisted receipts. Snapshot semantics:
/// not transactional with the workflow engine and may trail in-flight
/// operations by a moment.
#[derive(Clone)]
pub struct ReceivingStatsService {
    db: Arc<DatabaseConnection>,
}

impl ReceivingStatsService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn statistics(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<ReceivingStatistics, ServiceError> {
        let db = &*self.db;

        let receipts = Receipt::find()
            .filter(goods_receipt::Column::CreatedAt.gte(from))
            .filter(goods_receipt::Column::CreatedAt.lte(to))
            .all(db)
            .await?;

        let mut counts: BTreeMap<String, (ReceiptStatus, u64)> = BTreeMap::new();
        for receipt in &receipts {
            counts
                .entry(receipt.status.to_string())
                .or_insert((receipt.status, 0))
                .1 += 1;
        }
        let counts_by_status = counts
            .into_values()
            .map(|(status, count)| StatusCount { status, count })
            .collect();

        let receipt_ids: Vec<Uuid> = receipts.iter().map(|r| r.id).collect();
        let lines = if receipt_ids.is_empty() {
            Vec::new()
        } else {
            LineItem::find()
                .filter(receipt_line_item::Column::ReceiptId.is_in(receipt_ids))
                .all(db)
                .await?
        };

        // Voided and rejected receipts did not stand; their units do not
        // count toward received totals.
        let counted: BTreeMap<Uuid, bool> = receipts
            .iter()
            .map(|r| {
                (
                    r.id,
                    !matches!(r.status, ReceiptStatus::Voided | ReceiptStatus::Rejected),
                )
            })
            .collect();

        let mut total_units = Decimal::ZERO;
        let mut per_product: BTreeMap<Uuid, Decimal> = BTreeMap::new();
        let mut expected_receipts: BTreeMap<Uuid, bool> = BTreeMap::new();

        for line in &lines {
            if counted.get(&line.receipt_id).copied().unwrap_or(false) {
                total_units += line.received_quantity;
                *per_product.entry(line.product_id).or_insert(Decimal::ZERO) +=
                    line.received_quantity;
            }
            if line.expected_quantity.is_some() {
                let entry = expected_receipts.entry(line.receipt_id).or_insert(false);
                *entry = *entry || line.is_discrepant();
            }
        }

        let with_expectations = expected_receipts.len() as u64;
        let discrepant_receipts = expected_receipts.values().filter(|d| **d).count() as u64;
        let discrepancy_rate = if with_expectations == 0 {
            0.0
        } else {
            discrepant_receipts as f64 / with_expectations as f64
        };

        Ok(ReceivingStatistics {
            from,
            to,
            total_receipts: receipts.len() as u64,
            counts_by_status,
            total_units_received: total_units,
            units_by_product: per_product
                .into_iter()
                .map(|(product_id, units)| ProductUnits { product_id, units })
                .collect(),
            discrepancy_rate,
            discrepant_receipts,
        })
    }
}
