use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::receipt_line_item;

/// A single expected-vs-received mismatch on a receipt line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscrepancyFinding {
    pub line_item_id: Uuid,
    pub product_id: Uuid,
    pub expected_quantity: Decimal,
    pub received_quantity: Decimal,
    /// Signed difference: received - expected.
    pub difference: Decimal,
}

/// Compares expected vs. received quantities for every line that carries
/// an expectation. Pure and deterministic; findings follow line order.
pub fn analyze(lines: &[receipt_line_item::Model]) -> Vec<DiscrepancyFinding> {
    lines
        .iter()
        .filter_map(|line| {
            let expected = line.expected_quantity?;
            if expected == line.received_quantity {
                return None;
            }
            Some(DiscrepancyFinding {
                line_item_id: line.id,
                product_id: line.product_id,
                expected_quantity: expected,
                received_quantity: line.received_quantity,
                difference: line.received_quantity - expected,
            })
        })
        .collect()
}

/// Renders findings into a human-readable note for the receipt's
/// observations field. Returns `None` when there is nothing to report.
pub fn summarize(findings: &[DiscrepancyFinding]) -> Option<String> {
    if findings.is_empty() {
        return None;
    }
    let lines: Vec<String> = findings
        .iter()
        .map(|f| {
            format!(
                "product {}: expected {}, received {} (difference {})",
                f.product_id, f.expected_quantity, f.received_quantity, f.difference
            )
        })
        .collect();
    Some(format!("Discrepancies found: {}", lines.join("; ")))
}
