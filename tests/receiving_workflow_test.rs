//! Integration tests for the goods-receipt workflow engine.
//!
//! Covers the full lifecycle (create, verify, approve, accept, reject,
//! void), the status graph enforcement, the audit-trail invariant, and
//! the editing windows.

mod common;

use common::{draft, line, TestApp};
use rust_decimal_macros::dec;
use warehouse_api::errors::ServiceError;
use warehouse_api::models::ReceiptStatus;
use warehouse_api::services::receiving::{LineItemChanges, ReceiptChanges};

#[tokio::test]
async fn full_lifecycle_create_verify_approve_accept() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("Acme Logistics", true).await;
    let product = app.seed_product("SKU-100").await;

    let receipt = app
        .receiving
        .create(
            draft(supplier.id, vec![line(product.id, Some(dec!(5)), dec!(5))]),
            app.user_id,
        )
        .await
        .expect("create");

    assert_eq!(receipt.status, ReceiptStatus::Pending);
    assert!(receipt.receipt_number.starts_with("REC-"));

    let (verified, findings) = app
        .receiving
        .verify(receipt.id, None, app.user_id)
        .await
        .expect("verify");
    assert_eq!(verified.status, ReceiptStatus::InProgress);
    assert!(findings.is_empty(), "exact delivery has no discrepancies");

    let approved = app
        .receiving
        .approve(receipt.id, None, app.user_id)
        .await
        .expect("approve");
    assert_eq!(approved.status, ReceiptStatus::Approved);

    let accepted = app
        .receiving
        .accept(receipt.id, None, app.user_id)
        .await
        .expect("accept");
    assert_eq!(accepted.status, ReceiptStatus::Processed);

    // Stock reconciled exactly once
    assert_eq!(app.stock_of(product.id).await, dec!(5));

    // Audit trail: creation + three transitions, oldest first, newest
    // entry matching the persisted status
    let history = app.receiving.history(receipt.id).await.expect("history");
    assert_eq!(history.len(), 4);
    assert_eq!(history[0].previous_status, None);
    assert_eq!(history[0].new_status, ReceiptStatus::Pending);
    assert_eq!(
        history.last().unwrap().new_status,
        app.receipt(receipt.id).await.status
    );
}

#[tokio::test]
async fn receipt_numbers_are_assigned_once_and_immutable() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("Acme", true).await;
    let product = app.seed_product("SKU-1").await;

    let receipt = app
        .receiving
        .create(
            draft(supplier.id, vec![line(product.id, None, dec!(1))]),
            app.user_id,
        )
        .await
        .expect("create");
    let number = receipt.receipt_number.clone();

    app.receiving
        .update_receipt(
            receipt.id,
            ReceiptChanges {
                observations: Some("retagged".into()),
                ..Default::default()
            },
            app.user_id,
        )
        .await
        .expect("update");

    assert_eq!(app.receipt(receipt.id).await.receipt_number, number);
}

#[tokio::test]
async fn illegal_transition_is_rejected_and_status_unchanged() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("Acme", true).await;
    let product = app.seed_product("SKU-1").await;

    let receipt = app
        .receiving
        .create(
            draft(supplier.id, vec![line(product.id, None, dec!(2))]),
            app.user_id,
        )
        .await
        .expect("create");

    // Pending -> Processed is not in the graph
    let err = app
        .receiving
        .accept(receipt.id, None, app.user_id)
        .await
        .expect_err("accept from Pending must fail");
    assert!(matches!(err, ServiceError::InvalidState(_)), "{:?}", err);
    assert_eq!(app.receipt(receipt.id).await.status, ReceiptStatus::Pending);

    // Pending -> Rejected is not in the graph either
    let err = app
        .receiving
        .reject(receipt.id, "damaged".into(), app.user_id)
        .await
        .expect_err("reject from Pending must fail");
    assert!(matches!(err, ServiceError::InvalidState(_)));
    assert_eq!(app.receipt(receipt.id).await.status, ReceiptStatus::Pending);
}

#[tokio::test]
async fn line_items_cannot_be_added_after_leaving_pending() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("Acme", true).await;
    let product = app.seed_product("SKU-1").await;
    let other = app.seed_product("SKU-2").await;

    let receipt = app
        .receiving
        .create(
            draft(supplier.id, vec![line(product.id, None, dec!(2))]),
            app.user_id,
        )
        .await
        .expect("create");

    app.receiving
        .verify(receipt.id, None, app.user_id)
        .await
        .expect("verify");

    let err = app
        .receiving
        .add_line_item(receipt.id, line(other.id, None, dec!(1)), app.user_id)
        .await
        .expect_err("must refuse new lines once InProgress");
    assert!(matches!(err, ServiceError::InvalidState(_)));

    let (_, lines) = app
        .receiving
        .get_receipt_with_lines(receipt.id)
        .await
        .expect("query")
        .expect("receipt");
    assert_eq!(lines.len(), 1, "line set unchanged");
}

#[tokio::test]
async fn line_items_remain_editable_while_in_progress() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("Acme", true).await;
    let product = app.seed_product("SKU-1").await;

    let receipt = app
        .receiving
        .create(
            draft(supplier.id, vec![line(product.id, Some(dec!(4)), dec!(3))]),
            app.user_id,
        )
        .await
        .expect("create");
    app.receiving
        .verify(receipt.id, None, app.user_id)
        .await
        .expect("verify");

    let (_, lines) = app
        .receiving
        .get_receipt_with_lines(receipt.id)
        .await
        .expect("query")
        .expect("receipt");

    let updated = app
        .receiving
        .update_line_item(
            lines[0].id,
            LineItemChanges {
                received_quantity: Some(dec!(4)),
                ..Default::default()
            },
            app.user_id,
        )
        .await
        .expect("edit line while InProgress");
    assert_eq!(updated.received_quantity, dec!(4));

    // After approval the window closes
    app.receiving
        .approve(receipt.id, None, app.user_id)
        .await
        .expect("approve");
    let err = app
        .receiving
        .update_line_item(
            lines[0].id,
            LineItemChanges {
                received_quantity: Some(dec!(5)),
                ..Default::default()
            },
            app.user_id,
        )
        .await
        .expect_err("approved receipts are locked");
    assert!(matches!(err, ServiceError::InvalidState(_)));
}

#[tokio::test]
async fn verify_reports_discrepancies_and_records_them() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("Acme", true).await;
    let short = app.seed_product("SKU-SHORT").await;
    let exact = app.seed_product("SKU-EXACT").await;

    let receipt = app
        .receiving
        .create(
            draft(
                supplier.id,
                vec![
                    line(short.id, Some(dec!(10)), dec!(7)),
                    line(exact.id, Some(dec!(10)), dec!(10)),
                ],
            ),
            app.user_id,
        )
        .await
        .expect("create");

    let (verified, findings) = app
        .receiving
        .verify(receipt.id, None, app.user_id)
        .await
        .expect("verify");

    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].product_id, short.id);
    assert_eq!(findings[0].difference, dec!(-3));
    let observations = verified.observations.expect("observations recorded");
    assert!(observations.contains("expected 10, received 7"));

    // The discrepancy listing sees this receipt and only this receipt
    let discrepant = app.receiving.list_discrepant().await.expect("list");
    assert_eq!(discrepant.len(), 1);
    assert_eq!(discrepant[0].id, receipt.id);
}

#[tokio::test]
async fn reverification_is_allowed_and_audited() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("Acme", true).await;
    let product = app.seed_product("SKU-1").await;

    let receipt = app
        .receiving
        .create(
            draft(supplier.id, vec![line(product.id, Some(dec!(2)), dec!(2))]),
            app.user_id,
        )
        .await
        .expect("create");

    app.receiving
        .verify(receipt.id, None, app.user_id)
        .await
        .expect("first verify");
    let (again, _) = app
        .receiving
        .verify(receipt.id, Some("second count".into()), app.user_id)
        .await
        .expect("re-verify");
    assert_eq!(again.status, ReceiptStatus::InProgress);

    let history = app.receiving.history(receipt.id).await.expect("history");
    // creation + two verification entries
    assert_eq!(history.len(), 3);
    let last = history.last().unwrap();
    assert_eq!(last.previous_status, Some(ReceiptStatus::InProgress));
    assert_eq!(last.new_status, ReceiptStatus::InProgress);
}

#[tokio::test]
async fn reject_requires_a_reason_and_stores_it() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("Acme", true).await;
    let product = app.seed_product("SKU-1").await;

    let receipt = app
        .receiving
        .create(
            draft(supplier.id, vec![line(product.id, None, dec!(2))]),
            app.user_id,
        )
        .await
        .expect("create");
    app.receiving
        .verify(receipt.id, None, app.user_id)
        .await
        .expect("verify");

    let err = app
        .receiving
        .reject(receipt.id, "   ".into(), app.user_id)
        .await
        .expect_err("blank reason refused");
    assert!(matches!(err, ServiceError::ValidationError(_)));

    let rejected = app
        .receiving
        .reject(receipt.id, "pallet water damaged".into(), app.user_id)
        .await
        .expect("reject");
    assert_eq!(rejected.status, ReceiptStatus::Rejected);

    let history = app.receiving.history(receipt.id).await.expect("history");
    assert_eq!(
        history.last().unwrap().notes.as_deref(),
        Some("pallet water damaged")
    );
}

#[tokio::test]
async fn voided_receipt_refuses_all_further_mutations() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("Acme", true).await;
    let product = app.seed_product("SKU-1").await;

    let receipt = app
        .receiving
        .create(
            draft(supplier.id, vec![line(product.id, None, dec!(2))]),
            app.user_id,
        )
        .await
        .expect("create");

    let voided = app
        .receiving
        .void(receipt.id, "duplicate entry".into(), app.user_id)
        .await
        .expect("void from Pending");
    assert_eq!(voided.status, ReceiptStatus::Voided);
    assert_eq!(voided.voided_reason.as_deref(), Some("duplicate entry"));
    assert_eq!(voided.voided_by, Some(app.user_id));

    let verify_err = app
        .receiving
        .verify(receipt.id, None, app.user_id)
        .await
        .expect_err("verify after void");
    assert!(matches!(verify_err, ServiceError::InvalidState(_)));

    let add_err = app
        .receiving
        .add_line_item(receipt.id, line(product.id, None, dec!(1)), app.user_id)
        .await
        .expect_err("add line after void");
    assert!(matches!(add_err, ServiceError::InvalidState(_)));

    let update_err = app
        .receiving
        .update_receipt(receipt.id, ReceiptChanges::default(), app.user_id)
        .await
        .expect_err("update after void");
    assert!(matches!(update_err, ServiceError::InvalidState(_)));

    let void_err = app
        .receiving
        .void(receipt.id, "again".into(), app.user_id)
        .await
        .expect_err("void after void");
    assert!(matches!(void_err, ServiceError::InvalidState(_)));

    // Reads still work
    assert_eq!(app.receipt(receipt.id).await.status, ReceiptStatus::Voided);
}

#[tokio::test]
async fn processed_receipt_can_be_voided_without_stock_reversal() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("Acme", true).await;
    let product = app.seed_product("SKU-1").await;

    let receipt = app
        .receiving
        .create(
            draft(supplier.id, vec![line(product.id, None, dec!(6))]),
            app.user_id,
        )
        .await
        .expect("create");
    app.receiving
        .verify(receipt.id, None, app.user_id)
        .await
        .expect("verify");
    app.receiving
        .approve(receipt.id, None, app.user_id)
        .await
        .expect("approve");
    app.receiving
        .accept(receipt.id, None, app.user_id)
        .await
        .expect("accept");
    assert_eq!(app.stock_of(product.id).await, dec!(6));

    let voided = app
        .receiving
        .void(receipt.id, "booked against wrong order".into(), app.user_id)
        .await
        .expect("void from Processed");
    assert_eq!(voided.status, ReceiptStatus::Voided);

    // Stock reversal is an explicit separate adjustment, never implicit
    assert_eq!(app.stock_of(product.id).await, dec!(6));
}

#[tokio::test]
async fn verify_and_accept_read_lines_through_their_own_transaction() {
    // The harness pools exactly one connection; a line-item read that
    // went back to the pool while the engine's transaction holds that
    // connection would hang instead of completing.
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("Acme", true).await;
    let short = app.seed_product("SKU-SHORT").await;
    let exact = app.seed_product("SKU-EXACT").await;

    let receipt = app
        .receiving
        .create(
            draft(
                supplier.id,
                vec![
                    line(short.id, Some(dec!(10)), dec!(7)),
                    line(exact.id, None, dec!(4)),
                ],
            ),
            app.user_id,
        )
        .await
        .expect("create");

    let (_, findings) = app
        .receiving
        .verify(receipt.id, None, app.user_id)
        .await
        .expect("verify");
    assert_eq!(findings.len(), 1);

    app.receiving
        .approve(receipt.id, None, app.user_id)
        .await
        .expect("approve");
    let accepted = app
        .receiving
        .accept(receipt.id, None, app.user_id)
        .await
        .expect("accept");
    assert_eq!(accepted.status, ReceiptStatus::Processed);
    assert_eq!(app.stock_of(short.id).await, dec!(7));
    assert_eq!(app.stock_of(exact.id).await, dec!(4));
}

#[tokio::test]
async fn find_by_id_is_idempotent_between_mutations() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("Acme", true).await;
    let product = app.seed_product("SKU-1").await;

    let receipt = app
        .receiving
        .create(
            draft(supplier.id, vec![line(product.id, None, dec!(2))]),
            app.user_id,
        )
        .await
        .expect("create");

    let first = app.receiving.get_receipt(receipt.id).await.expect("read");
    let second = app.receiving.get_receipt(receipt.id).await.expect("read");
    assert_eq!(first, second);
}

#[tokio::test]
async fn create_validates_input_and_master_data() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("Acme", true).await;
    let dormant = app.seed_supplier("Dormant Co", false).await;
    let product = app.seed_product("SKU-1").await;

    // No line items
    let err = app
        .receiving
        .create(draft(supplier.id, vec![]), app.user_id)
        .await
        .expect_err("empty receipt");
    assert!(matches!(err, ServiceError::ValidationError(_)));

    // Unknown supplier
    let err = app
        .receiving
        .create(
            draft(uuid::Uuid::new_v4(), vec![line(product.id, None, dec!(1))]),
            app.user_id,
        )
        .await
        .expect_err("unknown supplier");
    assert!(matches!(err, ServiceError::NotFound(_)));

    // Inactive supplier
    let err = app
        .receiving
        .create(
            draft(dormant.id, vec![line(product.id, None, dec!(1))]),
            app.user_id,
        )
        .await
        .expect_err("inactive supplier");
    assert!(matches!(err, ServiceError::ValidationError(_)));

    // Unknown product
    let err = app
        .receiving
        .create(
            draft(supplier.id, vec![line(uuid::Uuid::new_v4(), None, dec!(1))]),
            app.user_id,
        )
        .await
        .expect_err("unknown product");
    assert!(matches!(err, ServiceError::NotFound(_)));

    // Negative quantity
    let err = app
        .receiving
        .create(
            draft(supplier.id, vec![line(product.id, None, dec!(-1))]),
            app.user_id,
        )
        .await
        .expect_err("negative quantity");
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn search_and_listing_filters() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("Acme", true).await;
    let other_supplier = app.seed_supplier("Globex", true).await;
    let product = app.seed_product("SKU-1").await;

    let first = app
        .receiving
        .create(
            draft(supplier.id, vec![line(product.id, None, dec!(1))]),
            app.user_id,
        )
        .await
        .expect("create");
    let second = app
        .receiving
        .create(
            draft(other_supplier.id, vec![line(product.id, None, dec!(1))]),
            app.user_id,
        )
        .await
        .expect("create");
    app.receiving
        .verify(second.id, None, app.user_id)
        .await
        .expect("verify");

    let (pending, total) = app
        .receiving
        .list_by_status(ReceiptStatus::Pending, 1, 20)
        .await
        .expect("list");
    assert_eq!(total, 1);
    assert_eq!(pending[0].id, first.id);

    let query = warehouse_api::repositories::ReceiptSearchQuery {
        supplier_id: Some(other_supplier.id),
        page: 1,
        page_size: 20,
        ..Default::default()
    };
    let (found, total) = app.receiving.search(&query).await.expect("search");
    assert_eq!(total, 1);
    assert_eq!(found[0].id, second.id);

    let query = warehouse_api::repositories::ReceiptSearchQuery {
        number_contains: Some(first.receipt_number[4..].to_string()),
        page: 1,
        page_size: 20,
        ..Default::default()
    };
    let (found, _) = app.receiving.search(&query).await.expect("search");
    assert!(found.iter().any(|r| r.id == first.id));
}
