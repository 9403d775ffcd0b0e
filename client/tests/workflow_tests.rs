//! Workflow tests against the in-process mock API
//!
//! Covers the IRR → RPQ → PO path end to end plus the guard rails around it:
//! - Read-only inventory requests once proceeded
//! - Proceed idempotence and the repair path after a failed status patch
//! - Confirmation gate and purchase order recovery
//! - Document attachment failures
//! - Cascading quotation deletion

mod support;

use chrono::Datelike;
use rust_decimal::Decimal;
use shared::{
    DocumentSlot, InventoryRequest, InventoryRequestStatus, LineItem, MissingRequirement,
    PaymentMethod, QuotationStatus, Supplier, SupplierInput, DEFAULT_UNIT,
};
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

use procurement_client::config::OrchestratorConfig;
use procurement_client::confirm::{AutoConfirm, AutoDecline};
use procurement_client::gateway::UploadFile;
use procurement_client::services::{InventoryRequestInput, LinePrice, QuotationUpdate};
use procurement_client::{AppError, Orchestrator, ProcurementEvent, Stage};

use support::{item, MockApi};

// ============================================================================
// Fixtures
// ============================================================================

struct Fixture {
    mock: MockApi,
    orchestrator: Orchestrator,
    supplier: Supplier,
}

async fn fixture() -> Fixture {
    let mock = MockApi::spawn().await;
    let supplier = mock.add_supplier("Acme Manufacturing");
    let (api, _, _) = mock.client();
    let orchestrator = Orchestrator::new(api, "Ana Buyer", OrchestratorConfig::default());
    Fixture {
        mock,
        orchestrator,
        supplier,
    }
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn year() -> i32 {
    chrono::Utc::now().year()
}

async fn create_irr(f: &Fixture) -> InventoryRequest {
    let input = InventoryRequestInput {
        supplier_id: Some(f.supplier.id),
        items: vec![item("Widget", 5), item("Gadget", 10)],
        remarks: Some("  restock  ".into()),
    };
    f.orchestrator
        .inventory_request_service()
        .create_batch(&input)
        .await
        .unwrap()
}

fn priced_update() -> QuotationUpdate {
    QuotationUpdate {
        prices: vec![
            LinePrice {
                line: 0,
                unit_price: Some(dec("2.50")),
            },
            LinePrice {
                line: 1,
                unit_price: Some(dec("2.50")),
            },
        ],
        initial_payment_percent: Some("50".into()),
        production_lead_time_days: Some(45),
        ..Default::default()
    }
}

// ============================================================================
// End to end
// ============================================================================

#[tokio::test]
async fn test_full_workflow_to_purchase_order() {
    let mut f = fixture().await;

    let irr = create_irr(&f).await;
    assert_eq!(irr.control_number, format!("IRR-{}-0001", year()));
    assert_eq!(irr.status, InventoryRequestStatus::Pending);
    assert_eq!(irr.remarks.as_deref(), Some("restock"));
    assert_eq!(irr.requestor, "Ana Buyer");

    let rpq_id = f
        .orchestrator
        .inventory_request_service()
        .proceed_to_rpq(irr.id)
        .await
        .unwrap();
    assert_eq!(f.orchestrator.process_pending_events().await.unwrap(), 1);
    assert_eq!(f.orchestrator.stage(), Stage::Rpq);
    assert_eq!(f.orchestrator.counts().pending_irr, 0);
    assert_eq!(f.orchestrator.counts().open_rpq, 1);

    let irr_after = f
        .orchestrator
        .inventory_request_service()
        .find(irr.id)
        .await
        .unwrap();
    assert_eq!(irr_after.status, InventoryRequestStatus::ProceededToRpq);

    let quotations = f.orchestrator.quotation_service();
    let draft = quotations.get(rpq_id).await.unwrap();
    assert_eq!(draft.status, QuotationStatus::Draft);
    assert_eq!(draft.control_number, format!("RPQ-{}-0001", year()));
    assert_eq!(draft.inventory_request_id, irr.id);
    assert_eq!(draft.supplier.name, "Acme Manufacturing");
    assert_eq!(draft.supplier.address.as_deref(), Some("1 Harbour Rd, Shenzhen, China"));
    assert_eq!(draft.items.len(), 2);
    assert!(draft.items.iter().all(|i| i.unit_price.is_none()));

    let update = QuotationUpdate {
        production_lead_time_days: None,
        ..priced_update()
    };
    let saved = quotations.update(rpq_id, &update).await.unwrap();
    assert_eq!(saved.status, QuotationStatus::Pending);
    assert_eq!(saved.grand_total(), dec("37.50"));
    assert_eq!(saved.initial_payment_amount, Some(dec("18.75")));
    assert_eq!(saved.final_payment_amount, Some(dec("18.75")));
    assert_eq!(saved.final_payment_percent, Some(dec("50")));

    match quotations.confirm(rpq_id).await {
        Err(AppError::ConfirmationBlocked { missing }) => {
            assert_eq!(missing, vec![MissingRequirement::ProductionLeadTime]);
        }
        other => panic!("expected blocked confirmation, got {:?}", other),
    }

    let lead_time = QuotationUpdate {
        production_lead_time_days: Some(45),
        ..Default::default()
    };
    quotations.update(rpq_id, &lead_time).await.unwrap();

    let order = quotations.confirm(rpq_id).await.unwrap();
    assert_eq!(order.po_number.as_deref(), Some("PO-0001"));
    assert_eq!(
        quotations.get(rpq_id).await.unwrap().status,
        QuotationStatus::Confirmed
    );

    f.orchestrator.process_pending_events().await.unwrap();
    let counts = f.orchestrator.counts();
    assert_eq!(counts.open_rpq, 0);
    assert_eq!(counts.pending_orders, 1);
    assert_eq!(counts.pending_payments, 1);
}

#[tokio::test]
async fn test_control_numbers_increment() {
    let f = fixture().await;
    let first = create_irr(&f).await;
    let second = create_irr(&f).await;
    assert_eq!(first.control_number, format!("IRR-{}-0001", year()));
    assert_eq!(second.control_number, format!("IRR-{}-0002", year()));
}

#[tokio::test]
async fn test_create_rejects_invalid_input_before_any_call() {
    let f = fixture().await;
    let service = f.orchestrator.inventory_request_service();

    let no_supplier = InventoryRequestInput {
        supplier_id: None,
        items: vec![item("Widget", 1)],
        remarks: None,
    };
    assert!(matches!(
        service.create_batch(&no_supplier).await,
        Err(AppError::Validation { .. })
    ));

    let zero_qty = InventoryRequestInput {
        supplier_id: Some(f.supplier.id),
        items: vec![item("Widget", 0)],
        remarks: None,
    };
    assert!(service.create_batch(&zero_qty).await.is_err());

    assert!(f.mock.data().requests.is_empty());
}

fn same_identity(actual: &LineItem, expected: &LineItem) {
    assert_eq!(actual.product_id, expected.product_id);
    assert_eq!(actual.variation_id, expected.variation_id);
    assert_eq!(actual.product_name, expected.product_name);
    assert_eq!(actual.sku, expected.sku);
    assert_eq!(actual.upc, expected.upc);
    assert_eq!(actual.variation_label, expected.variation_label);
    assert_eq!(actual.quantity, expected.quantity);
    assert_eq!(actual.unit, DEFAULT_UNIT);
}

#[tokio::test]
async fn test_submitted_items_come_back_unchanged() {
    let f = fixture().await;
    let variant = item("Widget", 5)
        .with_variation(Uuid::new_v4(), "Red / XL")
        .with_codes(Some("W-RED-XL".into()), Some("012345678905".into()));
    let mut boxed = item("Gadget", 12).with_codes(Some("G-100".into()), None);
    boxed.unit = "BOX".into();
    let submitted = vec![variant, boxed];

    let service = f.orchestrator.inventory_request_service();
    let created = service
        .create_batch(&InventoryRequestInput {
            supplier_id: Some(f.supplier.id),
            items: submitted.clone(),
            remarks: None,
        })
        .await
        .unwrap();

    let stored = service.find(created.id).await.unwrap();
    assert_eq!(stored.items.len(), submitted.len());
    for (actual, expected) in stored.items.iter().zip(&submitted) {
        same_identity(actual, expected);
    }

    let rpq_id = service.proceed_to_rpq(created.id).await.unwrap();
    let quotation = f.orchestrator.quotation_service().get(rpq_id).await.unwrap();
    assert_eq!(quotation.items.len(), submitted.len());
    for (actual, expected) in quotation.items.iter().zip(&submitted) {
        same_identity(actual, expected);
        assert_eq!(actual.unit_price, None);
        assert_eq!(actual.total_amount, None);
    }
}

// ============================================================================
// Inventory request immutability and proceed
// ============================================================================

#[tokio::test]
async fn test_proceeded_request_is_read_only() {
    let f = fixture().await;
    let service = f.orchestrator.inventory_request_service();
    let irr = create_irr(&f).await;

    let edit = InventoryRequestInput {
        supplier_id: Some(f.supplier.id),
        items: vec![item("Widget", 7)],
        remarks: None,
    };
    let edited = service.update(irr.id, &edit).await.unwrap();
    assert_eq!(edited.items[0].quantity, 7);

    service.proceed_to_rpq(irr.id).await.unwrap();

    assert!(matches!(
        service.update(irr.id, &edit).await,
        Err(AppError::InvalidStateTransition(_))
    ));
    assert!(matches!(
        service.delete(irr.id, &AutoConfirm).await,
        Err(AppError::InvalidStateTransition(_))
    ));
    assert_eq!(f.mock.data().count("PUT /inventory-requests"), 1);
    assert_eq!(f.mock.data().count("DELETE"), 0);
}

#[tokio::test]
async fn test_proceed_twice_is_rejected() {
    let f = fixture().await;
    let service = f.orchestrator.inventory_request_service();
    let irr = create_irr(&f).await;

    service.proceed_to_rpq(irr.id).await.unwrap();
    assert!(matches!(
        service.proceed_to_rpq(irr.id).await,
        Err(AppError::InvalidStateTransition(_))
    ));
    assert_eq!(f.mock.data().quotations.len(), 1);
}

#[tokio::test]
async fn test_failed_status_patch_reuses_quotation_on_retry() {
    let f = fixture().await;
    let service = f.orchestrator.inventory_request_service();
    let irr = create_irr(&f).await;

    f.mock.data().fail_irr_patch = true;
    let rpq_id = match service.proceed_to_rpq(irr.id).await {
        Err(AppError::ProceedIncomplete { rpq_id, .. }) => rpq_id,
        other => panic!("expected incomplete proceed, got {:?}", other),
    };
    assert_eq!(
        service.find(irr.id).await.unwrap().status,
        InventoryRequestStatus::Pending
    );

    f.mock.data().fail_irr_patch = false;
    assert_eq!(service.proceed_to_rpq(irr.id).await.unwrap(), rpq_id);
    assert_eq!(f.mock.data().quotations.len(), 1);
    assert_eq!(
        service.find(irr.id).await.unwrap().status,
        InventoryRequestStatus::ProceededToRpq
    );
}

#[tokio::test]
async fn test_declined_delete_keeps_request() {
    let f = fixture().await;
    let service = f.orchestrator.inventory_request_service();
    let irr = create_irr(&f).await;

    assert!(matches!(
        service.delete(irr.id, &AutoDecline).await,
        Err(AppError::Cancelled)
    ));
    assert_eq!(f.mock.data().inventory_requests.len(), 1);

    service.delete(irr.id, &AutoConfirm).await.unwrap();
    assert!(f.mock.data().inventory_requests.is_empty());
}

// ============================================================================
// Quotations
// ============================================================================

#[tokio::test]
async fn test_confirmation_lists_every_gap() {
    let f = fixture().await;
    let irr = create_irr(&f).await;
    let rpq_id = f
        .orchestrator
        .inventory_request_service()
        .proceed_to_rpq(irr.id)
        .await
        .unwrap();

    match f.orchestrator.quotation_service().confirm(rpq_id).await {
        Err(AppError::ConfirmationBlocked { missing }) => {
            assert_eq!(missing.len(), 5);
            assert!(matches!(missing[0], MissingRequirement::UnitPrice { line: 1, .. }));
            assert!(matches!(missing[1], MissingRequirement::UnitPrice { line: 2, .. }));
            assert!(missing.contains(&MissingRequirement::InitialPaymentPercent));
            assert!(missing.contains(&MissingRequirement::FinalPaymentPercent));
            assert!(missing.contains(&MissingRequirement::ProductionLeadTime));
        }
        other => panic!("expected blocked confirmation, got {:?}", other),
    }
    assert_eq!(f.mock.data().count("PATCH /quotation-requests"), 0);
    assert_eq!(f.mock.data().count("POST /purchase-orders"), 0);
}

#[tokio::test]
async fn test_full_initial_payment_blocks_confirmation() {
    let f = fixture().await;
    let irr = create_irr(&f).await;
    let rpq_id = f
        .orchestrator
        .inventory_request_service()
        .proceed_to_rpq(irr.id)
        .await
        .unwrap();

    let update = QuotationUpdate {
        initial_payment_percent: Some("150".into()),
        ..priced_update()
    };
    let saved = f.orchestrator.quotation_service().update(rpq_id, &update).await.unwrap();
    assert_eq!(saved.initial_payment_percent, Some(dec("100")));
    assert_eq!(saved.final_payment_percent, Some(Decimal::ZERO));

    assert!(matches!(
        f.orchestrator.quotation_service().confirm(rpq_id).await,
        Err(AppError::ConfirmationBlocked { .. })
    ));
}

#[tokio::test]
async fn test_confirmed_quotation_is_frozen() {
    let f = fixture().await;
    let irr = create_irr(&f).await;
    let quotations = f.orchestrator.quotation_service();
    let rpq_id = f
        .orchestrator
        .inventory_request_service()
        .proceed_to_rpq(irr.id)
        .await
        .unwrap();
    quotations.update(rpq_id, &priced_update()).await.unwrap();
    quotations.confirm(rpq_id).await.unwrap();

    assert!(matches!(
        quotations.update(rpq_id, &priced_update()).await,
        Err(AppError::InvalidStateTransition(_))
    ));
    assert!(matches!(
        quotations.confirm(rpq_id).await,
        Err(AppError::InvalidStateTransition(_))
    ));
    assert!(matches!(
        quotations.delete(rpq_id, &AutoConfirm).await,
        Err(AppError::InvalidStateTransition(_))
    ));
}

#[tokio::test]
async fn test_purchase_order_failure_keeps_confirmation_and_recovers() {
    let f = fixture().await;
    let irr = create_irr(&f).await;
    let quotations = f.orchestrator.quotation_service();
    let rpq_id = f
        .orchestrator
        .inventory_request_service()
        .proceed_to_rpq(irr.id)
        .await
        .unwrap();
    quotations.update(rpq_id, &priced_update()).await.unwrap();

    let mut events = f.orchestrator.events().subscribe();
    f.mock.data().fail_po_create = true;
    match quotations.confirm(rpq_id).await {
        Err(AppError::PurchaseOrderNotCreated { rpq_id: failed, .. }) => assert_eq!(failed, rpq_id),
        other => panic!("expected purchase order failure, got {:?}", other),
    }
    assert_eq!(
        events.recv().await.unwrap(),
        ProcurementEvent::QuotationConfirmed {
            rpq_id,
            purchase_order_id: None
        }
    );

    let confirmed = quotations.get(rpq_id).await.unwrap();
    assert_eq!(confirmed.status, QuotationStatus::Confirmed);
    assert!(f.mock.data().purchase_orders.is_empty());

    f.mock.data().fail_po_create = false;
    let po_service = f.orchestrator.purchase_order_service();
    let created = po_service.retry_from_quotation(&confirmed).await.unwrap();
    let again = po_service.retry_from_quotation(&confirmed).await.unwrap();
    assert_eq!(created.id, again.id);
    assert_eq!(f.mock.data().purchase_orders.len(), 1);
}

#[tokio::test]
async fn test_retry_requires_confirmed_quotation() {
    let f = fixture().await;
    let irr = create_irr(&f).await;
    let rpq_id = f
        .orchestrator
        .inventory_request_service()
        .proceed_to_rpq(irr.id)
        .await
        .unwrap();
    let draft = f.orchestrator.quotation_service().get(rpq_id).await.unwrap();

    assert!(matches!(
        f.orchestrator
            .purchase_order_service()
            .retry_from_quotation(&draft)
            .await,
        Err(AppError::InvalidStateTransition(_))
    ));
}

#[tokio::test]
async fn test_delete_quotation_removes_request() {
    let mut f = fixture().await;
    let irr = create_irr(&f).await;
    let rpq_id = f
        .orchestrator
        .inventory_request_service()
        .proceed_to_rpq(irr.id)
        .await
        .unwrap();
    f.orchestrator.process_pending_events().await.unwrap();

    let quotations = f.orchestrator.quotation_service().clone();
    assert!(matches!(
        quotations.delete(rpq_id, &AutoDecline).await,
        Err(AppError::Cancelled)
    ));
    assert_eq!(f.mock.data().quotations.len(), 1);

    quotations.delete(rpq_id, &AutoConfirm).await.unwrap();
    assert_eq!(f.mock.data().count("DELETE /quotation-requests"), 1);
    assert!(f.mock.data().quotations.is_empty());
    assert!(f.mock.data().inventory_requests.is_empty());

    f.orchestrator.process_pending_events().await.unwrap();
    assert!(f.orchestrator.quotations().is_empty());
    assert!(f.orchestrator.inventory_requests().is_empty());
}

// ============================================================================
// Documents
// ============================================================================

#[tokio::test]
async fn test_document_upload_and_link_failure() {
    let f = fixture().await;
    let irr = create_irr(&f).await;
    let quotations = f.orchestrator.quotation_service();
    let rpq_id = f
        .orchestrator
        .inventory_request_service()
        .proceed_to_rpq(irr.id)
        .await
        .unwrap();

    let first = quotations
        .upload_document(
            rpq_id,
            DocumentSlot::PackingList,
            UploadFile::new("packing.pdf", "application/pdf", b"%PDF-1.4".to_vec()),
        )
        .await
        .unwrap();
    assert_eq!(f.mock.data().count("POST /upload/document"), 1);

    f.mock.data().fail_rpq_patch = true;
    match quotations
        .upload_document(
            rpq_id,
            DocumentSlot::PackingList,
            UploadFile::new("packing-v2.png", "image/png", vec![0x89, 0x50]),
        )
        .await
    {
        Err(AppError::DocumentNotLinked { slot, uploaded, .. }) => {
            assert_eq!(slot, DocumentSlot::PackingList);
            assert!(uploaded.url.ends_with("packing-v2.png"));
        }
        other => panic!("expected unlinked document, got {:?}", other),
    }
    assert_eq!(f.mock.data().count("POST /upload/image"), 1);

    f.mock.data().fail_rpq_patch = false;
    let current = quotations.get(rpq_id).await.unwrap();
    assert_eq!(current.documents.get(DocumentSlot::PackingList), Some(&first));

    quotations
        .remove_document(rpq_id, DocumentSlot::PackingList, &AutoConfirm)
        .await
        .unwrap();
    let cleared = quotations.get(rpq_id).await.unwrap();
    assert!(cleared.documents.get(DocumentSlot::PackingList).is_none());
}

// ============================================================================
// Suppliers
// ============================================================================

#[tokio::test]
async fn test_supplier_edit_does_not_touch_existing_quotation() {
    let f = fixture().await;
    let irr = create_irr(&f).await;
    let rpq_id = f
        .orchestrator
        .inventory_request_service()
        .proceed_to_rpq(irr.id)
        .await
        .unwrap();

    let input = SupplierInput {
        name: "Acme Renamed".into(),
        payment_method: PaymentMethod::Other,
        ..Default::default()
    };
    let updated = f
        .orchestrator
        .supplier_service()
        .update(f.supplier.id, &input)
        .await
        .unwrap();
    assert_eq!(updated.name, "Acme Renamed");

    let quotation = f.orchestrator.quotation_service().get(rpq_id).await.unwrap();
    assert_eq!(quotation.supplier.name, "Acme Manufacturing");
}

#[tokio::test]
async fn test_supplier_validation() {
    let f = fixture().await;
    let input = SupplierInput {
        name: String::new(),
        email: Some("not-an-email".into()),
        ..Default::default()
    };
    assert!(matches!(
        f.orchestrator.supplier_service().create(&input).await,
        Err(AppError::ValidationErrors(_))
    ));
    assert_eq!(f.mock.data().count("POST /suppliers"), 0);

    let missing = f.orchestrator.supplier_service().get(Uuid::new_v4()).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}

// ============================================================================
// Orchestrator
// ============================================================================

#[tokio::test]
async fn test_purchase_order_counts_polled_only_on_po_stage() {
    let mock = MockApi::spawn().await;
    let (api, _, _) = mock.client();
    let mut orchestrator = Orchestrator::new(
        api,
        "Ana Buyer",
        OrchestratorConfig {
            po_poll_interval_secs: 1,
        },
    );

    orchestrator
        .run(tokio::time::sleep(Duration::from_millis(1500)))
        .await;
    assert_eq!(mock.data().count("GET /purchase-orders"), 0);

    orchestrator.select_stage(Stage::Po);
    orchestrator
        .run(tokio::time::sleep(Duration::from_millis(1500)))
        .await;
    // Immediate first tick plus one after the interval
    assert_eq!(mock.data().count("GET /purchase-orders"), 2);
    assert_eq!(orchestrator.counts().pending_orders, 0);

    orchestrator.select_stage(Stage::Irr);
    orchestrator
        .run(tokio::time::sleep(Duration::from_millis(1500)))
        .await;
    assert_eq!(mock.data().count("GET /purchase-orders"), 2);
}
