//! Inventory request (IRR) service
//!
//! An IRR is editable and deletable only while `PENDING`. Proceeding creates
//! the draft quotation and flips the IRR to `PROCEEDED_TO_RPQ`, after which it
//! is read-only here.

use serde_json::json;
use shared::control_number::{generate_control_number, IRR_PREFIX, RPQ_PREFIX};
use shared::validation::{validate_line_items, validate_supplier_selected};
use shared::{
    InventoryRequest, InventoryRequestChanges, InventoryRequestStatus, LineItem,
    NewInventoryRequest, NewQuotationRequest, QuotationRequest, DEFAULT_UNIT,
};
use tracing::{info, warn};
use uuid::Uuid;

use super::paths::{INVENTORY_REQUESTS, INVENTORY_REQUEST_BATCH, QUOTATION_REQUESTS};
use super::{current_year, SupplierService};
use crate::confirm::{require_confirmation, ConfirmPrompt, Confirmer};
use crate::error::{AppError, AppResult, ErrorKind};
use crate::events::{EventBus, ProcurementEvent};
use crate::gateway::ApiClient;

/// Form input for creating or editing an inventory request
#[derive(Debug, Clone, Default)]
pub struct InventoryRequestInput {
    pub supplier_id: Option<Uuid>,
    pub items: Vec<LineItem>,
    pub remarks: Option<String>,
}

impl InventoryRequestInput {
    fn validate(&self) -> AppResult<Uuid> {
        let supplier_id = validate_supplier_selected(self.supplier_id)
            .map_err(|msg| AppError::validation("supplier_id", msg))?;
        validate_line_items(&self.items).map_err(|msg| AppError::validation("items", msg))?;
        Ok(supplier_id)
    }

    /// Items as submitted; every request line is counted in pieces
    fn items(&self) -> Vec<LineItem> {
        self.items
            .iter()
            .map(|item| LineItem {
                unit: DEFAULT_UNIT.to_string(),
                ..item.clone()
            })
            .collect()
    }

    fn remarks(&self) -> Option<String> {
        self.remarks
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string)
    }
}

/// Inventory request service
#[derive(Clone)]
pub struct InventoryRequestService {
    api: ApiClient,
    events: EventBus,
    requestor: String,
}

impl InventoryRequestService {
    pub fn new(api: ApiClient, events: EventBus, requestor: impl Into<String>) -> Self {
        Self {
            api,
            events,
            requestor: requestor.into(),
        }
    }

    pub async fn list(&self) -> AppResult<Vec<InventoryRequest>> {
        self.api.get(INVENTORY_REQUESTS).await.json()
    }

    /// The API has no single-item read; look the request up in the collection
    pub async fn find(&self, id: Uuid) -> AppResult<InventoryRequest> {
        self.list()
            .await?
            .into_iter()
            .find(|request| request.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Inventory request {}", id)))
    }

    pub async fn create_batch(&self, input: &InventoryRequestInput) -> AppResult<InventoryRequest> {
        let supplier_id = input.validate()?;

        let existing = self.list().await?;
        let control_number = generate_control_number(
            IRR_PREFIX,
            current_year(),
            existing.iter().map(|r| r.control_number.as_str()),
        );

        let payload = NewInventoryRequest {
            control_number,
            requestor: self.requestor.clone(),
            supplier_id,
            items: input.items(),
            remarks: input.remarks(),
            status: InventoryRequestStatus::Pending,
        };

        let created: InventoryRequest = self.api.post(INVENTORY_REQUEST_BATCH, &payload).await.json()?;
        info!(
            irr_id = %created.id,
            control_number = %created.control_number,
            items = created.items.len(),
            "Inventory request created"
        );
        Ok(created)
    }

    pub async fn update(&self, id: Uuid, input: &InventoryRequestInput) -> AppResult<InventoryRequest> {
        let supplier_id = input.validate()?;

        let current = self.find(id).await?;
        if !current.is_editable() {
            return Err(AppError::InvalidStateTransition(format!(
                "{} has already proceeded to RPQ and can no longer be edited",
                current.control_number
            )));
        }

        let changes = InventoryRequestChanges {
            supplier_id,
            items: input.items(),
            remarks: input.remarks(),
        };
        let updated: InventoryRequest = self
            .api
            .put(&format!("{}/{}", INVENTORY_REQUESTS, id), &changes)
            .await
            .json()?;
        info!(irr_id = %id, "Inventory request updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: Uuid, confirmer: &dyn Confirmer) -> AppResult<()> {
        let current = self.find(id).await?;
        if !current.is_deletable() {
            return Err(AppError::InvalidStateTransition(format!(
                "{} has already proceeded to RPQ and can no longer be deleted",
                current.control_number
            )));
        }

        let prompt = ConfirmPrompt::new(
            "Delete inventory request",
            format!(
                "Delete {} ({} item(s))?",
                current.control_number,
                current.items.len()
            ),
        );
        require_confirmation(confirmer, &prompt)?;

        self.api
            .delete(&format!("{}/{}", INVENTORY_REQUESTS, id))
            .await
            .into_result()?;
        info!(irr_id = %id, control_number = %current.control_number, "Inventory request deleted");
        Ok(())
    }

    /// Create the draft quotation for a pending request and mark it proceeded
    ///
    /// Returns the quotation id. A quotation left behind by an earlier attempt
    /// whose status patch failed is reused instead of duplicated.
    pub async fn proceed_to_rpq(&self, id: Uuid) -> AppResult<Uuid> {
        let request = self.find(id).await?;
        if !request.can_proceed() {
            return Err(AppError::InvalidStateTransition(format!(
                "{} has already proceeded to RPQ",
                request.control_number
            )));
        }

        let quotations: Vec<QuotationRequest> = self.api.get(QUOTATION_REQUESTS).await.json()?;

        let rpq_id = match quotations.iter().find(|q| q.inventory_request_id == id) {
            Some(existing) => {
                warn!(
                    irr_id = %id,
                    rpq_id = %existing.id,
                    "Reusing quotation from an incomplete proceed"
                );
                existing.id
            }
            None => {
                let snapshot = SupplierService::new(self.api.clone())
                    .snapshot(request.supplier_id)
                    .await?;
                let control_number = generate_control_number(
                    RPQ_PREFIX,
                    current_year(),
                    quotations.iter().map(|q| q.control_number.as_str()),
                );
                let payload = NewQuotationRequest::from_inventory_request(
                    &request,
                    control_number,
                    snapshot,
                    self.requestor.clone(),
                );
                let created: QuotationRequest =
                    self.api.post(QUOTATION_REQUESTS, &payload).await.json()?;
                info!(
                    irr_id = %id,
                    rpq_id = %created.id,
                    control_number = %created.control_number,
                    "Quotation created"
                );
                created.id
            }
        };

        let status = json!({ "status": InventoryRequestStatus::ProceededToRpq });
        if let Err(e) = self
            .api
            .patch(&format!("{}/{}", INVENTORY_REQUESTS, id), &status)
            .await
            .into_result()
        {
            if e.kind() == ErrorKind::Session {
                return Err(e);
            }
            warn!(irr_id = %id, rpq_id = %rpq_id, "Failed to mark inventory request as proceeded: {}", e);
            return Err(AppError::ProceedIncomplete {
                rpq_id,
                reason: e.to_string(),
            });
        }

        info!(irr_id = %id, rpq_id = %rpq_id, "Inventory request proceeded to RPQ");
        self.events.publish(ProcurementEvent::IrrProceededToRpq { irr_id: id, rpq_id });
        Ok(rpq_id)
    }
}
