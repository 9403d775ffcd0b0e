//! Product quotation (RPQ) service
//!
//! A quotation accepts edits while `DRAFT` or `PENDING`; `CONFIRMED` is
//! terminal. Confirmation is gated on [`QuotationRequest::confirmation_gaps`]
//! and hands over to purchase order creation.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use shared::types::parse_percent_input;
use shared::validation::{
    validate_lead_time, validate_minimum_order_quantity, validate_payment_percentages,
    validate_unit_price,
};
use shared::{
    CreatedPurchaseOrder, DocumentRef, DocumentSlot, QuotationRequest, QuotationStatus,
};
use tracing::{info, warn};
use uuid::Uuid;

use super::paths::{QUOTATION_REQUESTS, UPLOAD_DOCUMENT, UPLOAD_IMAGE};
use super::PurchaseOrderService;
use crate::confirm::{require_confirmation, ConfirmPrompt, Confirmer};
use crate::error::{AppError, AppResult};
use crate::events::{EventBus, ProcurementEvent};
use crate::gateway::{ApiClient, UploadFile};

/// New unit price for one line (0-based index)
#[derive(Debug, Clone, PartialEq)]
pub struct LinePrice {
    pub line: usize,
    /// `None` clears the price
    pub unit_price: Option<Decimal>,
}

/// New quantity for one line (0-based index)
#[derive(Debug, Clone, PartialEq)]
pub struct LineQuantity {
    pub line: usize,
    pub quantity: i32,
}

/// Edits to a quotation; `None` leaves a field unchanged
#[derive(Debug, Clone, Default)]
pub struct QuotationUpdate {
    pub prices: Vec<LinePrice>,
    pub quantities: Vec<LineQuantity>,
    pub minimum_order_quantity: Option<i32>,
    /// Raw user entry; blank or unparsable clears the split
    pub initial_payment_percent: Option<String>,
    pub production_lead_time_days: Option<i32>,
    pub production_remarks: Option<String>,
}

impl QuotationUpdate {
    fn touches_payment(&self) -> bool {
        self.initial_payment_percent.is_some()
    }

    fn validate(&self, line_count: usize) -> AppResult<()> {
        for price in &self.prices {
            if price.line >= line_count {
                return Err(AppError::validation(
                    "items",
                    format!("Line {} does not exist", price.line + 1),
                ));
            }
            if let Some(unit_price) = price.unit_price {
                validate_unit_price(unit_price)
                    .map_err(|msg| AppError::validation("unit_price", msg))?;
            }
        }
        for quantity in &self.quantities {
            if quantity.line >= line_count {
                return Err(AppError::validation(
                    "items",
                    format!("Line {} does not exist", quantity.line + 1),
                ));
            }
            if quantity.quantity <= 0 {
                return Err(AppError::validation("quantity", "Quantity must be greater than 0"));
            }
        }
        if let Some(moq) = self.minimum_order_quantity {
            validate_minimum_order_quantity(moq)
                .map_err(|msg| AppError::validation("minimum_order_quantity", msg))?;
        }
        if let Some(days) = self.production_lead_time_days {
            validate_lead_time(days)
                .map_err(|msg| AppError::validation("production_lead_time_days", msg))?;
        }
        Ok(())
    }

    /// Merge into `quotation` and recompute every derived amount
    fn apply(&self, quotation: &mut QuotationRequest) {
        for price in &self.prices {
            if let Some(item) = quotation.items.get_mut(price.line) {
                item.set_unit_price(price.unit_price);
            }
        }
        for quantity in &self.quantities {
            if let Some(item) = quotation.items.get_mut(quantity.line) {
                item.set_quantity(quantity.quantity);
            }
        }
        if let Some(moq) = self.minimum_order_quantity {
            quotation.minimum_order_quantity = Some(moq);
        }
        if let Some(days) = self.production_lead_time_days {
            quotation.production_lead_time_days = Some(days);
        }
        if let Some(remarks) = &self.production_remarks {
            let remarks = remarks.trim();
            quotation.production_remarks = (!remarks.is_empty()).then(|| remarks.to_string());
        }

        quotation.recompute_totals();
        if let Some(raw) = &self.initial_payment_percent {
            quotation.set_initial_payment_percent(parse_percent_input(raw));
        }

        if quotation.status == QuotationStatus::Draft {
            quotation.status = QuotationStatus::Pending;
        }
    }
}

/// Upload endpoint response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadedFile {
    url: String,
}

/// Product quotation service
#[derive(Clone)]
pub struct QuotationService {
    api: ApiClient,
    events: EventBus,
}

impl QuotationService {
    pub fn new(api: ApiClient, events: EventBus) -> Self {
        Self { api, events }
    }

    fn path(id: Uuid) -> String {
        format!("{}/{}", QUOTATION_REQUESTS, id)
    }

    pub async fn list(&self) -> AppResult<Vec<QuotationRequest>> {
        self.api.get(QUOTATION_REQUESTS).await.json()
    }

    pub async fn get(&self, id: Uuid) -> AppResult<QuotationRequest> {
        self.api.get(&Self::path(id)).await.json()
    }

    fn ensure_editable(quotation: &QuotationRequest) -> AppResult<()> {
        if quotation.is_editable() {
            Ok(())
        } else {
            Err(AppError::InvalidStateTransition(format!(
                "{} is confirmed and can no longer be changed",
                quotation.control_number
            )))
        }
    }

    pub async fn update(&self, id: Uuid, update: &QuotationUpdate) -> AppResult<QuotationRequest> {
        let mut quotation = self.get(id).await?;
        Self::ensure_editable(&quotation)?;
        update.validate(quotation.items.len())?;

        let split_before = quotation.payment_split();
        update.apply(&mut quotation);
        let split = quotation.payment_split();
        validate_payment_percentages(split.initial_percent, split.final_percent)
            .map_err(|msg| AppError::validation("initial_payment_percent", msg))?;

        let saved: QuotationRequest = self.api.put(&Self::path(id), &quotation).await.json()?;
        info!(
            rpq_id = %id,
            status = %saved.status,
            grand_total = %saved.grand_total(),
            "Quotation updated"
        );

        self.events.publish(ProcurementEvent::ProductUpdated { rpq_id: id });
        if update.touches_payment() || saved.payment_split() != split_before {
            self.events.publish(ProcurementEvent::PaymentUpdated { rpq_id: id });
        }
        Ok(saved)
    }

    /// Upload `file` and attach it to `slot`
    pub async fn upload_document(
        &self,
        id: Uuid,
        slot: DocumentSlot,
        file: UploadFile,
    ) -> AppResult<DocumentRef> {
        let quotation = self.get(id).await?;
        Self::ensure_editable(&quotation)?;

        let endpoint = if file.is_image() { UPLOAD_IMAGE } else { UPLOAD_DOCUMENT };
        let file_name = file.file_name.clone();
        let content_type = file.content_type.clone();
        let uploaded: UploadedFile = self.api.upload(endpoint, file).await.json()?;

        let document = DocumentRef {
            url: uploaded.url,
            file_name: Some(file_name),
            content_type: Some(content_type),
            uploaded_at: Some(Utc::now()),
        };

        let mut documents = quotation.documents.clone();
        documents.set(slot, Some(document.clone()));
        if let Err(e) = self
            .api
            .patch(&Self::path(id), &json!({ "documents": documents }))
            .await
            .into_result()
        {
            warn!(
                rpq_id = %id,
                slot = %slot,
                url = %document.url,
                "Uploaded file could not be attached: {}",
                e
            );
            return Err(AppError::DocumentNotLinked {
                slot,
                uploaded: document,
                reason: e.to_string(),
            });
        }

        info!(rpq_id = %id, slot = %slot, "Document attached");
        Ok(document)
    }

    /// Detach the document in `slot`; the stored file itself is kept
    pub async fn remove_document(
        &self,
        id: Uuid,
        slot: DocumentSlot,
        confirmer: &dyn Confirmer,
    ) -> AppResult<()> {
        let quotation = self.get(id).await?;
        Self::ensure_editable(&quotation)?;

        let mut documents = quotation.documents.clone();
        let Some(previous) = documents.set(slot, None) else {
            return Ok(());
        };

        let prompt = ConfirmPrompt::new(
            "Remove document",
            format!(
                "Remove {} \"{}\" from {}?",
                slot,
                previous.file_name.as_deref().unwrap_or(&previous.url),
                quotation.control_number
            ),
        );
        require_confirmation(confirmer, &prompt)?;

        self.api
            .patch(&Self::path(id), &json!({ "documents": documents }))
            .await
            .into_result()?;
        info!(rpq_id = %id, slot = %slot, "Document removed");
        Ok(())
    }

    /// Delete a quotation; the server removes its inventory request as well
    pub async fn delete(&self, id: Uuid, confirmer: &dyn Confirmer) -> AppResult<()> {
        let quotation = self.get(id).await?;
        if quotation.is_confirmed() {
            return Err(AppError::InvalidStateTransition(format!(
                "{} is confirmed and cannot be deleted",
                quotation.control_number
            )));
        }

        let prompt = ConfirmPrompt::new(
            "Delete quotation",
            format!("Delete {}?", quotation.control_number),
        )
        .with_warning("The inventory request it was created from will be deleted too.");
        require_confirmation(confirmer, &prompt)?;

        self.api.delete(&Self::path(id)).await.into_result()?;
        info!(
            rpq_id = %id,
            irr_id = %quotation.inventory_request_id,
            "Quotation and inventory request deleted"
        );
        self.events.publish(ProcurementEvent::RpqDeleted {
            rpq_id: id,
            irr_id: quotation.inventory_request_id,
        });
        Ok(())
    }

    /// Confirm a complete quotation and create its purchase order
    pub async fn confirm(&self, id: Uuid) -> AppResult<CreatedPurchaseOrder> {
        let quotation = self.get(id).await?;
        if quotation.is_confirmed() {
            return Err(AppError::InvalidStateTransition(format!(
                "{} is already confirmed",
                quotation.control_number
            )));
        }

        let missing = quotation.confirmation_gaps();
        if !missing.is_empty() {
            return Err(AppError::ConfirmationBlocked { missing });
        }

        self.api
            .patch(&Self::path(id), &json!({ "status": QuotationStatus::Confirmed }))
            .await
            .into_result()?;
        info!(rpq_id = %id, control_number = %quotation.control_number, "Quotation confirmed");

        let result = PurchaseOrderService::new(self.api.clone())
            .create_from_quotation(id)
            .await;
        match result {
            Ok(created) => {
                self.events.publish(ProcurementEvent::QuotationConfirmed {
                    rpq_id: id,
                    purchase_order_id: Some(created.id),
                });
                Ok(created)
            }
            Err(e) => {
                warn!(rpq_id = %id, "Purchase order creation failed: {}", e);
                self.events.publish(ProcurementEvent::QuotationConfirmed {
                    rpq_id: id,
                    purchase_order_id: None,
                });
                Err(AppError::PurchaseOrderNotCreated {
                    rpq_id: id,
                    reason: e.to_string(),
                })
            }
        }
    }
}
