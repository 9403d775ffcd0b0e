//! Purchase order creation and counters

use shared::{CreatedPurchaseOrder, PurchaseOrderCounts, PurchaseOrderSummary, QuotationRequest};
use tracing::{info, warn};
use uuid::Uuid;

use super::paths::{PURCHASE_ORDERS, PURCHASE_ORDER_FROM_QUOTATION};
use crate::error::{AppError, AppResult};
use crate::gateway::ApiClient;

#[derive(Clone)]
pub struct PurchaseOrderService {
    api: ApiClient,
}

impl PurchaseOrderService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn list(&self) -> AppResult<Vec<PurchaseOrderSummary>> {
        self.api.get(PURCHASE_ORDERS).await.json()
    }

    /// Open orders and orders awaiting payment
    pub async fn counts(&self) -> AppResult<PurchaseOrderCounts> {
        let orders = self.list().await?;
        Ok(PurchaseOrderCounts::tally(&orders))
    }

    /// Ask the server to create the purchase order for a confirmed quotation
    pub async fn create_from_quotation(&self, rpq_id: Uuid) -> AppResult<CreatedPurchaseOrder> {
        let created: CreatedPurchaseOrder = self
            .api
            .post(
                &format!("{}/{}", PURCHASE_ORDER_FROM_QUOTATION, rpq_id),
                &serde_json::json!({}),
            )
            .await
            .json()?;

        info!(
            rpq_id = %rpq_id,
            purchase_order_id = %created.id,
            po_number = created.po_number.as_deref().unwrap_or("-"),
            "Purchase order created"
        );
        Ok(created)
    }

    /// Recover a confirmation whose purchase order was never created
    ///
    /// Returns the existing order when one already references the quotation.
    pub async fn retry_from_quotation(
        &self,
        quotation: &QuotationRequest,
    ) -> AppResult<CreatedPurchaseOrder> {
        if !quotation.is_confirmed() {
            return Err(AppError::InvalidStateTransition(format!(
                "Quotation {} must be confirmed before a purchase order can be created",
                quotation.control_number
            )));
        }

        let existing = self
            .list()
            .await?
            .into_iter()
            .find(|po| po.quotation_request_id == Some(quotation.id));
        if let Some(po) = existing {
            warn!(rpq_id = %quotation.id, purchase_order_id = %po.id, "Purchase order already exists");
            return Ok(CreatedPurchaseOrder {
                id: po.id,
                po_number: po.po_number,
            });
        }

        self.create_from_quotation(quotation.id).await
    }
}
