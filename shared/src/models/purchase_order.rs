//! Purchase order summaries
//!
//! Purchase orders are created and owned by the server once a quotation is
//! confirmed; the client only reads summaries for its counters.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

const CLOSED_ORDER_STATUSES: &[&str] = &["COMPLETED", "CANCELLED"];
const PAID_STATUS: &str = "PAID";

/// Purchase order as listed by the API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderSummary {
    pub id: Uuid,
    #[serde(default)]
    pub po_number: Option<String>,
    #[serde(default)]
    pub quotation_request_id: Option<Uuid>,
    pub status: String,
    #[serde(default)]
    pub payment_status: Option<String>,
}

impl PurchaseOrderSummary {
    pub fn is_open(&self) -> bool {
        !CLOSED_ORDER_STATUSES
            .iter()
            .any(|closed| self.status.eq_ignore_ascii_case(closed))
    }

    pub fn is_awaiting_payment(&self) -> bool {
        !self
            .payment_status
            .as_deref()
            .map_or(false, |status| status.eq_ignore_ascii_case(PAID_STATUS))
    }
}

/// Badge counts for the purchase order stage
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderCounts {
    pub pending_orders: usize,
    pub pending_payments: usize,
}

impl PurchaseOrderCounts {
    pub fn tally(orders: &[PurchaseOrderSummary]) -> Self {
        Self {
            pending_orders: orders.iter().filter(|po| po.is_open()).count(),
            pending_payments: orders
                .iter()
                .filter(|po| po.is_open() && po.is_awaiting_payment())
                .count(),
        }
    }
}

/// Response of the "create from quotation" endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreatedPurchaseOrder {
    pub id: Uuid,
    #[serde(default)]
    pub po_number: Option<String>,
}
