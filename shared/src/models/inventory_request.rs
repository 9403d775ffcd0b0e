//! Inventory request (IRR) models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::LineItem;

/// Status of an inventory request
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InventoryRequestStatus {
    #[default]
    Pending,
    /// A quotation now depends on this request; it can no longer change
    ProceededToRpq,
}

impl InventoryRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InventoryRequestStatus::Pending => "PENDING",
            InventoryRequestStatus::ProceededToRpq => "PROCEEDED_TO_RPQ",
        }
    }
}

impl std::fmt::Display for InventoryRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InventoryRequestStatus::Pending => write!(f, "Pending"),
            InventoryRequestStatus::ProceededToRpq => write!(f, "Proceeded to RPQ"),
        }
    }
}

/// A request to source a list of products from one supplier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InventoryRequest {
    pub id: Uuid,
    /// e.g. "IRR-2025-0001"
    pub control_number: String,
    pub requestor: String,
    pub supplier_id: Uuid,
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default)]
    pub status: InventoryRequestStatus,
    pub created_at: DateTime<Utc>,
}

impl InventoryRequest {
    pub fn is_pending(&self) -> bool {
        self.status == InventoryRequestStatus::Pending
    }

    pub fn is_editable(&self) -> bool {
        self.is_pending()
    }

    pub fn is_deletable(&self) -> bool {
        self.is_pending()
    }

    /// Only a pending request may be proceeded, and only once
    pub fn can_proceed(&self) -> bool {
        self.is_pending()
    }

    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|item| i64::from(item.quantity)).sum()
    }
}

/// Batch payload creating one inventory request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewInventoryRequest {
    pub control_number: String,
    pub requestor: String,
    pub supplier_id: Uuid,
    pub items: Vec<LineItem>,
    pub remarks: Option<String>,
    pub status: InventoryRequestStatus,
}

/// Payload replacing the editable fields of a pending request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InventoryRequestChanges {
    pub supplier_id: Uuid,
    pub items: Vec<LineItem>,
    pub remarks: Option<String>,
}
