//! Supporting documents attached to a quotation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Named document slot on a quotation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum DocumentSlot {
    Rpq,
    CommercialInvoice,
    SalesContract,
    PackingList,
}

impl DocumentSlot {
    pub const ALL: [DocumentSlot; 4] = [
        DocumentSlot::Rpq,
        DocumentSlot::CommercialInvoice,
        DocumentSlot::SalesContract,
        DocumentSlot::PackingList,
    ];

    /// Wire name of the slot
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentSlot::Rpq => "rpq",
            DocumentSlot::CommercialInvoice => "commercialInvoice",
            DocumentSlot::SalesContract => "salesContract",
            DocumentSlot::PackingList => "packingList",
        }
    }
}

impl std::fmt::Display for DocumentSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentSlot::Rpq => write!(f, "RPQ"),
            DocumentSlot::CommercialInvoice => write!(f, "Commercial Invoice"),
            DocumentSlot::SalesContract => write!(f, "Sales Contract"),
            DocumentSlot::PackingList => write!(f, "Packing List"),
        }
    }
}

impl FromStr for DocumentSlot {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rpq" => Ok(DocumentSlot::Rpq),
            "commercialInvoice" | "commercial-invoice" => Ok(DocumentSlot::CommercialInvoice),
            "salesContract" | "sales-contract" => Ok(DocumentSlot::SalesContract),
            "packingList" | "packing-list" => Ok(DocumentSlot::PackingList),
            _ => Err("Unknown document slot"),
        }
    }
}

/// Reference to a file held by external storage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRef {
    pub url: String,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub uploaded_at: Option<DateTime<Utc>>,
}

/// The four document slots of a quotation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSet {
    #[serde(default)]
    pub rpq: Option<DocumentRef>,
    #[serde(default)]
    pub commercial_invoice: Option<DocumentRef>,
    #[serde(default)]
    pub sales_contract: Option<DocumentRef>,
    #[serde(default)]
    pub packing_list: Option<DocumentRef>,
}

impl DocumentSet {
    pub fn get(&self, slot: DocumentSlot) -> Option<&DocumentRef> {
        match slot {
            DocumentSlot::Rpq => self.rpq.as_ref(),
            DocumentSlot::CommercialInvoice => self.commercial_invoice.as_ref(),
            DocumentSlot::SalesContract => self.sales_contract.as_ref(),
            DocumentSlot::PackingList => self.packing_list.as_ref(),
        }
    }

    /// Replace a slot, returning the previous reference
    pub fn set(&mut self, slot: DocumentSlot, document: Option<DocumentRef>) -> Option<DocumentRef> {
        let target = match slot {
            DocumentSlot::Rpq => &mut self.rpq,
            DocumentSlot::CommercialInvoice => &mut self.commercial_invoice,
            DocumentSlot::SalesContract => &mut self.sales_contract,
            DocumentSlot::PackingList => &mut self.packing_list,
        };
        std::mem::replace(target, document)
    }

    /// Slots that currently hold a document
    pub fn filled(&self) -> impl Iterator<Item = (DocumentSlot, &DocumentRef)> {
        DocumentSlot::ALL
            .into_iter()
            .filter_map(move |slot| self.get(slot).map(|doc| (slot, doc)))
    }
}
