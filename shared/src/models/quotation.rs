//! Request for product quotation (RPQ) models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{DocumentSet, InventoryRequest, LineItem, SupplierSnapshot};
use crate::types::{clamp_percent, round_money, HUNDRED};

/// Status of a quotation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuotationStatus {
    #[default]
    Draft,
    Pending,
    /// Terminal; a purchase order has been requested
    Confirmed,
}

impl QuotationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuotationStatus::Draft => "DRAFT",
            QuotationStatus::Pending => "PENDING",
            QuotationStatus::Confirmed => "CONFIRMED",
        }
    }
}

impl std::fmt::Display for QuotationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuotationStatus::Draft => write!(f, "Draft"),
            QuotationStatus::Pending => write!(f, "Pending"),
            QuotationStatus::Confirmed => write!(f, "Confirmed"),
        }
    }
}

/// Supplier-quoted pricing and terms for the items of one inventory request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuotationRequest {
    pub id: Uuid,
    /// e.g. "RPQ-2025-0001"
    pub control_number: String,
    pub inventory_request_id: Uuid,
    pub requestor: String,
    pub supplier_id: Uuid,
    pub supplier: SupplierSnapshot,
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub minimum_order_quantity: Option<i32>,
    #[serde(default)]
    pub initial_payment_percent: Option<Decimal>,
    #[serde(default)]
    pub final_payment_percent: Option<Decimal>,
    #[serde(default)]
    pub initial_payment_amount: Option<Decimal>,
    #[serde(default)]
    pub final_payment_amount: Option<Decimal>,
    #[serde(default)]
    pub production_lead_time_days: Option<i32>,
    #[serde(default)]
    pub production_remarks: Option<String>,
    #[serde(default)]
    pub documents: DocumentSet,
    #[serde(default)]
    pub status: QuotationStatus,
    pub created_at: DateTime<Utc>,
}

/// Initial/final payment split derived from the grand total
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSplit {
    pub initial_percent: Option<Decimal>,
    pub final_percent: Option<Decimal>,
    pub initial_amount: Option<Decimal>,
    pub final_amount: Option<Decimal>,
}

impl PaymentSplit {
    /// Derive the split from an initial percentage.
    ///
    /// Only a positive percentage produces final/amount values; otherwise they
    /// stay empty so no 100%/0% split is implied before anything is entered.
    pub fn compute(grand_total: Decimal, initial_percent: Option<Decimal>) -> Self {
        let initial_percent = initial_percent.map(clamp_percent);

        match initial_percent {
            Some(percent) if percent > Decimal::ZERO => {
                let final_percent = HUNDRED - percent;
                Self {
                    initial_percent: Some(percent),
                    final_percent: Some(final_percent),
                    initial_amount: share_of(grand_total, percent),
                    final_amount: share_of(grand_total, final_percent),
                }
            }
            _ => Self {
                initial_percent,
                ..Self::default()
            },
        }
    }
}

/// `percent` of `total`, rounded to cents; `None` on overflow
fn share_of(total: Decimal, percent: Decimal) -> Option<Decimal> {
    total
        .checked_mul(percent)
        .and_then(|amount| amount.checked_div(HUNDRED))
        .map(round_money)
}

/// A requirement that blocks confirmation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "requirement", rename_all = "camelCase")]
pub enum MissingRequirement {
    LineItems,
    UnitPrice { line: usize, item: String },
    InitialPaymentPercent,
    FinalPaymentPercent,
    ProductionLeadTime,
}

impl std::fmt::Display for MissingRequirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MissingRequirement::LineItems => write!(f, "At least one line item"),
            MissingRequirement::UnitPrice { line, item } => {
                write!(f, "Unit price for line {} ({})", line, item)
            }
            MissingRequirement::InitialPaymentPercent => write!(f, "Initial payment percentage"),
            MissingRequirement::FinalPaymentPercent => write!(f, "Final payment percentage"),
            MissingRequirement::ProductionLeadTime => write!(f, "Production lead time"),
        }
    }
}

impl QuotationRequest {
    pub fn is_confirmed(&self) -> bool {
        self.status == QuotationStatus::Confirmed
    }

    pub fn is_editable(&self) -> bool {
        !self.is_confirmed()
    }

    /// Sum of all priced line totals, saturating at `Decimal::MAX`
    pub fn grand_total(&self) -> Decimal {
        self.items
            .iter()
            .filter_map(LineItem::line_total)
            .fold(Decimal::ZERO, |total, line| total.saturating_add(line))
    }

    /// Recompute every line total and the payment amounts that depend on them
    pub fn recompute_totals(&mut self) {
        for item in &mut self.items {
            item.recompute_total();
        }
        self.apply_payment_split(PaymentSplit::compute(
            self.grand_total(),
            self.initial_payment_percent,
        ));
    }

    pub fn payment_split(&self) -> PaymentSplit {
        PaymentSplit {
            initial_percent: self.initial_payment_percent,
            final_percent: self.final_payment_percent,
            initial_amount: self.initial_payment_amount,
            final_amount: self.final_payment_amount,
        }
    }

    /// Set the initial payment percentage and derive the rest of the split
    pub fn set_initial_payment_percent(&mut self, percent: Option<Decimal>) {
        self.apply_payment_split(PaymentSplit::compute(self.grand_total(), percent));
    }

    fn apply_payment_split(&mut self, split: PaymentSplit) {
        self.initial_payment_percent = split.initial_percent;
        self.final_payment_percent = split.final_percent;
        self.initial_payment_amount = split.initial_amount;
        self.final_payment_amount = split.final_amount;
    }

    /// Everything still missing before this quotation can be confirmed.
    ///
    /// Always derived from the current field values.
    pub fn confirmation_gaps(&self) -> Vec<MissingRequirement> {
        let mut missing = Vec::new();

        if self.items.is_empty() {
            missing.push(MissingRequirement::LineItems);
        }
        for (index, item) in self.items.iter().enumerate() {
            if !item.has_positive_price() || item.line_total().is_none() {
                missing.push(MissingRequirement::UnitPrice {
                    line: index + 1,
                    item: item.display_label(),
                });
            }
        }

        let positive = |value: Option<Decimal>| value.map_or(false, |v| v > Decimal::ZERO);
        if !positive(self.initial_payment_percent) {
            missing.push(MissingRequirement::InitialPaymentPercent);
        }
        if !positive(self.final_payment_percent) {
            missing.push(MissingRequirement::FinalPaymentPercent);
        }
        if self.production_lead_time_days.map_or(true, |days| days <= 0) {
            missing.push(MissingRequirement::ProductionLeadTime);
        }

        missing
    }

    pub fn is_confirmable(&self) -> bool {
        self.confirmation_gaps().is_empty()
    }
}

/// Payload creating a quotation from a pending inventory request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewQuotationRequest {
    pub control_number: String,
    pub inventory_request_id: Uuid,
    pub requestor: String,
    pub supplier_id: Uuid,
    pub supplier: SupplierSnapshot,
    pub items: Vec<LineItem>,
    pub status: QuotationStatus,
}

impl NewQuotationRequest {
    /// Copy the request's items (without pricing) into a draft quotation
    pub fn from_inventory_request(
        request: &InventoryRequest,
        control_number: String,
        supplier: SupplierSnapshot,
        requestor: String,
    ) -> Self {
        Self {
            control_number,
            inventory_request_id: request.id,
            requestor,
            supplier_id: request.supplier_id,
            supplier,
            items: request.items.iter().map(LineItem::to_quotation_line).collect(),
            status: QuotationStatus::Draft,
        }
    }
}
