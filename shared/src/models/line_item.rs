//! Line items shared by inventory requests and quotations

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::round_money;

/// Unit of measure used by the procurement workflow
pub const DEFAULT_UNIT: &str = "PCS";

fn default_unit() -> String {
    DEFAULT_UNIT.to_string()
}

/// One product (optionally one variation) requested or quoted
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: Uuid,
    #[serde(default)]
    pub variation_id: Option<Uuid>,
    pub product_name: String,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub upc: Option<String>,
    /// Human-readable variation label, e.g. "Red / XL"
    #[serde(default)]
    pub variation_label: Option<String>,
    #[serde(default = "default_unit")]
    pub unit: String,
    pub quantity: i32,
    #[serde(default)]
    pub unit_price: Option<Decimal>,
    /// Derived: `unit_price * quantity`
    #[serde(default)]
    pub total_amount: Option<Decimal>,
}

impl LineItem {
    pub fn new(product_id: Uuid, product_name: impl Into<String>, quantity: i32) -> Self {
        Self {
            product_id,
            variation_id: None,
            product_name: product_name.into(),
            sku: None,
            upc: None,
            variation_label: None,
            unit: default_unit(),
            quantity,
            unit_price: None,
            total_amount: None,
        }
    }

    pub fn with_variation(mut self, variation_id: Uuid, label: impl Into<String>) -> Self {
        self.variation_id = Some(variation_id);
        self.variation_label = Some(label.into());
        self
    }

    pub fn with_codes(mut self, sku: Option<String>, upc: Option<String>) -> Self {
        self.sku = sku;
        self.upc = upc;
        self
    }

    /// `unit_price * quantity`, or `None` while unpriced or when the product
    /// does not fit in a `Decimal`
    pub fn line_total(&self) -> Option<Decimal> {
        self.unit_price?
            .checked_mul(Decimal::from(self.quantity))
            .map(round_money)
    }

    /// Refresh the stored total after a price or quantity change
    pub fn recompute_total(&mut self) {
        self.total_amount = self.line_total();
    }

    /// Set the unit price and refresh the total
    pub fn set_unit_price(&mut self, unit_price: Option<Decimal>) {
        self.unit_price = unit_price;
        self.recompute_total();
    }

    /// Set the quantity and refresh the total
    pub fn set_quantity(&mut self, quantity: i32) {
        self.quantity = quantity;
        self.recompute_total();
    }

    pub fn has_positive_price(&self) -> bool {
        self.unit_price.map_or(false, |price| price > Decimal::ZERO)
    }

    /// Copy for a new quotation: same product identity and quantity, no pricing
    pub fn to_quotation_line(&self) -> Self {
        Self {
            unit_price: None,
            total_amount: None,
            unit: default_unit(),
            ..self.clone()
        }
    }

    /// Label used when reporting problems with this line
    pub fn display_label(&self) -> String {
        match (&self.sku, &self.variation_label) {
            (Some(sku), Some(label)) => format!("{} ({}, {})", self.product_name, sku, label),
            (Some(sku), None) => format!("{} ({})", self.product_name, sku),
            (None, Some(label)) => format!("{} ({})", self.product_name, label),
            (None, None) => self.product_name.clone(),
        }
    }
}
