//! Validation utilities for procurement documents
//!
//! Everything here runs before any network call so bad input never reaches
//! the API.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::control_number::ControlNumber;
use crate::models::LineItem;
use crate::types::HUNDRED;

// ============================================================================
// Inventory Request Validations
// ============================================================================

/// A supplier must be chosen
pub fn validate_supplier_selected(supplier_id: Option<Uuid>) -> Result<Uuid, &'static str> {
    match supplier_id {
        Some(id) if !id.is_nil() => Ok(id),
        _ => Err("Supplier is required"),
    }
}

/// At least one item, each with a positive quantity
pub fn validate_line_items(items: &[LineItem]) -> Result<(), &'static str> {
    if items.is_empty() {
        return Err("At least one item is required");
    }
    if items.iter().any(|item| item.quantity <= 0) {
        return Err("Quantity must be greater than 0");
    }
    if items.iter().any(|item| item.product_name.trim().is_empty()) {
        return Err("Every item must name a product");
    }
    Ok(())
}

// ============================================================================
// Quotation Validations
// ============================================================================

/// Largest unit price accepted on a quotation line
pub const MAX_UNIT_PRICE: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// Unit prices cannot be negative; zero is treated as "not quoted yet"
pub fn validate_unit_price(price: Decimal) -> Result<(), &'static str> {
    if price < Decimal::ZERO {
        return Err("Unit price cannot be negative");
    }
    if price > MAX_UNIT_PRICE {
        return Err("Unit price exceeds 1,000,000,000");
    }
    Ok(())
}

/// Production lead time in days
pub fn validate_lead_time(days: i32) -> Result<(), &'static str> {
    if days <= 0 {
        return Err("Production lead time must be at least 1 day");
    }
    if days > 3650 {
        return Err("Production lead time exceeds 10 years");
    }
    Ok(())
}

/// Minimum order quantity
pub fn validate_minimum_order_quantity(quantity: i32) -> Result<(), &'static str> {
    if quantity <= 0 {
        return Err("Minimum order quantity must be greater than 0");
    }
    Ok(())
}

/// Once both payment percentages are set they must sum to 100
pub fn validate_payment_percentages(
    initial: Option<Decimal>,
    final_: Option<Decimal>,
) -> Result<(), &'static str> {
    match (initial, final_) {
        (Some(i), Some(f)) => {
            if i < Decimal::ZERO || f < Decimal::ZERO {
                return Err("Payment percentages cannot be negative");
            }
            if i + f != HUNDRED {
                return Err("Payment percentages must sum to 100");
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

// ============================================================================
// Control Number Validations
// ============================================================================

/// Validate control number format: PREFIX-YYYY-NNNN
pub fn validate_control_number(number: &str, prefix: &str) -> Result<(), &'static str> {
    let parsed: ControlNumber = number.parse()?;
    if parsed.prefix != prefix {
        return Err("Control number has the wrong prefix");
    }
    let parts: Vec<&str> = number.split('-').collect();
    if parts[parts.len() - 2].len() != 4 {
        return Err("Invalid year in control number");
    }
    if parts[parts.len() - 1].len() < 4 {
        return Err("Sequence number must be zero-padded to 4 digits");
    }
    Ok(())
}
