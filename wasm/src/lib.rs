//! WebAssembly module for the procurement workflow
//!
//! Provides client-side computation for:
//! - Control number generation
//! - Quotation totals and payment split
//! - Confirmation readiness

use rust_decimal::Decimal;
use serde::Serialize;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::control_number::*;
pub use shared::models::*;
pub use shared::types::*;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    web_sys::console::debug_1(&JsValue::from_str("procurement-wasm loaded"));
}

fn js_error(context: &str, error: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&format!("{}: {}", context, error))
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| js_error("Serialization failed", e))
}

/// Next control number given the numbers already issued (JSON array of strings)
#[wasm_bindgen(js_name = nextControlNumber)]
pub fn next_control_number(prefix: &str, year: i32, existing_json: &str) -> Result<String, JsValue> {
    let existing: Vec<String> =
        serde_json::from_str(existing_json).map_err(|e| js_error("Invalid control number list", e))?;
    Ok(generate_control_number(
        prefix,
        year,
        existing.iter().map(String::as_str),
    ))
}

/// Payment split for a grand total and a raw percentage entry, as JSON
#[wasm_bindgen(js_name = paymentSplit)]
pub fn payment_split(grand_total: &str, initial_percent: &str) -> Result<String, JsValue> {
    let total = parse_grand_total(grand_total).map_err(|e| js_error("Invalid grand total", e))?;
    to_json(&PaymentSplit::compute(total, parse_percent_input(initial_percent)))
}

fn parse_grand_total(raw: &str) -> Result<Decimal, String> {
    match parse_decimal_input(raw) {
        Some(total) if total >= Decimal::ZERO => Ok(total),
        Some(_) => Err("must not be negative".to_string()),
        None => Err(format!("'{}' is not a number", raw.trim())),
    }
}

/// Recompute line totals and the payment split of a quotation (JSON in, JSON out)
#[wasm_bindgen(js_name = recomputeQuotation)]
pub fn recompute_quotation(quotation_json: &str) -> Result<String, JsValue> {
    let mut quotation: QuotationRequest =
        serde_json::from_str(quotation_json).map_err(|e| js_error("Invalid quotation", e))?;
    quotation.recompute_totals();
    to_json(&quotation)
}

/// Human-readable list of what still blocks confirmation, as a JSON array
#[wasm_bindgen(js_name = confirmationGaps)]
pub fn confirmation_gaps(quotation_json: &str) -> Result<String, JsValue> {
    let quotation: QuotationRequest =
        serde_json::from_str(quotation_json).map_err(|e| js_error("Invalid quotation", e))?;
    let gaps: Vec<String> = quotation
        .confirmation_gaps()
        .iter()
        .map(ToString::to_string)
        .collect();
    to_json(&gaps)
}

#[wasm_bindgen(js_name = isValidControlNumber)]
pub fn is_valid_control_number(number: &str, prefix: &str) -> bool {
    shared::validation::validate_control_number(number, prefix).is_ok()
}
