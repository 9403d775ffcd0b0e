//! Common types used across the workflow

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One hundred percent
pub const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Round a monetary amount to cents
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Parse a free-text decimal entry such as `"30"`, `" 12.5 "` or `"1,250.00"`.
///
/// Blank or unparsable input yields `None` so callers can clear dependent
/// fields instead of assuming zero.
pub fn parse_decimal_input(input: &str) -> Option<Decimal> {
    let cleaned: String = input.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned).ok()
}

/// Parse a percentage entry, clamped to `[0, 100]`
pub fn parse_percent_input(input: &str) -> Option<Decimal> {
    parse_decimal_input(input).map(clamp_percent)
}

/// Clamp a percentage to `[0, 100]`
pub fn clamp_percent(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO).min(HUNDRED)
}

/// Minimal profile of the signed-in user, persisted next to the token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: uuid::Uuid,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}
