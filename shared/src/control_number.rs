//! Control numbers for procurement documents
//!
//! Format: `<PREFIX>-<YEAR>-<SEQ>` (e.g., "IRR-2025-0007"). The sequence is
//! scoped to a prefix and a year, and restarts at 1 every year.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prefix for inventory requests
pub const IRR_PREFIX: &str = "IRR";

/// Prefix for requests for product quotation
pub const RPQ_PREFIX: &str = "RPQ";

/// A parsed control number
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ControlNumber {
    pub prefix: String,
    pub year: i32,
    pub sequence: u32,
}

impl ControlNumber {
    pub fn new(prefix: impl Into<String>, year: i32, sequence: u32) -> Self {
        Self {
            prefix: prefix.into(),
            year,
            sequence,
        }
    }

    /// Whether this number belongs to the given prefix/year series
    pub fn is_in_series(&self, prefix: &str, year: i32) -> bool {
        self.prefix == prefix && self.year == year
    }
}

impl fmt::Display for ControlNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{:04}", self.prefix, self.year, self.sequence)
    }
}

impl FromStr for ControlNumber {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('-').collect();
        if parts.len() < 3 {
            return Err("Control number must be in format PREFIX-YYYY-NNNN");
        }

        let sequence = parts[parts.len() - 1]
            .parse::<u32>()
            .map_err(|_| "Invalid sequence number in control number")?;
        let year = parts[parts.len() - 2]
            .parse::<i32>()
            .map_err(|_| "Invalid year in control number")?;
        let prefix = parts[..parts.len() - 2].join("-");
        if prefix.is_empty() {
            return Err("Control number prefix is empty");
        }

        Ok(Self {
            prefix,
            year,
            sequence,
        })
    }
}

/// Next sequence number for a prefix/year given the numbers already issued.
///
/// Malformed entries are skipped.
pub fn next_sequence<'a, I>(prefix: &str, year: i32, existing: I) -> u32
where
    I: IntoIterator<Item = &'a str>,
{
    existing
        .into_iter()
        .filter_map(|raw| raw.parse::<ControlNumber>().ok())
        .filter(|number| number.is_in_series(prefix, year))
        .map(|number| number.sequence)
        .max()
        .map_or(1, |max| max.saturating_add(1))
}

/// Generate the next control number, e.g. `generate_control_number("IRR", 2025, ..)`
/// → `"IRR-2025-0008"` when `IRR-2025-0007` is the highest issued.
pub fn generate_control_number<'a, I>(prefix: &str, year: i32, existing: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    ControlNumber::new(prefix, year, next_sequence(prefix, year, existing)).to_string()
}
