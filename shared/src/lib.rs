//! Shared types and models for the procurement workflow
//!
//! This crate contains the document model (suppliers, inventory requests,
//! quotations) and the pure calculations shared between the API client,
//! the CLI, and the browser front end (via WASM).

pub mod control_number;
pub mod models;
pub mod types;
pub mod validation;

pub use control_number::*;
pub use models::*;
pub use types::*;
pub use validation::*;
