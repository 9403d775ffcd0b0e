//! Domain models for the procurement workflow

mod document;
mod inventory_request;
mod line_item;
mod purchase_order;
mod quotation;
mod supplier;

pub use document::*;
pub use inventory_request::*;
pub use line_item::*;
pub use purchase_order::*;
pub use quotation::*;
pub use supplier::*;
