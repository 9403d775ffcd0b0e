//! Procurement workflow client
//!
//! Drives inventory requests (IRR) through product quotations (RPQ) to
//! purchase orders against the procurement REST API.

pub mod config;
pub mod confirm;
pub mod error;
pub mod events;
pub mod gateway;
pub mod orchestrator;
pub mod services;

pub use config::Config;
pub use error::{AppError, AppResult, ErrorKind};
pub use events::{EventBus, ProcurementEvent};
pub use gateway::{ApiClient, ApiResponse};
pub use orchestrator::{Orchestrator, Stage, StageCounts};
