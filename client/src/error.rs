//! Error handling for the procurement client
//!
//! Every failure is terminal to the operation that raised it and resolves to
//! exactly one user-facing [`Notice`].

use shared::{DocumentRef, DocumentSlot, MissingRequirement};
use thiserror::Error;
use uuid::Uuid;

use crate::gateway::{Notice, NoticeLevel};

/// Client error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Validation error: {0}")]
    ValidationErrors(#[from] validator::ValidationErrors),

    // Session errors
    #[error("Not signed in")]
    SessionMissing,

    #[error("Session expired")]
    SessionExpired,

    // Transport errors
    #[error("Request failed with status {status}: {message}")]
    Gateway { status: u16, message: String },

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Workflow precondition errors
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Quotation is missing {} required field(s)", missing.len())]
    ConfirmationBlocked { missing: Vec<MissingRequirement> },

    #[error("Quotation {rpq_id} was created but the inventory request was not marked as proceeded: {reason}")]
    ProceedIncomplete { rpq_id: Uuid, reason: String },

    #[error("Quotation {rpq_id} is confirmed but the purchase order was not created: {reason}")]
    PurchaseOrderNotCreated { rpq_id: Uuid, reason: String },

    #[error("{slot} was uploaded but could not be attached: {reason}")]
    DocumentNotLinked {
        slot: DocumentSlot,
        uploaded: DocumentRef,
        reason: String,
    },

    #[error("Cancelled")]
    Cancelled,

    // Local errors
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error classes, each with its own handling policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caught before any call; fix the input
    Validation,
    /// Network failure or non-2xx response
    Transport,
    /// Missing/expired token; sign in again
    Session,
    /// The document is not in a state that allows the operation
    Precondition,
    /// The user declined a confirmation
    Cancelled,
    Internal,
}

impl AppError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation { .. } | AppError::ValidationErrors(_) => ErrorKind::Validation,
            AppError::SessionMissing | AppError::SessionExpired => ErrorKind::Session,
            AppError::Gateway { .. } | AppError::RateLimited(_) | AppError::NotFound(_) => {
                ErrorKind::Transport
            }
            AppError::InvalidStateTransition(_)
            | AppError::ConfirmationBlocked { .. }
            | AppError::ProceedIncomplete { .. }
            | AppError::PurchaseOrderNotCreated { .. }
            | AppError::DocumentNotLinked { .. } => ErrorKind::Precondition,
            AppError::Cancelled => ErrorKind::Cancelled,
            AppError::Storage(_) | AppError::Configuration(_) | AppError::Internal(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Machine-readable code for the error
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation { .. } | AppError::ValidationErrors(_) => "VALIDATION_ERROR",
            AppError::SessionMissing => "SESSION_MISSING",
            AppError::SessionExpired => "SESSION_EXPIRED",
            AppError::Gateway { .. } => "REQUEST_FAILED",
            AppError::RateLimited(_) => "RATE_LIMITED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::InvalidStateTransition(_) => "INVALID_STATE_TRANSITION",
            AppError::ConfirmationBlocked { .. } => "CONFIRMATION_BLOCKED",
            AppError::ProceedIncomplete { .. } => "PROCEED_INCOMPLETE",
            AppError::PurchaseOrderNotCreated { .. } => "PURCHASE_ORDER_NOT_CREATED",
            AppError::DocumentNotLinked { .. } => "DOCUMENT_NOT_LINKED",
            AppError::Cancelled => "CANCELLED",
            AppError::Storage(_) => "STORAGE_ERROR",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// The single notification shown for this failure
    pub fn notice(&self) -> Notice {
        let level = match self.kind() {
            ErrorKind::Cancelled => NoticeLevel::Info,
            ErrorKind::Validation | ErrorKind::Precondition => NoticeLevel::Warning,
            ErrorKind::Transport | ErrorKind::Session | ErrorKind::Internal => NoticeLevel::Error,
        };

        let (message, details) = match self {
            AppError::Validation { field, message } => {
                (message.clone(), vec![format!("field: {}", field)])
            }
            AppError::ValidationErrors(errors) => {
                let details = errors
                    .field_errors()
                    .into_iter()
                    .flat_map(|(field, errs)| {
                        errs.iter().map(move |e| match &e.message {
                            Some(msg) => format!("{}: {}", field, msg),
                            None => format!("{}: {}", field, e.code),
                        })
                    })
                    .collect();
                ("Please correct the highlighted fields".to_string(), details)
            }
            AppError::SessionMissing | AppError::SessionExpired => (
                "Your session has ended. Please sign in again.".to_string(),
                Vec::new(),
            ),
            AppError::ConfirmationBlocked { missing } => (
                "Complete the following before confirming:".to_string(),
                missing.iter().map(ToString::to_string).collect(),
            ),
            AppError::DocumentNotLinked { uploaded, .. } => {
                (self.to_string(), vec![format!("uploaded file: {}", uploaded.url)])
            }
            other => (other.to_string(), Vec::new()),
        };

        Notice {
            level,
            code: self.code().to_string(),
            message,
            details,
        }
    }
}

/// Result type alias for client operations
pub type AppResult<T> = Result<T, AppError>;
