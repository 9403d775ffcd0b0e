//! Confirmation prompts for destructive actions

use crate::error::{AppError, AppResult};

/// What the user is asked before something is removed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmPrompt {
    pub title: String,
    pub message: String,
    /// Extra consequence the user should know about
    pub warning: Option<String>,
}

impl ConfirmPrompt {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            warning: None,
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warning = Some(warning.into());
        self
    }
}

pub trait Confirmer: Send + Sync {
    fn confirm(&self, prompt: &ConfirmPrompt) -> bool;
}

/// Answers yes without asking (`--yes`)
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoConfirm;

impl Confirmer for AutoConfirm {
    fn confirm(&self, _prompt: &ConfirmPrompt) -> bool {
        true
    }
}

/// Answers no without asking
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoDecline;

impl Confirmer for AutoDecline {
    fn confirm(&self, _prompt: &ConfirmPrompt) -> bool {
        false
    }
}

/// Ask, and turn a "no" into [`AppError::Cancelled`]
pub fn require_confirmation(confirmer: &dyn Confirmer, prompt: &ConfirmPrompt) -> AppResult<()> {
    if confirmer.confirm(prompt) {
        Ok(())
    } else {
        tracing::debug!(title = %prompt.title, "Declined by user");
        Err(AppError::Cancelled)
    }
}
