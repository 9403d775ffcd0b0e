//! User-facing notifications
//!
//! Notices are keyed: posting under a key that is already showing replaces
//! the previous notice instead of stacking a new one.

use std::sync::Mutex;

use serde::Serialize;

/// Key of the progress notice shown while rate-limited requests are retried
pub const RATE_LIMIT_NOTICE: &str = "rate-limit";

/// Key of the notice shown when the session ends
pub const SESSION_NOTICE: &str = "session";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Progress,
    Warning,
    Error,
}

/// A message for the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl Notice {
    pub fn progress(code: &str, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Progress,
            code: code.to_string(),
            message: message.into(),
            details: Vec::new(),
        }
    }

    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            code: code.to_string(),
            message: message.into(),
            details: Vec::new(),
        }
    }
}

/// Sink for notifications
pub trait Notifier: Send + Sync {
    /// Show `notice` under `key`, replacing whatever that key showed before
    fn notify(&self, key: &str, notice: Notice);

    /// Dismiss the notice under `key`, if any
    fn clear(&self, key: &str);
}

/// Writes notices to the tracing subscriber
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, key: &str, notice: Notice) {
        match notice.level {
            NoticeLevel::Error => tracing::error!(key, code = %notice.code, "{}", notice.message),
            NoticeLevel::Warning => tracing::warn!(key, code = %notice.code, "{}", notice.message),
            NoticeLevel::Info | NoticeLevel::Progress => {
                tracing::info!(key, code = %notice.code, "{}", notice.message)
            }
        }
    }

    fn clear(&self, key: &str) {
        tracing::debug!(key, "notice cleared");
    }
}

/// In-memory notice board holding the currently visible notices
#[derive(Debug, Default)]
pub struct NoticeBoard {
    state: Mutex<BoardState>,
}

#[derive(Debug, Default)]
struct BoardState {
    active: Vec<(String, Notice)>,
    posted: usize,
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently visible notices, oldest first
    pub fn active(&self) -> Vec<(String, Notice)> {
        self.state
            .lock()
            .map(|state| state.active.clone())
            .unwrap_or_default()
    }

    pub fn get(&self, key: &str) -> Option<Notice> {
        self.state.lock().ok().and_then(|state| {
            state
                .active
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, notice)| notice.clone())
        })
    }

    /// Total number of notices ever posted
    pub fn posted(&self) -> usize {
        self.state.lock().map(|state| state.posted).unwrap_or(0)
    }
}

impl Notifier for NoticeBoard {
    fn notify(&self, key: &str, notice: Notice) {
        if let Ok(mut state) = self.state.lock() {
            state.posted += 1;
            match state.active.iter_mut().find(|(k, _)| k == key) {
                Some(entry) => entry.1 = notice,
                None => state.active.push((key.to_string(), notice)),
            }
        }
    }

    fn clear(&self, key: &str) {
        if let Ok(mut state) = self.state.lock() {
            state.active.retain(|(k, _)| k != key);
        }
    }
}
