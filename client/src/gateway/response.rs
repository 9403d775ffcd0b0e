//! Uniform response shape returned by every gateway call

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, AppResult};

/// Error text used when a protected request is refused for lack of a session
pub(crate) const NOT_SIGNED_IN: &str = "Not signed in";

/// Normalized outcome of one request
///
/// `status` is the HTTP status, or 0 when no response was received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T = Value> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub status: u16,
}

impl ApiResponse<Value> {
    pub fn ok(status: u16, data: Option<Value>) -> Self {
        Self {
            success: true,
            data,
            error: None,
            status,
        }
    }

    pub fn failure(status: u16, error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            status,
        }
    }

    /// Build from a status code and the raw response body
    pub(crate) fn from_body(status: u16, body: &str) -> Self {
        let parsed = if body.trim().is_empty() {
            None
        } else {
            Some(serde_json::from_str::<Value>(body).unwrap_or_else(|_| Value::String(body.to_string())))
        };

        if (200..300).contains(&status) {
            Self::ok(status, parsed.map(unwrap_envelope))
        } else {
            let message = parsed
                .as_ref()
                .and_then(error_message)
                .unwrap_or_else(|| default_message(status));
            Self::failure(status, message)
        }
    }

    /// Convert into the payload or a typed error
    pub fn into_result(self) -> AppResult<Value> {
        if self.success {
            return Ok(self.data.unwrap_or(Value::Null));
        }

        let message = self.error.unwrap_or_else(|| default_message(self.status));
        Err(match self.status {
            401 if message == NOT_SIGNED_IN => AppError::SessionMissing,
            401 => AppError::SessionExpired,
            404 => AppError::NotFound(message),
            429 => AppError::RateLimited(message),
            status => AppError::Gateway { status, message },
        })
    }

    /// Deserialize the payload into `T`
    pub fn json<T: DeserializeOwned>(self) -> AppResult<T> {
        let data = self.into_result()?;
        serde_json::from_value(data)
            .map_err(|e| AppError::Internal(format!("Unexpected response shape: {}", e)))
    }
}

/// `{ "data": ... }` envelopes are unwrapped; bare payloads pass through
fn unwrap_envelope(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn error_message(body: &Value) -> Option<String> {
    match body {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Value::Object(map) => ["error", "message"].iter().find_map(|key| match map.get(*key) {
            Some(Value::String(text)) => Some(text.clone()),
            Some(nested @ Value::Object(_)) => error_message(nested),
            _ => None,
        }),
        _ => None,
    }
}

fn default_message(status: u16) -> String {
    match status {
        0 => "No response from server".to_string(),
        400 => "Bad request".to_string(),
        401 => "Session expired".to_string(),
        403 => "Forbidden".to_string(),
        404 => "Not found".to_string(),
        429 => "Too many requests".to_string(),
        s if s >= 500 => format!("Server error ({})", s),
        s => format!("Request failed ({})", s),
    }
}
