//! Session persistence: the bearer token and a minimal user profile

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use shared::UserProfile;

use crate::error::{AppError, AppResult};

/// What the client keeps between runs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoredSession {
    pub token: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

#[derive(Debug, Deserialize)]
struct ExpiryClaims {
    exp: Option<i64>,
}

impl StoredSession {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            expires_at: None,
            user: None,
        }
    }

    /// Explicit expiry, else the JWT `exp` claim; opaque tokens have none
    pub fn expiry(&self) -> Option<DateTime<Utc>> {
        self.expires_at.or_else(|| jwt_expiry(&self.token))
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.token.trim().is_empty() || self.expiry().map_or(false, |exp| exp <= now)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Read the `exp` claim without verifying the signature; the server does that
fn jwt_expiry(token: &str) -> Option<DateTime<Utc>> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data =
        jsonwebtoken::decode::<ExpiryClaims>(token, &DecodingKey::from_secret(&[]), &validation)
            .ok()?;
    DateTime::from_timestamp(data.claims.exp?, 0)
}

/// Persistent storage for the session
pub trait SessionStore: Send + Sync {
    fn load(&self) -> AppResult<Option<StoredSession>>;
    fn save(&self, session: &StoredSession) -> AppResult<()>;
    fn clear(&self) -> AppResult<()>;
}

/// JSON file on disk
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> AppResult<Option<StoredSession>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AppError::Storage(format!("Failed to read session: {}", e))),
        };

        match serde_json::from_str(&raw) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "Discarding unreadable session: {}", e);
                Ok(None)
            }
        }
    }

    fn save(&self, session: &StoredSession) -> AppResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| AppError::Storage(format!("Failed to create session dir: {}", e)))?;
        }
        let raw = serde_json::to_string_pretty(session)
            .map_err(|e| AppError::Storage(format!("Failed to encode session: {}", e)))?;
        fs::write(&self.path, raw)
            .map_err(|e| AppError::Storage(format!("Failed to write session: {}", e)))
    }

    fn clear(&self) -> AppResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(format!("Failed to clear session: {}", e))),
        }
    }
}

/// Session held in memory only
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: Mutex<Option<StoredSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: StoredSession) -> Self {
        Self {
            session: Mutex::new(Some(session)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> AppResult<Option<StoredSession>> {
        self.session
            .lock()
            .map(|session| session.clone())
            .map_err(|_| AppError::Storage("Session lock poisoned".into()))
    }

    fn save(&self, session: &StoredSession) -> AppResult<()> {
        let mut guard = self
            .session
            .lock()
            .map_err(|_| AppError::Storage("Session lock poisoned".into()))?;
        *guard = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> AppResult<()> {
        let mut guard = self
            .session
            .lock()
            .map_err(|_| AppError::Storage("Session lock poisoned".into()))?;
        *guard = None;
        Ok(())
    }
}
