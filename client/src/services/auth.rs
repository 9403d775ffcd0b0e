//! Sign-in and session lifecycle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::UserProfile;
use tracing::info;

use super::paths::LOGIN;
use crate::error::{AppError, AppResult};
use crate::gateway::{ApiClient, StoredSession};

/// Login request
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    api: ApiClient,
}

impl AuthService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Exchange credentials for a token and store it
    pub async fn login(&self, email: &str, password: &str) -> AppResult<StoredSession> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AppError::validation("credentials", "Email and password are required"));
        }

        let request = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        let response = self.api.post(LOGIN, &request).await;
        if response.status == 401 {
            return Err(AppError::validation(
                "credentials",
                response
                    .error
                    .unwrap_or_else(|| "Invalid email or password".to_string()),
            ));
        }
        let response: LoginResponse = response.json()?;

        let session = StoredSession {
            token: response.token,
            expires_at: response.expires_at,
            user: response.user,
        };
        self.api.sessions().save(&session)?;

        info!(
            user = session.user.as_ref().map(|u| u.name.as_str()).unwrap_or("unknown"),
            "Signed in"
        );
        Ok(session)
    }

    pub fn logout(&self) -> AppResult<()> {
        self.api.sessions().clear()?;
        info!("Signed out");
        Ok(())
    }

    /// The live session, if any
    pub fn current(&self) -> AppResult<Option<StoredSession>> {
        Ok(self
            .api
            .sessions()
            .load()?
            .filter(|session| !session.is_expired()))
    }
}
