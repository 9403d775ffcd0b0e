//! HTTP gateway to the procurement REST API
//!
//! Every request goes through [`ApiClient`], which attaches the bearer token,
//! refuses protected calls without a live session, retries 429 responses with
//! bounded exponential backoff and normalizes the outcome to [`ApiResponse`].
//! It never returns a transport error to callers.

mod notify;
mod response;
mod retry;
mod session;

use std::sync::Arc;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::config::{ApiConfig, GatewayConfig, RetryConfig};
use crate::error::{AppError, AppResult};
use crate::events::{EventBus, ProcurementEvent};

pub use notify::{
    Notice, NoticeBoard, NoticeLevel, Notifier, TracingNotifier, RATE_LIMIT_NOTICE,
    SESSION_NOTICE,
};
pub use response::ApiResponse;
pub use retry::{is_retryable, Backoff};
pub use session::{FileSessionStore, MemorySessionStore, SessionStore, StoredSession};

use response::NOT_SIGNED_IN;

/// Paths served without a bearer token
const AUTH_PATH_PREFIX: &str = "/auth/";

/// Per-call overrides of the client-wide settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestConfig {
    /// Replaces the configured request timeout for every attempt
    pub timeout: Option<Duration>,
    /// Replaces `retry.max_retries` for this call
    pub max_retries: Option<u32>,
}

impl RequestConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }
}

/// A file to send as multipart form data
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }
}

/// Request body, rebuilt for every attempt
#[derive(Debug, Clone)]
enum Payload {
    Empty,
    Json(Value),
    Multipart(UploadFile),
}

impl Payload {
    fn apply(&self, request: RequestBuilder) -> Result<RequestBuilder, reqwest::Error> {
        Ok(match self {
            Payload::Empty => request,
            Payload::Json(body) => request.json(body),
            Payload::Multipart(file) => {
                let part = Part::bytes(file.bytes.clone())
                    .file_name(file.file_name.clone())
                    .mime_str(&file.content_type)?;
                request.multipart(Form::new().part("file", part))
            }
        })
    }
}

/// Client for the procurement API
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    retry: RetryConfig,
    permits: Arc<Semaphore>,
    sessions: Arc<dyn SessionStore>,
    notifier: Arc<dyn Notifier>,
    events: Option<EventBus>,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(
        api: &ApiConfig,
        retry: RetryConfig,
        gateway: &GatewayConfig,
        sessions: Arc<dyn SessionStore>,
    ) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(api.timeout())
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: api.base_url.trim_end_matches('/').to_string(),
            retry,
            permits: Arc::new(Semaphore::new(gateway.max_in_flight.max(1))),
            sessions,
            notifier: Arc::new(TracingNotifier),
            events: None,
        })
    }

    /// Create a client against a different base URL (for testing)
    pub fn with_base_url(base_url: impl Into<String>, sessions: Arc<dyn SessionStore>) -> AppResult<Self> {
        let api = ApiConfig {
            base_url: base_url.into(),
            ..ApiConfig::default()
        };
        Self::new(&api, RetryConfig::default(), &GatewayConfig::default(), sessions)
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Publish session expiry on `events`
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    pub async fn get(&self, path: &str) -> ApiResponse {
        self.execute(Method::GET, path, Payload::Empty, &RequestConfig::default())
            .await
    }

    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ApiResponse {
        match to_payload(body) {
            Ok(payload) => {
                self.execute(Method::POST, path, payload, &RequestConfig::default())
                    .await
            }
            Err(response) => response,
        }
    }

    pub async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ApiResponse {
        match to_payload(body) {
            Ok(payload) => {
                self.execute(Method::PUT, path, payload, &RequestConfig::default())
                    .await
            }
            Err(response) => response,
        }
    }

    pub async fn patch<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ApiResponse {
        self.patch_with(path, body, &RequestConfig::default()).await
    }

    /// `patch` with per-call overrides
    pub async fn patch_with<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        config: &RequestConfig,
    ) -> ApiResponse {
        match to_payload(body) {
            Ok(payload) => self.execute(Method::PATCH, path, payload, config).await,
            Err(response) => response,
        }
    }

    pub async fn delete(&self, path: &str) -> ApiResponse {
        self.execute(Method::DELETE, path, Payload::Empty, &RequestConfig::default())
            .await
    }

    /// Send `file` as multipart form data under the field name "file"
    pub async fn upload(&self, path: &str, file: UploadFile) -> ApiResponse {
        self.execute(
            Method::POST,
            path,
            Payload::Multipart(file),
            &RequestConfig::default(),
        )
        .await
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Bearer token for a protected call, or the response refusing it
    fn bearer_token(&self) -> Result<String, ApiResponse> {
        match self.sessions.load() {
            Ok(Some(session)) if !session.is_expired() => Ok(session.token),
            Ok(Some(_)) => {
                debug!("Stored session has expired");
                self.end_session();
                Err(ApiResponse::failure(401, "Session expired"))
            }
            Ok(None) => Err(ApiResponse::failure(401, NOT_SIGNED_IN)),
            Err(e) => Err(ApiResponse::failure(0, e.to_string())),
        }
    }

    /// Drop the stored session and tell the application to sign in again
    fn end_session(&self) {
        if let Err(e) = self.sessions.clear() {
            warn!("Failed to clear session: {}", e);
        }
        self.notifier.notify(SESSION_NOTICE, AppError::SessionExpired.notice());
        if let Some(events) = &self.events {
            events.publish(ProcurementEvent::SessionExpired);
        }
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        payload: Payload,
        config: &RequestConfig,
    ) -> ApiResponse {
        let token = if path.starts_with(AUTH_PATH_PREFIX) {
            None
        } else {
            match self.bearer_token() {
                Ok(token) => Some(token),
                Err(refused) => return refused,
            }
        };

        let url = self.url(path);
        let mut backoff = Backoff::new(&self.retry);
        let max_retries = config.max_retries.unwrap_or(self.retry.max_retries);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            let mut request = self.client.request(method.clone(), &url);
            if let Some(token) = &token {
                request = request.bearer_auth(token);
            }
            if let Some(timeout) = config.timeout {
                request = request.timeout(timeout);
            }
            let request = match payload.apply(request) {
                Ok(request) => request,
                Err(e) => return ApiResponse::failure(0, format!("Invalid request body: {}", e)),
            };

            let sent = {
                let _permit = match self.permits.acquire().await {
                    Ok(permit) => permit,
                    Err(_) => return ApiResponse::failure(0, "Gateway is shut down"),
                };
                request.send().await
            };

            let response = match sent {
                Ok(response) => response,
                Err(e) => {
                    warn!(%method, path, "Request failed: {}", e);
                    self.finish_retrying(attempt);
                    return ApiResponse::failure(0, format!("Network error: {}", e));
                }
            };

            let status = response.status();
            if is_retryable(status) {
                if attempt > max_retries {
                    warn!(%method, path, attempts = attempt, "Giving up on rate-limited request");
                    self.finish_retrying(attempt);
                    return ApiResponse::failure(
                        status.as_u16(),
                        format!("Too many requests; gave up after {} attempts", attempt),
                    );
                }

                let delay = backoff.next_delay(response.headers());
                warn!(
                    %method,
                    path,
                    attempt,
                    "Rate limited. Retrying in {:?}...",
                    delay
                );
                self.notifier.notify(
                    RATE_LIMIT_NOTICE,
                    Notice::progress(
                        "RATE_LIMITED",
                        format!(
                            "Server is busy, retrying ({}/{})",
                            attempt, max_retries
                        ),
                    ),
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            self.finish_retrying(attempt);

            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    return ApiResponse::failure(0, format!("Failed to read response: {}", e))
                }
            };
            debug!(%method, path, status = status.as_u16(), "Request completed");

            if status == StatusCode::UNAUTHORIZED && token.is_some() {
                info!(path, "Server rejected the session");
                self.end_session();
            }

            return ApiResponse::from_body(status.as_u16(), &body);
        }
    }

    fn finish_retrying(&self, attempt: u32) {
        if attempt > 1 {
            self.notifier.clear(RATE_LIMIT_NOTICE);
        }
    }
}

fn to_payload<B: Serialize + ?Sized>(body: &B) -> Result<Payload, ApiResponse> {
    serde_json::to_value(body)
        .map(Payload::Json)
        .map_err(|e| ApiResponse::failure(0, format!("Failed to encode request: {}", e)))
}
