//! HTTP Interview Service
//!
//! JSON-over-HTTP client for the remote interview service:
//! - `POST /offer` creates a session and returns its conversation id
//! - `POST /cancel` stops the session started for an agent

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::{Client, Response};
use std::time::Duration;
use url::Url;

use super::client::SessionService;
use super::error::{ServiceError, ServiceResult};
use super::types::*;

/// Connect timeout used by [`HttpSessionService::new`]
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;

/// reqwest-backed [`SessionService`]
pub struct HttpSessionService {
    /// HTTP client with configured timeouts
    client: Client,
    /// Service root, e.g. `http://localhost:8080/`
    base_url: Url,
    /// Request timeout in milliseconds
    timeout_ms: u64,
    connect_timeout_ms: u64,
}

impl HttpSessionService {
    /// Create a new HTTP service client with the default connect timeout
    pub fn new(base_url: impl AsRef<str>, timeout_ms: u64) -> ServiceResult<Self> {
        Self::with_timeouts(base_url, timeout_ms, DEFAULT_CONNECT_TIMEOUT_MS)
    }

    /// Create a new HTTP service client with explicit request and connect timeouts
    pub fn with_timeouts(base_url: impl AsRef<str>, timeout_ms: u64, connect_timeout_ms: u64) -> ServiceResult<Self> {
        let mut base_url = Url::parse(base_url.as_ref())?;
        if base_url.cannot_be_a_base() {
            return Err(ServiceError::InvalidConfig(format!(
                "{} cannot be used as a base URL",
                base_url
            )));
        }
        // `Url::join` drops the last segment unless the path ends with '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .connect_timeout(Duration::from_millis(connect_timeout_ms))
            .build()
            .map_err(|e| ServiceError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            timeout_ms,
            connect_timeout_ms,
        })
    }

    /// Resolve an endpoint relative to the service root
    fn endpoint(&self, path: &str) -> ServiceResult<Url> {
        Ok(self.base_url.join(path)?)
    }

    /// POST a JSON body and hand back the raw response
    async fn post<T: serde::Serialize + ?Sized>(&self, path: &str, body: &T) -> ServiceResult<Response> {
        let url = self.endpoint(path)?;
        debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    warn!("POST {} timed out after {}ms", path, self.timeout_ms);
                }
                ServiceError::from(e)
            })?;

        debug!("Response status for {}: {}", path, response.status());
        Ok(response)
    }

    /// Turn a non-2xx response into a [`ServiceError::Rejected`]
    async fn rejection(response: Response, fallback: &str) -> ServiceError {
        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        ServiceError::Rejected {
            status,
            message: ErrorBody::parse(&text).message_or(fallback),
        }
    }
}

#[async_trait]
impl SessionService for HttpSessionService {
    async fn create_session(&self, request: &OfferRequest) -> ServiceResult<OfferResponse> {
        info!("Requesting interview session for agent {}", request.agent_id);

        let response = self.post("offer", request).await?;
        if !response.status().is_success() {
            return Err(Self::rejection(response, DEFAULT_START_ERROR).await);
        }

        let text = response.text().await?;
        let offer: OfferResponse = serde_json::from_str(&text)?;
        if offer.conversation_id.trim().is_empty() {
            return Err(ServiceError::InvalidResponse(
                "empty conversationId in offer response".to_string(),
            ));
        }

        info!("Interview session created: {}", offer.conversation_id);
        Ok(offer)
    }

    async fn cancel_session(&self, request: &CancelRequest) -> ServiceResult<()> {
        info!("Requesting cancellation for agent {}", request.agent_id);

        let response = self.post("cancel", request).await?;
        if !response.status().is_success() {
            return Err(Self::rejection(response, DEFAULT_CANCEL_ERROR).await);
        }

        Ok(())
    }

    fn service_type(&self) -> &'static str {
        "http"
    }
}

impl std::fmt::Debug for HttpSessionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSessionService")
            .field("base_url", &self.base_url.as_str())
            .field("timeout_ms", &self.timeout_ms)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .finish()
    }
}
