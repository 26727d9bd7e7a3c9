//! HTTP implementation of the answer service contract

use crate::api::types::{
    ChatRequest, ChatResponse, HealthStatus, HistoryMessage, HistoryResponse, ModeCatalog,
};
use crate::api::AnswerService;
use crate::config::ServiceConfig;
use crate::error::{DocbotError, Result};

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

/// Answer service reached over HTTP/JSON
///
/// # Examples
///
/// ```no_run
/// use docbot::api::{AnswerService, HttpAnswerService};
/// use docbot::config::ServiceConfig;
///
/// # async fn example() -> docbot::error::Result<()> {
/// let service = HttpAnswerService::new(&ServiceConfig::default())?;
/// let catalog = service.modes().await?;
/// println!("{} modes", catalog.modes.len());
/// # Ok(())
/// # }
/// ```
pub struct HttpAnswerService {
    client: Client,
    base_url: Url,
}

impl HttpAnswerService {
    /// Build a client for the configured base address
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the base URL is invalid
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let base_url = normalize_base(&config.base_url)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("docbot/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DocbotError::Config(format!("Failed to build HTTP client: {}", e)))?;

        tracing::debug!("Answer service base URL: {}", base_url);
        Ok(Self { client, base_url })
    }

    /// Base URL every endpoint is resolved against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| DocbotError::Config(format!("Invalid endpoint {}: {}", path, e)).into())
    }

    async fn send_checked(&self, request: reqwest::RequestBuilder, what: &str) -> Result<Response> {
        let response = request.send().await.map_err(|e| {
            tracing::error!("{} request failed: {}", what, e);
            DocbotError::Transport(format!("{} request failed: {}", what, e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("{} returned error {}: {}", what, status, error_text);
            return Err(DocbotError::Service {
                status: status.as_u16(),
                message: error_text,
            }
            .into());
        }

        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
        let body = response.bytes().await.map_err(|e| {
            DocbotError::Transport(format!("Failed to read {} response: {}", what, e))
        })?;
        serde_json::from_slice(&body).map_err(|e| {
            tracing::error!("Failed to parse {} response: {}", what, e);
            DocbotError::MalformedResponse(format!("{}: {}", what, e)).into()
        })
    }
}

#[async_trait]
impl AnswerService for HttpAnswerService {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let url = self.endpoint("chat")?;
        tracing::debug!(
            "POST {} (session={}, mode={}, module={:?})",
            url,
            request.session_id,
            request.mode,
            request.module
        );

        let response = self
            .send_checked(self.client.post(url).json(request), "chat")
            .await?;
        Self::decode(response, "chat").await
    }

    async fn history(&self, session_id: &str) -> Result<Vec<HistoryMessage>> {
        let url = self.endpoint(&format!("chat/history/{}", session_id))?;
        tracing::debug!("GET {}", url);

        let response = self.send_checked(self.client.get(url), "history").await?;
        let history: HistoryResponse = Self::decode(response, "history").await?;
        Ok(history.messages)
    }

    async fn modes(&self) -> Result<ModeCatalog> {
        let url = self.endpoint("chat/modes")?;
        tracing::debug!("GET {}", url);

        let response = self.send_checked(self.client.get(url), "modes").await?;
        Self::decode(response, "modes").await
    }

    async fn health(&self) -> Result<HealthStatus> {
        let url = self.endpoint("health")?;
        let response = self.send_checked(self.client.get(url), "health").await?;
        Self::decode(response, "health").await
    }

    async fn delete_session(&self, session_id: &str) -> Result<()> {
        let url = self.endpoint(&format!("chat/session/{}", session_id))?;
        tracing::info!("DELETE {}", url);
        self.send_checked(self.client.delete(url), "delete session")
            .await?;
        Ok(())
    }
}

/// Parse the base address, ensuring a trailing slash so relative joins
/// keep any path prefix such as `/api/v1`
fn normalize_base(raw: &str) -> Result<Url> {
    let with_slash = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{}/", raw)
    };
    Url::parse(&with_slash)
        .map_err(|e| DocbotError::Config(format!("Invalid service base URL {}: {}", raw, e)).into())
}
