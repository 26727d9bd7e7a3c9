//! Answer service boundary
//!
//! The retrieval and answer-generation backend is an external collaborator.
//! This module defines the narrow request/response contract DocBot consumes
//! ([`AnswerService`]) and its HTTP implementation ([`HttpAnswerService`]).

pub mod http;
pub mod types;

pub use http::HttpAnswerService;
pub use types::{
    parse_timestamp, ChatRequest, ChatResponse, Citation, HealthStatus, HistoryMessage,
    HistoryResponse, ModeCatalog, ModeDescriptor,
};

use crate::error::{DocbotError, Result};
use async_trait::async_trait;

/// Remote answer service
///
/// Implementations must map every failure onto [`DocbotError`] variants so
/// callers can classify transport, service and malformed-payload failures.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use docbot::api::{AnswerService, ChatRequest, ChatResponse, HistoryMessage, ModeCatalog};
/// use docbot::error::Result;
///
/// struct Echo;
///
/// #[async_trait]
/// impl AnswerService for Echo {
///     async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
///         Ok(serde_json::from_value(serde_json::json!({ "response": request.message }))?)
///     }
///
///     async fn history(&self, _session_id: &str) -> Result<Vec<HistoryMessage>> {
///         Ok(Vec::new())
///     }
///
///     async fn modes(&self) -> Result<ModeCatalog> {
///         Ok(ModeCatalog::default())
///     }
/// }
/// ```
#[async_trait]
pub trait AnswerService: Send + Sync {
    /// Ask one question and wait for the answer
    ///
    /// # Errors
    ///
    /// Returns `Transport`, `Service` or `MalformedResponse` errors
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse>;

    /// Fetch the stored history for a session in server order
    ///
    /// # Errors
    ///
    /// Returns an error if the session is unknown or the fetch fails
    async fn history(&self, session_id: &str) -> Result<Vec<HistoryMessage>>;

    /// Fetch the deployment's selectable modes and modules
    ///
    /// # Errors
    ///
    /// Returns an error if the fetch fails
    async fn modes(&self) -> Result<ModeCatalog>;

    /// Report service health
    ///
    /// The default implementation reports the operation as unsupported.
    async fn health(&self) -> Result<HealthStatus> {
        Err(DocbotError::Unsupported("health check".to_string()).into())
    }

    /// Delete a session's server-side history
    ///
    /// The default implementation reports the operation as unsupported.
    async fn delete_session(&self, _session_id: &str) -> Result<()> {
        Err(DocbotError::Unsupported("session deletion".to_string()).into())
    }
}
