//! Test utilities for DocBot
//!
//! Provides a scripted in-process [`AnswerService`], payload builders, and
//! assertion helpers shared by the unit tests.

use crate::api::{AnswerService, ChatRequest, ChatResponse, HistoryMessage, ModeCatalog};
use crate::config::Config;
use crate::error::{DocbotError, Result};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::Mutex;

/// One scripted reaction to a `chat` call
#[derive(Debug)]
pub enum ServiceStep {
    /// Answer with this payload
    Answer(ChatResponse),
    /// Fail with this error
    Fail(DocbotError),
    /// Never complete
    Hang,
}

/// Answer service that replays a fixed script and records requests
///
/// `chat` consumes one step per call; once the script is exhausted it fails
/// with a transport error. `history` fails unless history was configured,
/// which mirrors the 404 returned for unknown sessions.
#[derive(Debug, Default)]
pub struct ScriptedService {
    steps: Mutex<VecDeque<ServiceStep>>,
    requests: Mutex<Vec<ChatRequest>>,
    history: Option<Vec<HistoryMessage>>,
    catalog: Option<ModeCatalog>,
}

impl ScriptedService {
    /// Create a service that replays `steps` in order
    pub fn new(steps: Vec<ServiceStep>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            ..Default::default()
        }
    }

    /// Serve this history for every session
    pub fn with_history(mut self, messages: Vec<(&str, &str)>) -> Self {
        self.history = Some(
            messages
                .into_iter()
                .map(|(role, content)| history_message(role, content))
                .collect(),
        );
        self
    }

    /// Serve this mode catalog
    pub fn with_catalog(mut self, catalog: ModeCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Every chat request received so far
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests
            .lock()
            .expect("requests lock poisoned")
            .clone()
    }
}

#[async_trait]
impl AnswerService for ScriptedService {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        self.requests
            .lock()
            .expect("requests lock poisoned")
            .push(request.clone());
        let step = self.steps.lock().expect("steps lock poisoned").pop_front();
        match step {
            Some(ServiceStep::Answer(response)) => Ok(response),
            Some(ServiceStep::Fail(error)) => Err(error.into()),
            Some(ServiceStep::Hang) => std::future::pending().await,
            None => Err(DocbotError::Transport("script exhausted".to_string()).into()),
        }
    }

    async fn history(&self, session_id: &str) -> Result<Vec<HistoryMessage>> {
        self.history.clone().ok_or_else(|| {
            DocbotError::Service {
                status: 404,
                message: format!("Session {} not found", session_id),
            }
            .into()
        })
    }

    async fn modes(&self) -> Result<ModeCatalog> {
        self.catalog
            .clone()
            .ok_or_else(|| DocbotError::Transport("no catalog scripted".to_string()).into())
    }
}

/// Build a minimal successful chat payload
pub fn answer(text: &str) -> ChatResponse {
    answer_with_suggestions(text, &[])
}

/// Build a chat payload carrying follow-up suggestions
pub fn answer_with_suggestions(text: &str, suggestions: &[&str]) -> ChatResponse {
    ChatResponse {
        response: text.to_string(),
        timestamp: None,
        session_id: None,
        sources: None,
        suggestions: Some(suggestions.iter().map(|s| s.to_string()).collect()),
        visualization: None,
    }
}

/// Build a stored history record with a fixed server timestamp
pub fn history_message(role: &str, content: &str) -> HistoryMessage {
    HistoryMessage {
        role: role.to_string(),
        content: content.to_string(),
        timestamp: Utc.with_ymd_and_hms(2025, 1, 15, 10, 30, 0).unwrap(),
        sources: None,
        visualization: None,
    }
}

/// Assert that an error contains the expected message
///
/// # Panics
///
/// Panics if the result is Ok or if the error doesn't contain the expected message
pub fn assert_error_contains<T>(result: Result<T>, expected: &str) {
    match result {
        Ok(_) => panic!("Expected error containing '{}' but got Ok", expected),
        Err(e) => {
            let error_msg = e.to_string();
            assert!(
                error_msg.contains(expected),
                "Error message '{}' does not contain '{}'",
                error_msg,
                expected
            );
        }
    }
}

/// Configuration suitable for unit tests: no catalog fetch, default mode
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.chat.load_modes_from_service = false;
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_service_replays_in_order() {
        let service = ScriptedService::new(vec![
            ServiceStep::Answer(answer("one")),
            ServiceStep::Fail(DocbotError::Transport("down".into())),
        ]);
        let request = ChatRequest {
            message: "q".into(),
            session_id: "s".into(),
            mode: "general".into(),
            module: None,
        };
        assert_eq!(service.chat(&request).await.unwrap().response, "one");
        assert!(service.chat(&request).await.is_err());
        assert!(service.chat(&request).await.is_err());
        assert_eq!(service.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_history_unconfigured_is_not_found() {
        let service = ScriptedService::new(Vec::new());
        assert_error_contains(service.history("abc").await, "status=404");
    }

    #[test]
    #[should_panic(expected = "Expected error containing")]
    fn test_assert_error_contains_ok() {
        assert_error_contains(Ok(()), "error");
    }

    #[test]
    fn test_test_config_is_valid() {
        assert!(test_config().validate().is_ok());
    }
}
