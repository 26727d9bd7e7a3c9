//! Append-only conversation timeline
//!
//! The timeline is the ordered log of messages for the active session and
//! the source of truth for what the host renders. Messages are immutable
//! once appended; the log is only ever replaced wholesale by a history load
//! or emptied by a session reset.

use crate::api::{ChatResponse, Citation, HistoryMessage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed remediation shown for every failed exchange
///
/// Failure categories are logged but never distinguished to the user.
pub const ERROR_REMEDIATION: &str = "Sorry, I couldn't get an answer to that.\n\n\
Here's what you can try:\n\
1. Check your network connection and that the DocBot service is reachable.\n\
2. Send your question again.\n\
3. Rephrase the question or make it more specific.\n\
4. Start a new session (Ctrl+N or /new).\n\
5. If the problem persists, contact your DocBot administrator.";

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person using the client
    User,
    /// The answer service, or the client reporting a failed exchange
    Assistant,
    /// Client-local annotations such as mode changes
    System,
}

impl Role {
    /// Parse a wire role; unknown roles are treated as assistant output
    pub fn from_wire(role: &str) -> Self {
        match role.to_lowercase().as_str() {
            "user" => Self::User,
            "system" => Self::System,
            _ => Self::Assistant,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
            Self::System => write!(f, "system"),
        }
    }
}

/// One immutable timeline entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Author of the message
    pub role: Role,
    /// Message text
    pub content: String,
    /// When the message was produced
    pub timestamp: DateTime<Utc>,
    /// Citations for assistant answers
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<Citation>,
    /// Follow-up prompts offered with an answer
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
    /// Opaque diagram spec
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visualization: Option<serde_json::Value>,
    /// Whether this is a client-generated failure notice
    #[serde(default)]
    pub is_error: bool,
}

impl Message {
    fn new(role: Role, content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp,
            sources: Vec::new(),
            suggestions: Vec::new(),
            visualization: None,
            is_error: false,
        }
    }

    /// Build an assistant message from a successful chat payload
    ///
    /// The server timestamp is used when present, the local clock otherwise.
    pub fn from_response(response: ChatResponse) -> Self {
        Self {
            role: Role::Assistant,
            content: response.response,
            timestamp: response.timestamp.unwrap_or_else(Utc::now),
            sources: response.sources.unwrap_or_default(),
            suggestions: response.suggestions.unwrap_or_default(),
            visualization: response.visualization,
            is_error: false,
        }
    }

    /// Build a message from a stored history record
    pub fn from_history(record: HistoryMessage) -> Self {
        Self {
            role: Role::from_wire(&record.role),
            content: record.content,
            timestamp: record.timestamp,
            sources: record.sources.unwrap_or_default(),
            suggestions: Vec::new(),
            visualization: record.visualization,
            is_error: false,
        }
    }
}

/// Why an exchange failed, recorded in logs alongside the error message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorContext {
    /// No response was received
    Transport(String),
    /// A failure status was returned
    Service(u16),
    /// The payload could not be used
    Malformed(String),
    /// The exchange exceeded the client-side timeout
    Timeout(u64),
    /// The user interrupted the exchange
    Interrupted,
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(detail) => write!(f, "transport failure: {}", detail),
            Self::Service(status) => write!(f, "service returned status {}", status),
            Self::Malformed(detail) => write!(f, "malformed response: {}", detail),
            Self::Timeout(secs) => write!(f, "timed out after {}s", secs),
            Self::Interrupted => write!(f, "interrupted by user"),
        }
    }
}

/// Ordered, append-only message log for one session
#[derive(Debug, Clone, Default)]
pub struct ConversationTimeline {
    messages: Vec<Message>,
}

impl ConversationTimeline {
    /// Create an empty timeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the user's message, stamped with the local clock
    ///
    /// Returns `None` without touching the log when the trimmed text is
    /// empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use docbot::timeline::ConversationTimeline;
    ///
    /// let mut timeline = ConversationTimeline::new();
    /// assert!(timeline.append_user("   ").is_none());
    /// assert!(timeline.append_user("How do I train a model?").is_some());
    /// assert_eq!(timeline.len(), 1);
    /// ```
    pub fn append_user(&mut self, text: &str) -> Option<&Message> {
        if text.trim().is_empty() {
            return None;
        }
        self.push(Message::new(Role::User, text, Utc::now()))
    }

    /// Append an answer from the service
    pub fn append_assistant(&mut self, response: ChatResponse) -> &Message {
        let message = Message::from_response(response);
        self.push_last(message)
    }

    /// Append the failure notice for an exchange that produced no answer
    pub fn append_error(&mut self, context: &ErrorContext) -> &Message {
        tracing::debug!("Appending error message ({})", context);
        let mut message = Message::new(Role::Assistant, ERROR_REMEDIATION, Utc::now());
        message.is_error = true;
        self.push_last(message)
    }

    /// Append a client-local system annotation
    pub fn append_system_annotation(&mut self, text: &str) -> &Message {
        self.push_last(Message::new(Role::System, text, Utc::now()))
    }

    /// Replace the whole log with server history, keeping server order
    pub fn replace(&mut self, messages: Vec<Message>) {
        tracing::debug!(
            "Replacing timeline ({} -> {} messages)",
            self.messages.len(),
            messages.len()
        );
        self.messages = messages;
    }

    /// Empty the log; used only by session reset
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// All messages in order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Most recent message
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Follow-up suggestions attached to the most recent answer
    pub fn latest_suggestions(&self) -> &[String] {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant && !m.is_error)
            .map(|m| m.suggestions.as_slice())
            .unwrap_or(&[])
    }

    /// The conversation so far, without client-local entries
    ///
    /// System annotations and failure notices never leave the client.
    pub fn conversation_context(&self) -> Vec<&Message> {
        self.messages
            .iter()
            .filter(|m| m.role != Role::System && !m.is_error)
            .collect()
    }

    fn push(&mut self, message: Message) -> Option<&Message> {
        self.messages.push(message);
        self.messages.last()
    }

    fn push_last(&mut self, message: Message) -> &Message {
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }
}
