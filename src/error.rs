//! Error types for DocBot
//!
//! This module defines all error types used throughout the client,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for DocBot operations
///
/// Covers configuration loading, the answer-service boundary, client-local
/// storage, and the conversation state machines.
#[derive(Error, Debug)]
pub enum DocbotError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// No response was received from the answer service
    #[error("Transport error: {0}")]
    Transport(String),

    /// The answer service responded with a failure status
    #[error("Service error: status={status}, {message}")]
    Service {
        /// HTTP status code returned by the service
        status: u16,
        /// Body or reason text returned with the status
        message: String,
    },

    /// The answer service responded but the payload was unusable
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The exchange did not complete within the configured timeout
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    /// The exchange was cancelled before it completed
    #[error("Request cancelled: {0}")]
    Cancelled(String),

    /// Client-local key-value storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Mode id is not part of the deployment's mode set
    #[error("Unknown mode: {0}")]
    UnknownMode(String),

    /// A scoping module was selected where it is not allowed
    #[error("Module not allowed: {0}")]
    ModuleNotAllowed(String),

    /// Tour script or tour transition errors
    #[error("Tour error: {0}")]
    Tour(String),

    /// The operation is not offered by this answer service
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Line editor errors
    #[error("Readline error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),
}

impl DocbotError {
    /// Short category label used in logs when an exchange fails
    ///
    /// Categories are logged only; the user always sees the same
    /// remediation text regardless of the category.
    ///
    /// # Examples
    ///
    /// ```
    /// use docbot::error::DocbotError;
    ///
    /// assert_eq!(DocbotError::Timeout(30).category(), "timeout");
    /// ```
    pub fn category(&self) -> &'static str {
        match self {
            Self::Transport(_) | Self::Http(_) => "transport",
            Self::Service { .. } => "service",
            Self::MalformedResponse(_) | Self::Serialization(_) => "malformed",
            Self::Timeout(_) => "timeout",
            Self::Cancelled(_) => "cancelled",
            _ => "internal",
        }
    }
}

/// Result type alias for DocBot operations
///
/// Uses `anyhow::Error` so callers can add context freely; library code
/// raises [`DocbotError`] values and callers classify with `downcast_ref`.
pub type Result<T> = anyhow::Result<T>;
