//! DocBot - conversational documentation client library
//!
//! This library provides the client side of a documentation assistant: a
//! durable session identity, an append-only conversation timeline, a guided
//! tour, query-mode routing, and a single-flight request orchestrator in
//! front of a remote answer service.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `session`: Persisted session token lifecycle
//! - `timeline`: Ordered, append-only message log
//! - `tour`: Guided tour state machine and script
//! - `mode`: Query mode and module routing
//! - `orchestrator`: Question → answer exchange lifecycle
//! - `shortcuts`: Global key chords and composer keys
//! - `coordinator`: Composition of the components above
//! - `api`: Answer service contract and HTTP client
//! - `storage`: Client-local key-value persistence
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use docbot::api::HttpAnswerService;
//! use docbot::storage::SqliteStore;
//! use docbot::{Config, Coordinator};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let service = Arc::new(HttpAnswerService::new(&config.service)?);
//!     let store = Arc::new(SqliteStore::new()?);
//!     let (mut coordinator, _) = Coordinator::start(&config, service, store).await?;
//!     coordinator.send("How do I train a Digital Twin?").await;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod mode;
pub mod orchestrator;
pub mod session;
pub mod shortcuts;
pub mod storage;
pub mod theme;
pub mod timeline;
pub mod tour;

// Re-export commonly used types
pub use config::Config;
pub use coordinator::{ActiveView, Coordinator};
pub use error::{DocbotError, Result};
pub use mode::ModeController;
pub use orchestrator::{RequestOrchestrator, SendOutcome};
pub use session::{Session, SessionIdentity};
pub use timeline::{ConversationTimeline, Message, Role};
pub use tour::{TourStateMachine, TourTransition};

#[cfg(test)]
pub mod test_utils;
