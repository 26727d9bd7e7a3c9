//! Question → answer exchange lifecycle
//!
//! The orchestrator drives exactly one outbound exchange at a time. It owns
//! the global loading flag, bounds every exchange with a timeout, ties each
//! exchange to the session that issued it through a cancellation token, and
//! collapses every failure into one error entry on the timeline.
//!
//! An exchange is split into three steps so a host can keep handling input
//! while the request is in flight:
//!
//! 1. [`RequestOrchestrator::begin_send`] validates, appends the user
//!    message, and acquires the loading flag;
//! 2. [`PendingExchange::run`] performs the network call;
//! 3. [`RequestOrchestrator::complete`] applies the result, unless the
//!    session changed in the meantime.
//!
//! [`RequestOrchestrator::send`] chains the three for callers that simply
//! await the answer.

use crate::api::{AnswerService, ChatRequest, ChatResponse};
use crate::error::DocbotError;
use crate::mode::Route;
use crate::session::Session;
use crate::timeline::{ConversationTimeline, ErrorContext, Message};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Server-side limit on question length
pub const DEFAULT_MAX_MESSAGE_CHARS: usize = 2000;

/// Default client-side bound on one exchange
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Shared view of the global loading flag
///
/// Hosts clone this to render a busy indicator or disable the send
/// affordance; only the orchestrator can raise it.
#[derive(Debug, Clone, Default)]
pub struct LoadingFlag(Arc<AtomicBool>);

impl LoadingFlag {
    /// Whether an exchange is in flight
    pub fn is_loading(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn try_acquire(&self) -> Option<LoadingGuard> {
        self.0
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| LoadingGuard(self.0.clone()))
    }
}

/// Holds the loading flag; releases it when dropped on any exit path
#[derive(Debug)]
pub struct LoadingGuard(Arc<AtomicBool>);

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Why a send did not produce an exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Empty or whitespace-only input
    Empty,
    /// Input longer than the configured limit
    TooLong,
    /// Another exchange is in flight
    Busy,
}

/// Final disposition of a send
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// Nothing was appended and no request was made
    Rejected(Rejection),
    /// The answer was appended
    Answered(Message),
    /// The error notice was appended
    Failed(Message),
    /// The session changed while in flight; the result was dropped
    Discarded,
}

impl SendOutcome {
    /// Whether an answer was appended
    pub fn is_answered(&self) -> bool {
        matches!(self, Self::Answered(_))
    }
}

/// Raw result of the network step
#[derive(Debug)]
pub enum ExchangeResult {
    /// The service answered
    Answered(ChatResponse),
    /// The exchange failed
    Failed(ErrorContext),
    /// The exchange was cancelled before completing
    Cancelled,
}

/// An exchange whose user message is on the timeline and whose request has
/// not been issued yet
#[derive(Debug)]
pub struct PendingExchange {
    request: ChatRequest,
    session_id: Uuid,
    cancel: CancellationToken,
    timeout: Duration,
    guard: LoadingGuard,
}

impl PendingExchange {
    /// The request that will be sent
    pub fn request(&self) -> &ChatRequest {
        &self.request
    }

    /// Token that aborts this exchange when cancelled
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Issue the request and wait for its result
    ///
    /// Resolves early with [`ExchangeResult::Cancelled`] if the token is
    /// cancelled, and with a timeout failure if the service is too slow.
    pub async fn run(self, service: &dyn AnswerService) -> FinishedExchange {
        let Self {
            request,
            session_id,
            cancel,
            timeout,
            guard,
        } = self;

        let result = tokio::select! {
            _ = cancel.cancelled() => ExchangeResult::Cancelled,
            outcome = tokio::time::timeout(timeout, service.chat(&request)) => match outcome {
                Ok(Ok(response)) => ExchangeResult::Answered(response),
                Ok(Err(err)) => ExchangeResult::Failed(classify(&err)),
                Err(_) => ExchangeResult::Failed(ErrorContext::Timeout(timeout.as_secs())),
            },
        };

        FinishedExchange {
            session_id,
            result,
            _guard: guard,
        }
    }
}

/// A completed network step waiting to be applied to the timeline
#[derive(Debug)]
pub struct FinishedExchange {
    session_id: Uuid,
    result: ExchangeResult,
    _guard: LoadingGuard,
}

impl FinishedExchange {
    /// The raw result
    pub fn result(&self) -> &ExchangeResult {
        &self.result
    }
}

/// Outcome of a history load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryOutcome {
    /// The timeline was replaced with `n` messages
    Loaded(usize),
    /// The fetch failed; the timeline is unchanged
    Unavailable,
    /// The session changed while loading; the result was dropped
    Discarded,
}

/// Driver of the single outbound exchange
pub struct RequestOrchestrator {
    service: Arc<dyn AnswerService>,
    loading: LoadingFlag,
    cancel: CancellationToken,
    timeout: Duration,
    max_message_chars: usize,
}

impl RequestOrchestrator {
    /// Create an orchestrator over an answer service
    pub fn new(service: Arc<dyn AnswerService>) -> Self {
        Self {
            service,
            loading: LoadingFlag::default(),
            cancel: CancellationToken::new(),
            timeout: DEFAULT_TIMEOUT,
            max_message_chars: DEFAULT_MAX_MESSAGE_CHARS,
        }
    }

    /// Override the per-exchange timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the question length limit
    pub fn with_max_message_chars(mut self, max: usize) -> Self {
        self.max_message_chars = max;
        self
    }

    /// Shared handle to the loading flag
    pub fn loading_flag(&self) -> LoadingFlag {
        self.loading.clone()
    }

    /// Whether an exchange is in flight
    pub fn is_loading(&self) -> bool {
        self.loading.is_loading()
    }

    /// The answer service
    pub fn service(&self) -> &Arc<dyn AnswerService> {
        &self.service
    }

    /// Validate, append the user message, and reserve the loading flag
    ///
    /// # Errors
    ///
    /// Returns the [`Rejection`] when nothing was appended
    pub fn begin_send(
        &self,
        timeline: &mut ConversationTimeline,
        text: &str,
        session: &Session,
        route: &Route,
    ) -> Result<PendingExchange, Rejection> {
        if text.trim().is_empty() {
            return Err(Rejection::Empty);
        }
        if text.chars().count() > self.max_message_chars {
            tracing::warn!(
                "Rejecting message of {} chars (limit {})",
                text.chars().count(),
                self.max_message_chars
            );
            return Err(Rejection::TooLong);
        }
        let guard = self.loading.try_acquire().ok_or_else(|| {
            tracing::debug!("Send rejected: an exchange is already in flight");
            Rejection::Busy
        })?;

        timeline.append_user(text).ok_or(Rejection::Empty)?;

        Ok(PendingExchange {
            request: ChatRequest {
                message: text.to_string(),
                session_id: session.token(),
                mode: route.mode.clone(),
                module: route.module.clone(),
            },
            session_id: session.id,
            cancel: self.cancel.child_token(),
            timeout: self.timeout,
            guard,
        })
    }

    /// Apply a finished exchange to the active session's timeline
    ///
    /// Results from a session other than `session` are discarded. The
    /// loading flag is released when this returns.
    pub fn complete(
        &self,
        timeline: &mut ConversationTimeline,
        session: &Session,
        finished: FinishedExchange,
    ) -> SendOutcome {
        let FinishedExchange {
            session_id,
            result,
            _guard,
        } = finished;

        if session_id != session.id {
            tracing::warn!(
                "Discarding response for stale session {} (active {})",
                session_id,
                session.id
            );
            return SendOutcome::Discarded;
        }

        match result {
            ExchangeResult::Answered(response) => {
                tracing::info!("Answer received for session {}", session_id);
                SendOutcome::Answered(timeline.append_assistant(response).clone())
            }
            ExchangeResult::Failed(context) => {
                tracing::error!("Exchange failed for session {}: {}", session_id, context);
                SendOutcome::Failed(timeline.append_error(&context).clone())
            }
            ExchangeResult::Cancelled => {
                tracing::warn!("Exchange interrupted for session {}", session_id);
                SendOutcome::Failed(timeline.append_error(&ErrorContext::Interrupted).clone())
            }
        }
    }

    /// Send one question and wait for the answer
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use docbot::api::HttpAnswerService;
    /// use docbot::config::ServiceConfig;
    /// use docbot::mode::Route;
    /// use docbot::orchestrator::RequestOrchestrator;
    /// use docbot::session::Session;
    /// use docbot::timeline::ConversationTimeline;
    /// use std::sync::Arc;
    ///
    /// # async fn example() -> docbot::error::Result<()> {
    /// let service = Arc::new(HttpAnswerService::new(&ServiceConfig::default())?);
    /// let orchestrator = RequestOrchestrator::new(service);
    /// let mut timeline = ConversationTimeline::new();
    /// let route = Route { mode: "general".into(), module: None };
    /// orchestrator
    ///     .send(&mut timeline, "Hello", &Session::generate(), &route)
    ///     .await;
    /// assert_eq!(timeline.len(), 2);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn send(
        &self,
        timeline: &mut ConversationTimeline,
        text: &str,
        session: &Session,
        route: &Route,
    ) -> SendOutcome {
        let pending = match self.begin_send(timeline, text, session, route) {
            Ok(pending) => pending,
            Err(rejection) => return SendOutcome::Rejected(rejection),
        };
        let finished = pending.run(self.service.as_ref()).await;
        self.complete(timeline, session, finished)
    }

    /// Replace the timeline with the session's stored history
    ///
    /// A failed fetch leaves the timeline untouched.
    pub async fn load_history(
        &self,
        timeline: &mut ConversationTimeline,
        session: &Session,
    ) -> HistoryOutcome {
        let cancel = self.cancel.child_token();
        let token = session.token();
        let fetch = tokio::time::timeout(self.timeout, self.service.history(&token));

        let outcome = tokio::select! {
            _ = cancel.cancelled() => return HistoryOutcome::Discarded,
            outcome = fetch => outcome,
        };

        match outcome {
            Ok(Ok(records)) => {
                let messages: Vec<Message> = records.into_iter().map(Message::from_history).collect();
                let count = messages.len();
                timeline.replace(messages);
                tracing::info!("Loaded {} history messages for session {}", count, session.id);
                HistoryOutcome::Loaded(count)
            }
            Ok(Err(err)) => {
                tracing::warn!("History unavailable for session {}: {}", session.id, err);
                HistoryOutcome::Unavailable
            }
            Err(_) => {
                tracing::warn!("History load for session {} timed out", session.id);
                HistoryOutcome::Unavailable
            }
        }
    }

    /// Cancel every outstanding exchange; used on session reset
    pub fn cancel_outstanding(&mut self) {
        self.cancel.cancel();
        self.cancel = CancellationToken::new();
        tracing::debug!("Cancelled outstanding exchanges");
    }
}

/// Map a service error onto a logged failure category
fn classify(err: &anyhow::Error) -> ErrorContext {
    match err.downcast_ref::<DocbotError>() {
        Some(DocbotError::Service { status, .. }) => ErrorContext::Service(*status),
        Some(DocbotError::MalformedResponse(detail)) => ErrorContext::Malformed(detail.clone()),
        Some(DocbotError::Serialization(e)) => ErrorContext::Malformed(e.to_string()),
        Some(DocbotError::Timeout(secs)) => ErrorContext::Timeout(*secs),
        Some(other) => ErrorContext::Transport(other.to_string()),
        None => ErrorContext::Transport(err.to_string()),
    }
}
