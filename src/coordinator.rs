//! Conversation coordinator
//!
//! Composes the session, timeline, mode, tour, orchestrator and shortcut
//! components behind one interface so a host only deals with user intents.
//! All state transitions that span components live here:
//!
//! - resuming a session loads its history;
//! - a new session cancels in-flight work, clears the timeline and resets
//!   the tour;
//! - a tour deep dive leaves the tour view and asks the stage's question.

use crate::api::AnswerService;
use crate::config::Config;
use crate::error::Result;
use crate::mode::{default_catalog, ModeController, Route};
use crate::orchestrator::{
    FinishedExchange, HistoryOutcome, LoadingFlag, PendingExchange, Rejection,
    RequestOrchestrator, SendOutcome,
};
use crate::session::{Session, SessionIdentity, SessionStart};
use crate::shortcuts::{Dispatch, FocusContext, Shortcut, ShortcutDispatcher};
use crate::storage::KeyValueStore;
use crate::theme::ThemePreference;
use crate::timeline::ConversationTimeline;
use crate::tour::{Stage, TourScript, TourStateMachine, TourTransition};

use rustyline::KeyEvent;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Which view the host should render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveView {
    /// The guided tour at stage `i`
    Tour(usize),
    /// The conversation timeline
    Timeline,
}

/// What happened during [`Coordinator::start`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartReport {
    /// Whether a persisted session was resumed
    pub resumed: bool,
    /// History load result, for resumed sessions
    pub history: Option<HistoryOutcome>,
    /// Whether the mode catalog was refreshed from the service
    pub catalog_refreshed: bool,
}

/// Reaction to a global key chord
#[derive(Debug, Clone, PartialEq)]
pub enum KeyReaction {
    /// The host should move focus to the composer
    FocusComposer,
    /// A new session was started
    SessionReset(Session),
    /// The key was not a global shortcut
    PassThrough,
}

/// Top-level composition of the conversation components
pub struct Coordinator {
    identity: SessionIdentity,
    store: Arc<dyn KeyValueStore>,
    session: Session,
    timeline: ConversationTimeline,
    orchestrator: RequestOrchestrator,
    modes: ModeController,
    tour: TourStateMachine,
    tour_closed: Arc<AtomicBool>,
    shortcuts: ShortcutDispatcher,
    theme: ThemePreference,
}

impl Coordinator {
    /// Initialize the session and build every component
    ///
    /// A resumed session has its history loaded before this returns. When
    /// configured, the mode catalog is refreshed from the service; a failed
    /// refresh keeps the built-in catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails, the configured default mode is
    /// unknown, or the tour script cannot be loaded
    pub async fn start(
        config: &Config,
        service: Arc<dyn AnswerService>,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<(Self, StartReport)> {
        let identity = SessionIdentity::new(store.clone());
        let start = identity.initialize()?;
        let theme = ThemePreference::load(store.as_ref())?;

        let orchestrator = RequestOrchestrator::new(service.clone())
            .with_timeout(Duration::from_secs(config.service.timeout_seconds))
            .with_max_message_chars(config.chat.max_message_chars);

        let mut catalog = default_catalog();
        let mut catalog_refreshed = false;
        if config.chat.load_modes_from_service {
            match service.modes().await {
                Ok(offered) if !offered.modes.is_empty() => {
                    catalog = offered;
                    catalog_refreshed = true;
                }
                Ok(_) => tracing::warn!("Service offered no modes, keeping built-in catalog"),
                Err(e) => tracing::warn!("Failed to load modes from service: {}", e),
            }
        }

        let mut modes = if catalog_refreshed {
            ModeController::from_service_catalog(catalog, &config.chat.default_mode)?
        } else {
            ModeController::new(catalog, &config.chat.default_mode)?
        };

        if let Some(module) = &config.chat.default_module {
            modes = modes.with_module(module)?;
        }

        let script = match &config.tour.script {
            Some(path) => TourScript::from_file(path)?,
            None => TourScript::default(),
        };
        let tour_closed = Arc::new(AtomicBool::new(false));
        let flag = tour_closed.clone();
        let tour = TourStateMachine::new(script).with_exit_hook(move || {
            flag.store(true, Ordering::SeqCst);
        });

        let shortcuts = ShortcutDispatcher::from_chords(
            &config.shortcuts.focus_composer,
            &config.shortcuts.new_session,
        )?;

        let mut coordinator = Self {
            identity,
            store,
            session: start.session().clone(),
            timeline: ConversationTimeline::new(),
            orchestrator,
            modes,
            tour,
            tour_closed,
            shortcuts,
            theme,
        };

        let history = match start {
            SessionStart::Resumed(_) => Some(coordinator.load_history().await),
            SessionStart::Fresh(_) => None,
        };

        let report = StartReport {
            resumed: history.is_some(),
            history,
            catalog_refreshed,
        };
        Ok((coordinator, report))
    }

    /// Active session
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Conversation timeline
    pub fn timeline(&self) -> &ConversationTimeline {
        &self.timeline
    }

    /// Mode controller
    pub fn modes(&self) -> &ModeController {
        &self.modes
    }

    /// Tour state machine
    pub fn tour(&self) -> &TourStateMachine {
        &self.tour
    }

    /// Global shortcut bindings
    pub fn shortcuts(&self) -> &ShortcutDispatcher {
        &self.shortcuts
    }

    /// Current theme
    pub fn theme(&self) -> ThemePreference {
        self.theme
    }

    /// Shared loading flag
    pub fn loading_flag(&self) -> LoadingFlag {
        self.orchestrator.loading_flag()
    }

    /// Whether an exchange is in flight
    pub fn is_loading(&self) -> bool {
        self.orchestrator.is_loading()
    }

    /// The view the host should render now
    ///
    /// The tour is shown only while it is at a stage and nothing has been
    /// said yet; any message hides it.
    pub fn active_view(&self) -> ActiveView {
        match self.tour.state() {
            crate::tour::TourState::Stage(i) if self.timeline.is_empty() => ActiveView::Tour(i),
            _ => ActiveView::Timeline,
        }
    }

    /// Whether the tour closed since the last call
    pub fn take_tour_closed(&self) -> bool {
        self.tour_closed.swap(false, Ordering::SeqCst)
    }

    /// Replace the timeline with the active session's stored history
    pub async fn load_history(&mut self) -> HistoryOutcome {
        self.orchestrator
            .load_history(&mut self.timeline, &self.session)
            .await
    }

    /// Ask a question and wait for the answer
    pub async fn send(&mut self, text: &str) -> SendOutcome {
        let route = self.modes.route();
        self.orchestrator
            .send(&mut self.timeline, text, &self.session, &route)
            .await
    }

    /// First step of a send for hosts that keep handling input in flight
    ///
    /// # Errors
    ///
    /// Returns the [`Rejection`] when nothing was appended
    pub fn begin_send(&mut self, text: &str) -> std::result::Result<PendingExchange, Rejection> {
        let route: Route = self.modes.route();
        self.orchestrator
            .begin_send(&mut self.timeline, text, &self.session, &route)
    }

    /// The service that pending exchanges run against
    pub fn service(&self) -> Arc<dyn AnswerService> {
        self.orchestrator.service().clone()
    }

    /// Apply a finished exchange
    pub fn complete(&mut self, finished: FinishedExchange) -> SendOutcome {
        self.orchestrator
            .complete(&mut self.timeline, &self.session, finished)
    }

    /// Switch the query mode
    ///
    /// # Errors
    ///
    /// Returns `UnknownMode` for ids outside the catalog
    pub fn set_mode(&mut self, mode: &str) -> Result<bool> {
        self.modes.set_mode(mode, &mut self.timeline)
    }

    /// Select the scoping module
    ///
    /// # Errors
    ///
    /// Returns `ModuleNotAllowed` when the active mode takes no module or
    /// the module is not offered
    pub fn set_module(&mut self, module: &str) -> Result<bool> {
        self.modes.set_module(module, &mut self.timeline)
    }

    /// Begin the guided tour
    pub fn start_tour(&mut self) -> TourTransition {
        self.tour.start()
    }

    /// Continue to the next tour stage
    pub fn continue_tour(&mut self) -> TourTransition {
        self.tour.advance()
    }

    /// Revisit a reached stage or move one ahead
    pub fn jump_tour(&mut self, stage: usize) -> TourTransition {
        self.tour.jump(stage)
    }

    /// Stage currently shown by the tour
    pub fn current_stage(&self) -> Option<&Stage> {
        self.tour.current_stage()
    }

    /// Ask the current stage's deep-dive question
    ///
    /// Returns `None` when no stage is shown. The tour state is unchanged;
    /// the user message makes the timeline non-empty, which hides the tour.
    pub async fn deep_dive(&mut self) -> Option<SendOutcome> {
        let begun = self.begin_deep_dive()?;
        Some(self.drive(begun).await)
    }

    /// First step of [`Coordinator::deep_dive`] for hosts that keep
    /// handling input while the answer is pending
    pub fn begin_deep_dive(&mut self) -> Option<std::result::Result<PendingExchange, Rejection>> {
        let prompt = self.tour.deep_dive_prompt()?.to_string();
        tracing::info!("Tour deep dive: {}", prompt);
        Some(self.begin_send(&prompt))
    }

    /// Leave the tour to ask a free-form question
    pub fn ask_question(&mut self) -> TourTransition {
        self.tour.ask_question()
    }

    /// Leave the tour
    pub fn exit_tour(&mut self) -> TourTransition {
        self.tour.exit()
    }

    /// Start a new session
    ///
    /// Cancels in-flight work, persists a new token, empties the timeline and
    /// resets the tour. Mode and theme are kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the new token cannot be persisted; the current
    /// session is then left as it was
    pub fn reset_session(&mut self) -> Result<&Session> {
        let session = self.identity.reset()?;
        self.orchestrator.cancel_outstanding();
        self.session = session;
        self.timeline.clear();
        self.tour.reset();
        self.tour_closed.store(false, Ordering::SeqCst);
        Ok(&self.session)
    }

    /// Change and persist the theme
    ///
    /// # Errors
    ///
    /// Returns an error if the preference cannot be persisted
    pub fn set_theme(&mut self, theme: ThemePreference) -> Result<()> {
        theme.save(self.store.as_ref())?;
        self.theme = theme;
        Ok(())
    }

    /// React to a global key chord
    ///
    /// # Errors
    ///
    /// Returns an error if a triggered session reset fails
    pub fn handle_key(&mut self, key: KeyEvent, focus: FocusContext) -> Result<KeyReaction> {
        match self.shortcuts.dispatch(key, focus) {
            Dispatch::Handled(Shortcut::FocusComposer) => Ok(KeyReaction::FocusComposer),
            Dispatch::Handled(Shortcut::NewSession) => {
                let session = self.reset_session()?.clone();
                Ok(KeyReaction::SessionReset(session))
            }
            Dispatch::PassThrough => Ok(KeyReaction::PassThrough),
        }
    }

    /// Send the `n`-th (1-based) follow-up suggestion of the latest answer
    ///
    /// Returns `None` when there is no such suggestion.
    pub async fn send_suggestion(&mut self, n: usize) -> Option<SendOutcome> {
        let begun = self.begin_suggestion(n)?;
        Some(self.drive(begun).await)
    }

    /// First step of [`Coordinator::send_suggestion`]
    pub fn begin_suggestion(
        &mut self,
        n: usize,
    ) -> Option<std::result::Result<PendingExchange, Rejection>> {
        let suggestion = self
            .timeline
            .latest_suggestions()
            .get(n.checked_sub(1)?)?
            .clone();
        Some(self.begin_send(&suggestion))
    }

    async fn drive(&mut self, begun: std::result::Result<PendingExchange, Rejection>) -> SendOutcome {
        match begun {
            Ok(pending) => {
                let service = self.service();
                let finished = pending.run(service.as_ref()).await;
                self.complete(finished)
            }
            Err(rejection) => SendOutcome::Rejected(rejection),
        }
    }
}
