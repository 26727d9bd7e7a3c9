/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

- `chat`: Interactive conversation with tour, modes and shortcuts
- `history`: Print a session's stored history
- `modes`: List modes and check service health
- `session`: Show, reset or delete the persisted session
*/

use crate::api::HttpAnswerService;
use crate::config::Config;
use crate::error::Result;
use crate::storage::{KeyValueStore, MemoryStore, SqliteStore};
use crate::theme::ThemePreference;
use crate::timeline::{Message, Role};
use colored::Colorize;
use std::sync::Arc;

// Special commands parser for the interactive loop
pub mod special_commands;

// Stored history inspection
pub mod history;

// Mode catalog and health
pub mod modes;

// Session management
pub mod session;

/// Open the client state store
///
/// `ephemeral` keeps everything in memory; otherwise the SQLite store at
/// `state_db` (or its default location) is used.
///
/// # Errors
///
/// Returns a storage error if the database cannot be opened
pub fn open_store(state_db: Option<&str>, ephemeral: bool) -> Result<Arc<dyn KeyValueStore>> {
    if ephemeral {
        tracing::info!("Using in-memory client state");
        return Ok(Arc::new(MemoryStore::new()));
    }
    let store = match state_db {
        Some(path) => SqliteStore::new_with_path(path)?,
        None => SqliteStore::new()?,
    };
    tracing::debug!("Using client state at {}", store.path().display());
    Ok(Arc::new(store))
}

/// Build the HTTP answer service from configuration
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built
pub fn connect(config: &Config) -> Result<Arc<HttpAnswerService>> {
    Ok(Arc::new(HttpAnswerService::new(&config.service)?))
}

/// Print one timeline message
pub fn print_message(message: &Message, theme: ThemePreference) {
    let time = message.timestamp.format("%H:%M");
    match message.role {
        Role::System => {
            println!("{}", theme.annotation(&format!("  · {} ({})", message.content, time)));
            return;
        }
        Role::User => println!("{} {}", theme.user("You"), time.to_string().dimmed()),
        Role::Assistant if message.is_error => {
            println!("{} {}", theme.error("DocBot"), time.to_string().dimmed());
            println!("{}\n", theme.error(&message.content));
            return;
        }
        Role::Assistant => println!("{} {}", theme.assistant("DocBot"), time.to_string().dimmed()),
    }

    println!("{}", message.content);

    if let Some(visualization) = &message.visualization {
        let kind = visualization
            .get("type")
            .and_then(|t| t.as_str())
            .unwrap_or("diagram");
        println!("{}", theme.muted(&format!("[{} attached]", kind)));
    }

    if !message.sources.is_empty() {
        let labels: Vec<String> = message.sources.iter().map(|s| s.label()).collect();
        println!("{} {}", theme.muted("Sources:"), labels.join(", "));
    }

    if !message.suggestions.is_empty() {
        println!("{}", theme.muted("Follow-ups (/suggest <n>):"));
        for (i, suggestion) in message.suggestions.iter().enumerate() {
            println!("  {}. {}", i + 1, suggestion);
        }
    }
    println!();
}

// Chat command handler
pub mod chat {
    //! Interactive chat mode handler.
    //!
    //! Builds a [`Coordinator`] over the HTTP answer service and the client
    //! state store, then runs a readline loop. Plain lines are questions;
    //! lines starting with `/` are client commands. The new-session chord is
    //! bound in the line editor; Ctrl+C cancels a pending answer.

    use super::*;
    use crate::commands::special_commands::{parse_special_command, print_help, SpecialCommand};
    use crate::coordinator::{ActiveView, Coordinator, KeyReaction, StartReport};
    use crate::orchestrator::{HistoryOutcome, PendingExchange, Rejection, SendOutcome};
    use crate::shortcuts::{composer_key, ComposerAction, FocusContext};
    use crate::tour::TourTransition;
    use rustyline::error::ReadlineError;
    use rustyline::{
        Cmd, ConditionalEventHandler, DefaultEditor, Event, EventContext, EventHandler, KeyCode,
        KeyEvent, Modifiers, RepeatCount,
    };
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Options for an interactive session
    #[derive(Debug, Clone, Default)]
    pub struct ChatOptions {
        /// Initial mode override
        pub mode: Option<String>,
        /// Initial module override
        pub module: Option<String>,
        /// Open the tour immediately
        pub tour: bool,
        /// Keep client state in memory only
        pub ephemeral: bool,
        /// Client state database override
        pub state_db: Option<String>,
    }

    /// Turns the new-session chord into an interrupt the loop can recognize
    struct NewSessionChord {
        requested: Arc<AtomicBool>,
    }

    impl ConditionalEventHandler for NewSessionChord {
        fn handle(
            &self,
            _evt: &Event,
            _n: RepeatCount,
            _positive: bool,
            _ctx: &EventContext,
        ) -> Option<Cmd> {
            self.requested.store(true, Ordering::SeqCst);
            Some(Cmd::Interrupt)
        }
    }

    /// Start interactive chat mode
    ///
    /// # Errors
    ///
    /// Returns an error if the store, the service client or the line editor
    /// cannot be initialized
    pub async fn run_chat(mut config: Config, options: ChatOptions) -> Result<()> {
        if let Some(mode) = &options.mode {
            config.chat.default_mode = mode.clone();
        }
        if let Some(module) = &options.module {
            config.chat.default_module = Some(module.clone());
        }

        let store = open_store(options.state_db.as_deref(), options.ephemeral)?;
        let service = connect(&config)?;
        let (mut coordinator, report) = Coordinator::start(&config, service, store).await?;

        let mut rl = DefaultEditor::new()?;
        let reset_requested = Arc::new(AtomicBool::new(false));
        rl.bind_sequence(
            coordinator.shortcuts().new_session_chord(),
            EventHandler::Conditional(Box::new(NewSessionChord {
                requested: reset_requested.clone(),
            })),
        );
        for chord in [
            KeyEvent(KeyCode::Enter, Modifiers::ALT),
            KeyEvent(KeyCode::Enter, Modifiers::SHIFT),
        ] {
            if composer_key(chord) == ComposerAction::InsertNewline {
                rl.bind_sequence(chord, Cmd::Newline);
            }
        }

        print_welcome_banner(&config, &coordinator, &report);
        for message in coordinator.timeline().messages() {
            print_message(message, coordinator.theme());
        }

        if options.tour {
            coordinator.start_tour();
        }
        render_view(&coordinator);

        loop {
            let prompt = coordinator.modes().format_colored_prompt();
            match rl.readline(&prompt) {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    rl.add_history_entry(line.as_str())?;

                    let command = match parse_special_command(&line) {
                        Ok(command) => command,
                        Err(e) => {
                            println!("{}\n", e.to_string().red());
                            continue;
                        }
                    };

                    match command {
                        SpecialCommand::Exit => break,
                        SpecialCommand::None => {
                            if coordinator.tour().is_active() {
                                coordinator.ask_question();
                            }
                            let begun = coordinator.begin_send(&line);
                            ask(&mut coordinator, begun).await;
                        }
                        other => handle_command(&mut coordinator, other).await?,
                    }

                    if coordinator.take_tour_closed() {
                        println!("{}\n", "Tour closed. Ask anything about the platform.".green());
                    }
                    render_view(&coordinator);
                }
                Err(ReadlineError::Interrupted) if reset_requested.swap(false, Ordering::SeqCst) => {
                    let chord = coordinator.shortcuts().new_session_chord();
                    if let KeyReaction::SessionReset(session) =
                        coordinator.handle_key(chord, FocusContext::Editable)?
                    {
                        print_new_session(&session.token());
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    break;
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    /// Wait for a begun exchange, letting Ctrl+C cancel the pending answer
    async fn ask(coordinator: &mut Coordinator, begun: std::result::Result<PendingExchange, Rejection>) {
        let pending = match begun {
            Ok(pending) => pending,
            Err(rejection) => {
                report_rejection(coordinator, rejection);
                return;
            }
        };

        println!("{}", "Thinking... (Ctrl+C to cancel)".dimmed());
        let cancel = pending.cancel_token();
        let interrupt = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
        let service = coordinator.service();
        let finished = pending.run(service.as_ref()).await;
        interrupt.abort();

        match coordinator.complete(finished) {
            SendOutcome::Answered(message) | SendOutcome::Failed(message) => {
                print_message(&message, coordinator.theme());
            }
            SendOutcome::Discarded => tracing::debug!("Answer discarded after session change"),
            SendOutcome::Rejected(rejection) => report_rejection(coordinator, rejection),
        }
    }

    fn report_rejection(coordinator: &Coordinator, rejection: Rejection) {
        match rejection {
            Rejection::Empty => {}
            Rejection::TooLong => println!(
                "{}\n",
                coordinator
                    .theme()
                    .error("That question is too long. Please shorten it and try again.")
            ),
            Rejection::Busy => println!(
                "{}\n",
                "Still waiting for the previous answer.".yellow()
            ),
        }
    }

    async fn handle_command(coordinator: &mut Coordinator, command: SpecialCommand) -> Result<()> {
        let theme = coordinator.theme();
        match command {
            SpecialCommand::StartTour => {
                if coordinator.start_tour() == TourTransition::Rejected {
                    println!(
                        "{}\n",
                        "The tour can be taken once per session. Use /new to start over.".yellow()
                    );
                } else if !coordinator.timeline().is_empty() {
                    println!(
                        "{}\n",
                        "The tour is only shown before the conversation starts. Use /new to start over."
                            .yellow()
                    );
                }
            }
            SpecialCommand::NextStage => {
                if coordinator.continue_tour() == TourTransition::Rejected {
                    println!("{}\n", "The tour is not open. Type /tour to start it.".yellow());
                }
            }
            SpecialCommand::JumpStage(stage) => {
                if coordinator.jump_tour(stage - 1) == TourTransition::Rejected {
                    println!(
                        "{}\n",
                        "You can revisit earlier stages or move one stage ahead.".yellow()
                    );
                }
            }
            SpecialCommand::DeepDive => match coordinator.begin_deep_dive() {
                Some(begun) => ask(coordinator, begun).await,
                None => println!("{}\n", "The tour is not open.".yellow()),
            },
            SpecialCommand::SkipTour => {
                coordinator.exit_tour();
            }
            SpecialCommand::SwitchMode(mode) => match coordinator.set_mode(&mode) {
                Ok(true) => print_last_annotation(coordinator),
                Ok(false) => println!("Already in {} mode\n", mode),
                Err(e) => println!("{}\n", theme.error(&e.to_string())),
            },
            SpecialCommand::SelectModule(module) => match coordinator.set_module(&module) {
                Ok(true) => print_last_annotation(coordinator),
                Ok(false) => println!("Module already selected\n"),
                Err(e) => println!("{}\n", theme.error(&e.to_string())),
            },
            SpecialCommand::ListModes => {
                super::modes::print_catalog(coordinator.modes().catalog(), Some(coordinator.modes().mode()));
            }
            SpecialCommand::NewSession => {
                let session = coordinator.reset_session()?;
                print_new_session(&session.token());
            }
            SpecialCommand::ShowStatus => print_status_display(coordinator),
            SpecialCommand::SwitchTheme(new_theme) => {
                coordinator.set_theme(new_theme)?;
                println!("Theme set to {}\n", new_theme);
            }
            SpecialCommand::Transcript => {
                let context = coordinator.timeline().conversation_context();
                if context.is_empty() {
                    println!("{}\n", "Nothing has been said yet.".dimmed());
                }
                for message in context {
                    print_message(message, theme);
                }
            }
            SpecialCommand::Suggest(n) => match coordinator.begin_suggestion(n) {
                Some(begun) => ask(coordinator, begun).await,
                None => println!("{}\n", "No such suggestion.".yellow()),
            },
            SpecialCommand::Help => print_help(),
            SpecialCommand::Exit | SpecialCommand::None => {}
        }
        Ok(())
    }

    fn print_last_annotation(coordinator: &Coordinator) {
        if let Some(message) = coordinator.timeline().last() {
            print_message(message, coordinator.theme());
        }
    }

    fn print_new_session(token: &str) {
        println!(
            "\n{} {}\n",
            "Started a new session:".green(),
            token.cyan()
        );
    }

    /// Render the guided tour card when the tour view is active
    fn render_view(coordinator: &Coordinator) {
        let ActiveView::Tour(index) = coordinator.active_view() else {
            return;
        };
        let Some(stage) = coordinator.current_stage() else {
            return;
        };
        let total = coordinator.tour().script().len();
        let progress: String = (0..total)
            .map(|i| if i <= index { '●' } else { '○' })
            .collect();

        println!("\n{}  {}", progress.cyan(), format!("Stage {}/{}", index + 1, total).dimmed());
        println!("{}\n", stage.title.bold());
        println!("{}\n", stage.body);
        println!(
            "  {} {}   {} {}   {} {}\n",
            "/next".cyan(),
            stage.continue_label,
            "/deep".cyan(),
            "Tell me more",
            "/skip".cyan(),
            "Ask my own question"
        );
    }

    /// Display welcome banner at the start of interactive chat mode
    fn print_welcome_banner(config: &Config, coordinator: &Coordinator, report: &StartReport) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║              DocBot Interactive Chat - Welcome!              ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!("Client:  {}", config.client.tenant.bold());
        println!("Service: {}", config.service.base_url);
        println!("Mode:    {}", coordinator.modes().format_colored_prompt().trim_end());
        match report.history {
            Some(HistoryOutcome::Loaded(n)) => {
                println!("Session: {} (resumed, {} messages)", coordinator.session(), n)
            }
            Some(_) => println!(
                "Session: {} (resumed, history unavailable)",
                coordinator.session()
            ),
            None => println!("Session: {} (new)", coordinator.session()),
        }
        println!("\nType '/help' for commands, '/tour' for the guided tour, 'exit' to quit\n");
    }

    /// Display session status, shown for `/status`
    fn print_status_display(coordinator: &Coordinator) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                     DocBot Session Status                    ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!("Session:           {}", coordinator.session());
        println!(
            "Started:           {}",
            coordinator.session().created_locally.format("%Y-%m-%d %H:%M")
        );
        println!("Mode:              {}", coordinator.modes().mode());
        println!(
            "Module:            {}",
            coordinator.modes().module().unwrap_or("-")
        );
        println!("Tour:              {}", coordinator.tour().state());
        println!("Conversation Size: {} messages", coordinator.timeline().len());
        println!("Theme:             {}", coordinator.theme());
        println!("Prompt Format:     {}", coordinator.modes().format_colored_prompt());
        println!();
    }
}
