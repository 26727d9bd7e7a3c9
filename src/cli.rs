//! Command-line interface definition for DocBot
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for interactive chat, history inspection, and
//! session management.

use clap::{Parser, Subcommand};

/// DocBot - conversational documentation assistant
///
/// Ask questions about the platform documentation, take the guided tour,
/// and pick up previous conversations where you left off.
#[derive(Parser, Debug, Clone)]
#[command(name = "docbot")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Path to the client state database (overrides DOCBOT_STATE_DB)
    #[arg(long, env = "DOCBOT_STATE_DB")]
    pub state_db: Option<String>,

    /// Override the answer service base URL
    #[arg(long)]
    pub api_url: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for DocBot
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive conversation
    Chat {
        /// Initial query mode (e.g. full_overview, module_deep_dive, general)
        #[arg(short, long)]
        mode: Option<String>,

        /// Scoping module for module-scoped modes
        #[arg(long)]
        module: Option<String>,

        /// Open the guided tour on start
        #[arg(short, long)]
        tour: bool,

        /// Keep client state in memory only
        #[arg(long)]
        ephemeral: bool,
    },

    /// Print the stored history of a session
    History {
        /// Session token (defaults to the persisted session)
        #[arg(short, long)]
        session: Option<String>,

        /// Output raw JSON
        #[arg(short, long)]
        json: bool,
    },

    /// List the query modes offered by the service
    Modes,

    /// Check answer service health
    Health,

    /// Manage the persisted session
    Session {
        /// Session subcommand
        #[command(subcommand)]
        command: SessionCommand,
    },
}

/// Session management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum SessionCommand {
    /// Show the persisted session token
    Show,

    /// Start a new session; the old history stays on the server
    Reset,

    /// Delete a session's history on the server
    Delete {
        /// Session token (defaults to the persisted session)
        #[arg(short, long)]
        id: Option<String>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            state_db: None,
            api_url: None,
            command: Commands::Chat {
                mode: None,
                module: None,
                tour: false,
                ephemeral: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default() {
        let cli = Cli::default();
        assert_eq!(cli.config, Some("config/config.yaml".to_string()));
        assert!(!cli.verbose);
        assert!(matches!(cli.command, Commands::Chat { tour: false, .. }));
    }

    #[test]
    fn test_cli_parse_chat_command() {
        let cli = Cli::try_parse_from(["docbot", "chat"]).unwrap();
        assert!(matches!(cli.command, Commands::Chat { .. }));
    }

    #[test]
    fn test_cli_parse_chat_with_options() {
        let cli = Cli::try_parse_from([
            "docbot",
            "chat",
            "--mode",
            "module_deep_dive",
            "--module",
            "UE Tracks",
            "--tour",
            "--ephemeral",
        ])
        .unwrap();
        match cli.command {
            Commands::Chat {
                mode,
                module,
                tour,
                ephemeral,
            } => {
                assert_eq!(mode.as_deref(), Some("module_deep_dive"));
                assert_eq!(module.as_deref(), Some("UE Tracks"));
                assert!(tour);
                assert!(ephemeral);
            }
            _ => panic!("Expected Chat command"),
        }
    }

    #[test]
    fn test_cli_parse_history_with_session() {
        let cli = Cli::try_parse_from(["docbot", "history", "--session", "abc", "--json"]).unwrap();
        match cli.command {
            Commands::History { session, json } => {
                assert_eq!(session.as_deref(), Some("abc"));
                assert!(json);
            }
            _ => panic!("Expected History command"),
        }
    }

    #[test]
    fn test_cli_parse_session_subcommands() {
        let cli = Cli::try_parse_from(["docbot", "session", "show"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Session {
                command: SessionCommand::Show
            }
        ));

        let cli = Cli::try_parse_from(["docbot", "session", "delete", "--id", "xyz"]).unwrap();
        match cli.command {
            Commands::Session {
                command: SessionCommand::Delete { id },
            } => assert_eq!(id.as_deref(), Some("xyz")),
            _ => panic!("Expected Session Delete command"),
        }
    }

    #[test]
    fn test_cli_global_flags() {
        let cli = Cli::try_parse_from([
            "docbot",
            "-v",
            "--config",
            "custom.yaml",
            "--state-db",
            "/tmp/state.db",
            "--api-url",
            "http://docs.internal/api/v1",
            "modes",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config.as_deref(), Some("custom.yaml"));
        assert_eq!(cli.state_db.as_deref(), Some("/tmp/state.db"));
        assert_eq!(cli.api_url.as_deref(), Some("http://docs.internal/api/v1"));
        assert!(matches!(cli.command, Commands::Modes));
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["docbot"]).is_err());
    }
}
