//! Special commands parser for interactive chat mode
//!
//! Lines starting with `/` are client commands rather than questions. They
//! drive the guided tour, switch modes, start a new session, and show
//! status. Command words are case-insensitive; arguments keep their case so
//! module names such as `UE Tracks` round-trip unchanged.

use crate::theme::ThemePreference;
use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an unsupported argument
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// Special commands that can be executed during interactive chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Open the guided tour
    StartTour,

    /// Continue to the next tour stage
    NextStage,

    /// Jump to a tour stage (1-based as typed)
    JumpStage(usize),

    /// Ask the current stage's deep-dive question
    DeepDive,

    /// Leave the tour
    SkipTour,

    /// Switch the query mode
    SwitchMode(String),

    /// Select the scoping module
    SelectModule(String),

    /// List the available modes and modules
    ListModes,

    /// Start a new session
    NewSession,

    /// Show session, mode and tour status
    ShowStatus,

    /// Change the display theme
    SwitchTheme(ThemePreference),

    /// Print the conversation so far
    Transcript,

    /// Ask the n-th follow-up suggestion (1-based)
    Suggest(usize),

    /// Display help information
    Help,

    /// Exit the interactive session
    Exit,

    /// Not a special command
    ///
    /// The input should be sent as a question.
    None,
}

/// Parse a user input string into a special command
///
/// # Errors
///
/// Returns CommandError::UnknownCommand if input starts with "/" but is not a valid command.
/// Returns CommandError::UnsupportedArgument if a command receives an invalid argument.
/// Returns CommandError::MissingArgument if a command requires an argument but none was provided.
///
/// # Examples
///
/// ```
/// use docbot::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// let cmd = parse_special_command("/module UE Tracks").unwrap();
/// assert_eq!(cmd, SpecialCommand::SelectModule("UE Tracks".to_string()));
///
/// let cmd = parse_special_command("/stage 2").unwrap();
/// assert_eq!(cmd, SpecialCommand::JumpStage(2));
///
/// let cmd = parse_special_command("How do I train a model?").unwrap();
/// assert_eq!(cmd, SpecialCommand::None);
///
/// assert!(parse_special_command("/foo").is_err());
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    if !trimmed.starts_with('/') && lower != "exit" && lower != "quit" {
        return Ok(SpecialCommand::None);
    }

    let (word, arg) = match trimmed.split_once(char::is_whitespace) {
        Some((word, rest)) => (word.to_lowercase(), rest.trim()),
        None => (lower.clone(), ""),
    };

    match word.as_str() {
        "exit" | "quit" | "/exit" | "/quit" => Ok(SpecialCommand::Exit),

        // Guided tour
        "/tour" => Ok(SpecialCommand::StartTour),
        "/next" | "/continue" => Ok(SpecialCommand::NextStage),
        "/stage" => {
            let stage = parse_index("/stage", "/stage <number>", arg)?;
            Ok(SpecialCommand::JumpStage(stage))
        }
        "/deep" | "/deepdive" => Ok(SpecialCommand::DeepDive),
        "/skip" | "/ask" => Ok(SpecialCommand::SkipTour),

        // Routing
        "/mode" => {
            if arg.is_empty() {
                return Err(CommandError::MissingArgument {
                    command: "/mode".to_string(),
                    usage: "/mode <mode_id>".to_string(),
                });
            }
            Ok(SpecialCommand::SwitchMode(arg.to_string()))
        }
        "/module" => {
            if arg.is_empty() {
                return Err(CommandError::MissingArgument {
                    command: "/module".to_string(),
                    usage: "/module <module name>".to_string(),
                });
            }
            Ok(SpecialCommand::SelectModule(arg.to_string()))
        }
        "/modes" => Ok(SpecialCommand::ListModes),

        // Session
        "/new" | "/reset" => Ok(SpecialCommand::NewSession),
        "/status" => Ok(SpecialCommand::ShowStatus),
        "/transcript" => Ok(SpecialCommand::Transcript),
        "/suggest" => {
            let n = parse_index("/suggest", "/suggest <number>", arg)?;
            Ok(SpecialCommand::Suggest(n))
        }

        "/theme" => {
            if arg.is_empty() {
                return Err(CommandError::MissingArgument {
                    command: "/theme".to_string(),
                    usage: "/theme <light|dark>".to_string(),
                });
            }
            arg.parse()
                .map(SpecialCommand::SwitchTheme)
                .map_err(|_| CommandError::UnsupportedArgument {
                    command: "/theme".to_string(),
                    arg: arg.to_string(),
                })
        }

        "/help" | "/?" => Ok(SpecialCommand::Help),

        _ => Err(CommandError::UnknownCommand(trimmed.to_string())),
    }
}

fn parse_index(command: &str, usage: &str, arg: &str) -> Result<usize, CommandError> {
    if arg.is_empty() {
        return Err(CommandError::MissingArgument {
            command: command.to_string(),
            usage: usage.to_string(),
        });
    }
    match arg.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(CommandError::UnsupportedArgument {
            command: command.to_string(),
            arg: arg.to_string(),
        }),
    }
}

/// Print help information for special commands
pub fn print_help() {
    println!(
        r#"
Special Commands for Interactive Chat Mode
===========================================

GUIDED TOUR:
  /tour           - Open the guided tour
  /next           - Continue to the next stage
  /stage <n>      - Revisit a stage, or move one stage ahead
  /deep           - Ask the current stage's deep-dive question
  /skip           - Leave the tour and ask your own question

QUERY MODES:
  /modes          - List available modes and modules
  /mode <id>      - Switch mode (e.g. /mode module_deep_dive)
  /module <name>  - Select the module for module-scoped modes

SESSION:
  /new            - Start a new session (also Ctrl+N)
  /status         - Show session, mode and tour status
  /transcript     - Print the conversation so far
  /suggest <n>    - Ask the n-th suggested follow-up question
  /theme <light|dark> - Change the color theme

KEYS:
  Enter           - Send the question
  Alt+Enter       - Insert a line break
  Ctrl+N          - Start a new session
  Ctrl+C          - Cancel a pending answer

OTHER:
  /help           - Show this help message
  exit            - Leave DocBot
"#
    );
}
