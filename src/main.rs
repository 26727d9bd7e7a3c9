//! DocBot - conversational documentation assistant
//!
#![doc = "DocBot - conversational documentation assistant"]
#![doc = "Main entry point for the DocBot command-line client."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use docbot::cli::{Cli, Commands};
use docbot::commands;
use docbot::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    let state_db = cli.state_db.as_deref();

    // Execute command
    match cli.command {
        Commands::Chat {
            mode,
            module,
            tour,
            ephemeral,
        } => {
            tracing::info!("Starting interactive chat mode");
            if let Some(m) = &mode {
                tracing::debug!("Using mode override: {}", m);
            }
            if let Some(m) = &module {
                tracing::debug!("Using module override: {}", m);
            }
            let options = commands::chat::ChatOptions {
                mode,
                module,
                tour,
                ephemeral,
                state_db: state_db.map(str::to_string),
            };
            commands::chat::run_chat(config, options).await?;
            Ok(())
        }
        Commands::History { session, json } => {
            tracing::info!("Starting history command");
            let service = commands::connect(&config)?;
            let store = commands::open_store(state_db, false)?;
            commands::history::show_history(service.as_ref(), store, session, json).await?;
            Ok(())
        }
        Commands::Modes => {
            let service = commands::connect(&config)?;
            commands::modes::list_modes(service.as_ref()).await?;
            Ok(())
        }
        Commands::Health => {
            let service = commands::connect(&config)?;
            commands::modes::check_health(service.as_ref()).await?;
            Ok(())
        }
        Commands::Session { command } => {
            tracing::info!("Starting session command");
            let service = commands::connect(&config)?;
            let store = commands::open_store(state_db, false)?;
            commands::session::handle_session(command, service.as_ref(), store).await?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
///
/// Logs go to stderr so they never interleave with conversation output.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "docbot=debug" } else { "docbot=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
