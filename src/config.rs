//! Configuration management for DocBot
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{DocbotError, Result};
use crate::shortcuts::ShortcutDispatcher;
use crate::tour::TourScript;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for DocBot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Answer service connection settings
    #[serde(default)]
    pub service: ServiceConfig,
    /// Deployment identity shown in the banner
    #[serde(default)]
    pub client: ClientConfig,
    /// Conversation behavior
    #[serde(default)]
    pub chat: ChatConfig,
    /// Global key chords
    #[serde(default)]
    pub shortcuts: ShortcutsConfig,
    /// Guided tour settings
    #[serde(default)]
    pub tour: TourConfig,
}

/// Answer service connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base address of the answer service API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Client-side bound on one exchange, in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000/api/v1".to_string()
}

fn default_timeout() -> u64 {
    60
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

/// Deployment identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Tenant name; cosmetic only
    #[serde(default = "default_tenant")]
    pub tenant: String,
}

fn default_tenant() -> String {
    "DocBot".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            tenant: default_tenant(),
        }
    }
}

/// Conversation behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Mode active at startup
    #[serde(default = "default_chat_mode")]
    pub default_mode: String,

    /// Module preselected when the default mode is module-scoped
    #[serde(default)]
    pub default_module: Option<String>,

    /// Longest question accepted, in characters
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,

    /// Fetch the mode catalog from the service at startup
    #[serde(default = "default_load_modes")]
    pub load_modes_from_service: bool,
}

fn default_chat_mode() -> String {
    crate::mode::FULL_OVERVIEW.to_string()
}

fn default_max_message_chars() -> usize {
    crate::orchestrator::DEFAULT_MAX_MESSAGE_CHARS
}

fn default_load_modes() -> bool {
    true
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            default_mode: default_chat_mode(),
            default_module: None,
            max_message_chars: default_max_message_chars(),
            load_modes_from_service: default_load_modes(),
        }
    }
}

/// Global key chords, written like `ctrl+k`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortcutsConfig {
    /// Chord that moves focus to the composer
    #[serde(default = "default_focus_chord")]
    pub focus_composer: String,

    /// Chord that starts a new session
    #[serde(default = "default_new_session_chord")]
    pub new_session: String,
}

fn default_focus_chord() -> String {
    "ctrl+k".to_string()
}

fn default_new_session_chord() -> String {
    "ctrl+n".to_string()
}

impl Default for ShortcutsConfig {
    fn default() -> Self {
        Self {
            focus_composer: default_focus_chord(),
            new_session: default_new_session_chord(),
        }
    }
}

/// Guided tour settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TourConfig {
    /// YAML file with a custom tour script; the built-in script otherwise
    #[serde(default)]
    pub script: Option<PathBuf>,
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| DocbotError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| DocbotError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(base_url) = std::env::var("DOCBOT_API_URL") {
            self.service.base_url = base_url;
        }

        if let Ok(tenant) = std::env::var("DOCBOT_CLIENT") {
            self.client.tenant = tenant;
        }

        if let Ok(timeout) = std::env::var("DOCBOT_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.service.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid DOCBOT_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(mode) = std::env::var("DOCBOT_DEFAULT_MODE") {
            self.chat.default_mode = mode;
        }

        if let Ok(max_chars) = std::env::var("DOCBOT_MAX_MESSAGE_CHARS") {
            if let Ok(value) = max_chars.parse() {
                self.chat.max_message_chars = value;
            } else {
                tracing::warn!("Invalid DOCBOT_MAX_MESSAGE_CHARS: {}", max_chars);
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }
        if let Some(api_url) = &cli.api_url {
            tracing::debug!("Using API URL override: {}", api_url);
            self.service.base_url = api_url.clone();
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.service.base_url).map_err(|e| {
            DocbotError::Config(format!(
                "Invalid service.base_url {}: {}",
                self.service.base_url, e
            ))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(DocbotError::Config(format!(
                "service.base_url must use http or https, got {}",
                url.scheme()
            ))
            .into());
        }

        if self.service.timeout_seconds == 0 {
            return Err(DocbotError::Config(
                "service.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.chat.default_mode.trim().is_empty() {
            return Err(
                DocbotError::Config("chat.default_mode cannot be empty".to_string()).into(),
            );
        }

        if self.chat.max_message_chars == 0 {
            return Err(DocbotError::Config(
                "chat.max_message_chars must be greater than 0".to_string(),
            )
            .into());
        }

        ShortcutDispatcher::from_chords(
            &self.shortcuts.focus_composer,
            &self.shortcuts.new_session,
        )?;

        if let Some(script) = &self.tour.script {
            TourScript::from_file(script)?;
        }

        Ok(())
    }
}
