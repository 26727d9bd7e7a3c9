//! Display theme preference
//!
//! The theme is persisted under its own key and is independent of the
//! session: resetting the session never changes it.

use crate::error::{DocbotError, Result};
use crate::storage::{KeyValueStore, THEME_KEY};
use colored::{ColoredString, Colorize};
use std::fmt;
use std::str::FromStr;

/// Light or dark terminal palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemePreference {
    /// Palette for light backgrounds
    Light,
    /// Palette for dark backgrounds
    #[default]
    Dark,
}

impl FromStr for ThemePreference {
    type Err = DocbotError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(DocbotError::Config(format!(
                "Invalid theme: {}. Must be one of: light, dark",
                other
            ))),
        }
    }
}

impl fmt::Display for ThemePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Light => write!(f, "light"),
            Self::Dark => write!(f, "dark"),
        }
    }
}

impl ThemePreference {
    /// Read the persisted preference, defaulting to dark
    ///
    /// An unreadable value falls back to the default instead of failing.
    pub fn load(store: &dyn KeyValueStore) -> Result<Self> {
        Ok(match store.get(THEME_KEY)? {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!("Ignoring stored theme: {}", e);
                Self::default()
            }),
            None => Self::default(),
        })
    }

    /// Persist the preference
    pub fn save(self, store: &dyn KeyValueStore) -> Result<()> {
        store.set(THEME_KEY, &self.to_string())
    }

    /// Style a user message label
    pub fn user(self, text: &str) -> ColoredString {
        match self {
            Self::Light => text.blue().bold(),
            Self::Dark => text.cyan().bold(),
        }
    }

    /// Style an assistant message label
    pub fn assistant(self, text: &str) -> ColoredString {
        match self {
            Self::Light => text.green().bold(),
            Self::Dark => text.bright_green().bold(),
        }
    }

    /// Style a system annotation
    pub fn annotation(self, text: &str) -> ColoredString {
        match self {
            Self::Light => text.black().italic(),
            Self::Dark => text.bright_black().italic(),
        }
    }

    /// Style an error notice
    pub fn error(self, text: &str) -> ColoredString {
        match self {
            Self::Light => text.red(),
            Self::Dark => text.bright_red(),
        }
    }

    /// Style secondary text such as citations and suggestions
    pub fn muted(self, text: &str) -> ColoredString {
        match self {
            Self::Light => text.magenta(),
            Self::Dark => text.yellow(),
        }
    }
}
