//! Global keyboard shortcuts
//!
//! Two chords are reserved globally: one focuses the composer and one starts
//! a new session. The focus chord yields to ordinary editing when focus is
//! already inside an editable control (so e.g. `Ctrl+K` still kills the line
//! in the composer); the new-session chord is always active.
//!
//! Inside the composer a separate, local rule applies: plain Enter submits
//! and Shift+Enter (Alt+Enter on terminals that cannot report Shift) inserts
//! a line break.

use crate::error::{DocbotError, Result};
use rustyline::{KeyCode, KeyEvent, Modifiers};

/// A reserved global action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    /// Move input focus to the composer
    FocusComposer,
    /// Reset the session, timeline and tour
    NewSession,
}

/// Where input focus currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusContext {
    /// Inside a text-editing control
    Editable,
    /// Anywhere else
    Elsewhere,
}

/// Outcome of dispatching a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The key triggers a global shortcut
    Handled(Shortcut),
    /// The key is ordinary input for the focused control
    PassThrough,
}

/// Composer-local key interpretation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposerAction {
    /// Send the composed text
    Submit,
    /// Insert a literal line break
    InsertNewline,
    /// Not handled by the composer rule
    Other,
}

/// Maps global key chords to shortcuts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcutDispatcher {
    focus_composer: KeyEvent,
    new_session: KeyEvent,
}

impl Default for ShortcutDispatcher {
    fn default() -> Self {
        Self {
            focus_composer: KeyEvent::ctrl('k'),
            new_session: KeyEvent::ctrl('n'),
        }
    }
}

impl ShortcutDispatcher {
    /// Build a dispatcher from chord strings such as `ctrl+k`
    ///
    /// # Errors
    ///
    /// Returns a configuration error if either chord cannot be parsed or
    /// both chords are the same
    pub fn from_chords(focus_composer: &str, new_session: &str) -> Result<Self> {
        let focus_composer = parse_chord(focus_composer)?;
        let new_session = parse_chord(new_session)?;
        if focus_composer == new_session {
            return Err(DocbotError::Config(
                "focus_composer and new_session shortcuts must differ".to_string(),
            )
            .into());
        }
        Ok(Self {
            focus_composer,
            new_session,
        })
    }

    /// Chord bound to [`Shortcut::FocusComposer`]
    pub fn focus_composer_chord(&self) -> KeyEvent {
        self.focus_composer
    }

    /// Chord bound to [`Shortcut::NewSession`]
    pub fn new_session_chord(&self) -> KeyEvent {
        self.new_session
    }

    /// Decide what a key press means given the current focus
    ///
    /// # Examples
    ///
    /// ```
    /// use docbot::shortcuts::{Dispatch, FocusContext, Shortcut, ShortcutDispatcher};
    /// use rustyline::KeyEvent;
    ///
    /// let dispatcher = ShortcutDispatcher::default();
    /// assert_eq!(
    ///     dispatcher.dispatch(KeyEvent::ctrl('k'), FocusContext::Editable),
    ///     Dispatch::PassThrough
    /// );
    /// assert_eq!(
    ///     dispatcher.dispatch(KeyEvent::ctrl('n'), FocusContext::Editable),
    ///     Dispatch::Handled(Shortcut::NewSession)
    /// );
    /// ```
    pub fn dispatch(&self, key: KeyEvent, focus: FocusContext) -> Dispatch {
        let key = normalize(key);
        if key == self.new_session {
            return Dispatch::Handled(Shortcut::NewSession);
        }
        if key == self.focus_composer && focus != FocusContext::Editable {
            return Dispatch::Handled(Shortcut::FocusComposer);
        }
        Dispatch::PassThrough
    }
}

/// Interpret a key pressed inside the composer
pub fn composer_key(key: KeyEvent) -> ComposerAction {
    match key {
        KeyEvent(KeyCode::Enter, mods) if mods == Modifiers::NONE => ComposerAction::Submit,
        KeyEvent(KeyCode::Enter, mods)
            if mods.contains(Modifiers::SHIFT) || mods.contains(Modifiers::ALT) =>
        {
            ComposerAction::InsertNewline
        }
        _ => ComposerAction::Other,
    }
}

/// Parse a chord like `ctrl+n`, `ctrl+shift+p` or `alt+enter`
///
/// # Errors
///
/// Returns a configuration error for unknown modifiers or keys
pub fn parse_chord(chord: &str) -> Result<KeyEvent> {
    let mut mods = Modifiers::NONE;
    let mut code = None;

    for part in chord.split('+').map(|p| p.trim().to_lowercase()) {
        match part.as_str() {
            "ctrl" | "control" | "cmd" => mods |= Modifiers::CTRL,
            "alt" | "meta" | "option" => mods |= Modifiers::ALT,
            "shift" => mods |= Modifiers::SHIFT,
            "enter" | "return" => code = Some(KeyCode::Enter),
            "tab" => code = Some(KeyCode::Tab),
            "esc" | "escape" => code = Some(KeyCode::Esc),
            key if key.chars().count() == 1 => {
                code = key.chars().next().map(KeyCode::Char);
            }
            _ => {
                return Err(DocbotError::Config(format!("Invalid key chord: {}", chord)).into());
            }
        }
    }

    match code {
        Some(code) if mods != Modifiers::NONE => Ok(normalize(KeyEvent(code, mods))),
        _ => Err(DocbotError::Config(format!(
            "Key chord must combine a modifier and a key: {}",
            chord
        ))
        .into()),
    }
}

/// Fold letter case so `Ctrl+N` and `Ctrl+n` compare equal
fn normalize(key: KeyEvent) -> KeyEvent {
    match key {
        KeyEvent(KeyCode::Char(c), mods) if c.is_ascii_uppercase() => {
            KeyEvent(KeyCode::Char(c.to_ascii_lowercase()), mods)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_focus_chord_suppressed_in_editable() {
        let dispatcher = ShortcutDispatcher::default();
        assert_eq!(
            dispatcher.dispatch(KeyEvent::ctrl('k'), FocusContext::Editable),
            Dispatch::PassThrough
        );
        assert_eq!(
            dispatcher.dispatch(KeyEvent::ctrl('k'), FocusContext::Elsewhere),
            Dispatch::Handled(Shortcut::FocusComposer)
        );
    }

    #[test]
    fn test_new_session_always_active() {
        let dispatcher = ShortcutDispatcher::default();
        for focus in [FocusContext::Editable, FocusContext::Elsewhere] {
            assert_eq!(
                dispatcher.dispatch(KeyEvent::ctrl('n'), focus),
                Dispatch::Handled(Shortcut::NewSession)
            );
        }
    }

    #[test]
    fn test_ordinary_keys_pass_through() {
        let dispatcher = ShortcutDispatcher::default();
        assert_eq!(
            dispatcher.dispatch(KeyEvent::new('n', Modifiers::NONE), FocusContext::Elsewhere),
            Dispatch::PassThrough
        );
        assert_eq!(
            dispatcher.dispatch(KeyEvent::alt('n'), FocusContext::Elsewhere),
            Dispatch::PassThrough
        );
    }

    #[test]
    fn test_uppercase_chord_matches() {
        let dispatcher = ShortcutDispatcher::default();
        assert_eq!(
            dispatcher.dispatch(KeyEvent(KeyCode::Char('N'), Modifiers::CTRL), FocusContext::Editable),
            Dispatch::Handled(Shortcut::NewSession)
        );
    }

    #[test]
    fn test_composer_rule() {
        assert_eq!(
            composer_key(KeyEvent(KeyCode::Enter, Modifiers::NONE)),
            ComposerAction::Submit
        );
        assert_eq!(
            composer_key(KeyEvent(KeyCode::Enter, Modifiers::SHIFT)),
            ComposerAction::InsertNewline
        );
        assert_eq!(
            composer_key(KeyEvent(KeyCode::Enter, Modifiers::ALT)),
            ComposerAction::InsertNewline
        );
        assert_eq!(composer_key(KeyEvent::ctrl('n')), ComposerAction::Other);
    }

    #[test]
    fn test_parse_chord() {
        assert_eq!(parse_chord("ctrl+k").unwrap(), KeyEvent::ctrl('k'));
        assert_eq!(parse_chord("Ctrl+N").unwrap(), KeyEvent::ctrl('n'));
        assert_eq!(
            parse_chord("alt+enter").unwrap(),
            KeyEvent(KeyCode::Enter, Modifiers::ALT)
        );
        assert!(parse_chord("k").is_err());
        assert!(parse_chord("ctrl+pageup").is_err());
        assert!(parse_chord("hyper+k").is_err());
    }

    #[test]
    fn test_from_chords_rejects_duplicates() {
        assert!(ShortcutDispatcher::from_chords("ctrl+k", "ctrl+k").is_err());
        let dispatcher = ShortcutDispatcher::from_chords("ctrl+o", "ctrl+r").unwrap();
        assert_eq!(
            dispatcher.dispatch(KeyEvent::ctrl('r'), FocusContext::Editable),
            Dispatch::Handled(Shortcut::NewSession)
        );
    }
}
