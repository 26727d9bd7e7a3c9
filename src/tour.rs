//! Guided tour state machine
//!
//! The tour walks the user through a fixed, ordered script of stages. Users
//! may revisit any stage already reached and advance one stage at a time;
//! skipping ahead past unseen stages is rejected.
//!
//! ```text
//! NotStarted --start--> Stage(0) --advance--> ... Stage(N-1) --advance--> Exited
//!     |                    |  ^  jump(j <= i+1)                            ^
//!     +------ exit / ask_question (any state) ------------------------------+
//! ```

use crate::error::{DocbotError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// One scripted tour stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    /// Short identifier
    pub name: String,
    /// Heading shown for the stage
    pub title: String,
    /// Explanatory text
    pub body: String,
    /// Question sent when the user asks to go deeper on this stage
    pub deep_dive_prompt: String,
    /// Label of the action that moves past this stage
    #[serde(default = "default_continue_label")]
    pub continue_label: String,
}

fn default_continue_label() -> String {
    "Continue".to_string()
}

impl Stage {
    fn new(name: &str, title: &str, body: &str, deep_dive_prompt: &str, continue_label: &str) -> Self {
        Self {
            name: name.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            deep_dive_prompt: deep_dive_prompt.to_string(),
            continue_label: continue_label.to_string(),
        }
    }
}

/// Ordered, immutable sequence of stages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TourScript {
    stages: Vec<Stage>,
}

impl TourScript {
    /// Build a script from stages
    ///
    /// # Errors
    ///
    /// Returns a tour error if `stages` is empty
    pub fn new(stages: Vec<Stage>) -> Result<Self> {
        if stages.is_empty() {
            return Err(DocbotError::Tour("tour script must contain at least one stage".into()).into());
        }
        Ok(Self { stages })
    }

    /// Load a script from a YAML file containing a `stages` list
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or is empty
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            DocbotError::Tour(format!("Failed to read tour script {}: {}", path.display(), e))
        })?;
        let script: TourScript = serde_yaml::from_str(&contents)?;
        Self::new(script.stages)
    }

    /// Number of stages
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Always false; scripts are validated non-empty
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Stage at `index`
    pub fn stage(&self, index: usize) -> Option<&Stage> {
        self.stages.get(index)
    }

    /// All stages in order
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }
}

impl Default for TourScript {
    fn default() -> Self {
        Self {
            stages: vec![
                Stage::new(
                    "overview",
                    "Welcome to the platform",
                    "The platform turns network data into RF predictions in four steps: \
                     train a Digital Twin, generate UE tracks, run RF prediction, and \
                     orchestrate the jobs that tie them together.",
                    "Give me an overview of the whole workflow, step by step.",
                    "Start with the Digital Twin",
                ),
                Stage::new(
                    "digital_twin",
                    "Digital Twin",
                    "A Digital Twin is trained from UE training data and topology \
                     information. It learns how the network behaves so later steps can \
                     predict it.",
                    "How do I train a Digital Twin, and what data does it need?",
                    "Next: UE Tracks",
                ),
                Stage::new(
                    "ue_tracks",
                    "UE Tracks",
                    "UE tracks describe how user equipment moves through the network. \
                     They can be generated from mobility classes or uploaded.",
                    "How do I generate UE tracks and which UE classes are available?",
                    "Next: RF Prediction",
                ),
                Stage::new(
                    "rf_prediction",
                    "RF Prediction",
                    "RF prediction combines the trained twin with UE tracks to estimate \
                     signal quality across the network.",
                    "How does RF prediction work and what output does it produce?",
                    "Next: Orchestration",
                ),
                Stage::new(
                    "orchestration",
                    "Orchestration",
                    "Orchestration schedules and monitors the jobs behind every step, \
                     and collects their results.",
                    "How are jobs orchestrated, and how do I monitor their status?",
                    "Finish the tour",
                ),
            ],
        }
    }
}

/// Tour position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TourState {
    /// The tour has not been started in this session
    NotStarted,
    /// The tour view is showing stage `i`
    Stage(usize),
    /// The tour was completed or abandoned
    Exited,
}

impl fmt::Display for TourState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not started"),
            Self::Stage(i) => write!(f, "stage {}", i + 1),
            Self::Exited => write!(f, "exited"),
        }
    }
}

/// Result of a tour action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TourTransition {
    /// Now showing stage `i`
    Moved(usize),
    /// The tour ended and the timeline should be shown
    Exited,
    /// The action is not legal in the current state; nothing changed
    Rejected,
}

type ExitHook = Box<dyn FnMut() + Send>;

/// Owner of the tour position
pub struct TourStateMachine {
    script: TourScript,
    state: TourState,
    on_exit: Option<ExitHook>,
}

impl fmt::Debug for TourStateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TourStateMachine")
            .field("stages", &self.script.len())
            .field("state", &self.state)
            .finish()
    }
}

impl TourStateMachine {
    /// Create a machine in `NotStarted` over a script
    pub fn new(script: TourScript) -> Self {
        Self {
            script,
            state: TourState::NotStarted,
            on_exit: None,
        }
    }

    /// Register a hook fired whenever the tour enters `Exited`
    pub fn with_exit_hook(mut self, hook: impl FnMut() + Send + 'static) -> Self {
        self.on_exit = Some(Box::new(hook));
        self
    }

    /// Current state
    pub fn state(&self) -> TourState {
        self.state
    }

    /// The script being toured
    pub fn script(&self) -> &TourScript {
        &self.script
    }

    /// Stage currently shown, if any
    pub fn current_stage(&self) -> Option<&Stage> {
        match self.state {
            TourState::Stage(i) => self.script.stage(i),
            _ => None,
        }
    }

    /// Whether the tour view is active
    pub fn is_active(&self) -> bool {
        matches!(self.state, TourState::Stage(_))
    }

    /// `NotStarted → Stage(0)`; rejected from any other state
    pub fn start(&mut self) -> TourTransition {
        if self.state != TourState::NotStarted {
            tracing::debug!("Tour start rejected in state {}", self.state);
            return TourTransition::Rejected;
        }
        self.state = TourState::Stage(0);
        tracing::info!("Tour started");
        TourTransition::Moved(0)
    }

    /// Move to the next stage, or exit after the last one
    ///
    /// # Examples
    ///
    /// ```
    /// use docbot::tour::{TourScript, TourStateMachine, TourTransition};
    ///
    /// let mut tour = TourStateMachine::new(TourScript::default());
    /// tour.start();
    /// assert_eq!(tour.advance(), TourTransition::Moved(1));
    /// ```
    pub fn advance(&mut self) -> TourTransition {
        match self.state {
            TourState::Stage(i) if i + 1 < self.script.len() => {
                self.state = TourState::Stage(i + 1);
                TourTransition::Moved(i + 1)
            }
            TourState::Stage(_) => {
                self.enter_exited();
                TourTransition::Exited
            }
            _ => TourTransition::Rejected,
        }
    }

    /// Jump to stage `target`
    ///
    /// Legal only from `Stage(i)` with `target <= i + 1` and within the
    /// script; anything else is rejected and leaves the state unchanged.
    pub fn jump(&mut self, target: usize) -> TourTransition {
        match self.state {
            TourState::Stage(i) if target <= i + 1 && target < self.script.len() => {
                self.state = TourState::Stage(target);
                TourTransition::Moved(target)
            }
            _ => {
                tracing::debug!("Tour jump to {} rejected in state {}", target, self.state);
                TourTransition::Rejected
            }
        }
    }

    /// Prompt to send for the current stage's deep dive
    ///
    /// Does not change the tour state.
    pub fn deep_dive_prompt(&self) -> Option<&str> {
        self.current_stage().map(|s| s.deep_dive_prompt.as_str())
    }

    /// Leave the tour to ask a free-form question
    pub fn ask_question(&mut self) -> TourTransition {
        self.exit()
    }

    /// Leave the tour from any state
    pub fn exit(&mut self) -> TourTransition {
        if self.state != TourState::Exited {
            self.enter_exited();
        }
        TourTransition::Exited
    }

    /// Return to `NotStarted`; used only by session reset
    pub fn reset(&mut self) {
        self.state = TourState::NotStarted;
    }

    fn enter_exited(&mut self) {
        self.state = TourState::Exited;
        tracing::info!("Tour exited");
        if let Some(hook) = self.on_exit.as_mut() {
            hook();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn tour() -> TourStateMachine {
        TourStateMachine::new(TourScript::default())
    }

    fn started_at(stage: usize) -> TourStateMachine {
        let mut machine = tour();
        machine.start();
        for _ in 0..stage {
            machine.advance();
        }
        machine
    }

    #[test]
    fn test_default_script_has_five_stages() {
        assert_eq!(TourScript::default().len(), 5);
    }

    #[test]
    fn test_empty_script_rejected() {
        assert!(TourScript::new(Vec::new()).is_err());
    }

    #[test]
    fn test_start_only_from_not_started() {
        let mut machine = tour();
        assert_eq!(machine.start(), TourTransition::Moved(0));
        assert_eq!(machine.start(), TourTransition::Rejected);
        machine.exit();
        assert_eq!(machine.start(), TourTransition::Rejected);
        assert_eq!(machine.state(), TourState::Exited);
    }

    #[test]
    fn test_full_walkthrough_fires_exit_hook_once() {
        let exits = Arc::new(AtomicUsize::new(0));
        let counter = exits.clone();
        let mut machine = tour().with_exit_hook(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let mut visited = Vec::new();
        if let TourTransition::Moved(i) = machine.start() {
            visited.push(i);
        }
        for _ in 0..4 {
            if let TourTransition::Moved(i) = machine.advance() {
                visited.push(i);
            }
        }
        assert_eq!(visited, vec![0, 1, 2, 3, 4]);
        assert_eq!(machine.advance(), TourTransition::Exited);
        assert_eq!(machine.state(), TourState::Exited);
        assert_eq!(machine.advance(), TourTransition::Rejected);
        machine.exit();
        assert_eq!(exits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_jump_legal_iff_at_most_one_ahead() {
        for i in 0..5 {
            for j in 0..7 {
                let mut machine = started_at(i);
                let result = machine.jump(j);
                if j <= i + 1 && j < 5 {
                    assert_eq!(result, TourTransition::Moved(j), "i={} j={}", i, j);
                    assert_eq!(machine.state(), TourState::Stage(j));
                } else {
                    assert_eq!(result, TourTransition::Rejected, "i={} j={}", i, j);
                    assert_eq!(machine.state(), TourState::Stage(i));
                }
            }
        }
    }

    #[test]
    fn test_jump_rejected_outside_stages() {
        let mut machine = tour();
        assert_eq!(machine.jump(0), TourTransition::Rejected);
        assert_eq!(machine.state(), TourState::NotStarted);
    }

    #[test]
    fn test_deep_dive_does_not_move() {
        let machine = started_at(2);
        assert_eq!(
            machine.deep_dive_prompt(),
            Some(TourScript::default().stages()[2].deep_dive_prompt.as_str())
        );
        assert_eq!(machine.state(), TourState::Stage(2));
        assert!(tour().deep_dive_prompt().is_none());
    }

    #[test]
    fn test_ask_question_exits_from_any_state() {
        let mut machine = tour();
        assert_eq!(machine.ask_question(), TourTransition::Exited);
        let mut machine = started_at(3);
        assert_eq!(machine.ask_question(), TourTransition::Exited);
        assert!(!machine.is_active());
    }

    #[test]
    fn test_reset_allows_restart() {
        let mut machine = started_at(1);
        machine.exit();
        machine.reset();
        assert_eq!(machine.state(), TourState::NotStarted);
        assert_eq!(machine.start(), TourTransition::Moved(0));
    }

    #[test]
    fn test_script_from_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tour.yaml");
        std::fs::write(
            &path,
            "stages:\n  - name: intro\n    title: Intro\n    body: Hello\n    deep_dive_prompt: Tell me more\n",
        )
        .unwrap();
        let script = TourScript::from_file(&path).unwrap();
        assert_eq!(script.len(), 1);
        assert_eq!(script.stages()[0].continue_label, "Continue");
    }

    #[test]
    fn test_single_stage_script_exits_on_advance() {
        let script = TourScript::new(vec![Stage::new("only", "Only", "Body", "Why?", "Done")]).unwrap();
        let mut machine = TourStateMachine::new(script);
        machine.start();
        assert_eq!(machine.jump(1), TourTransition::Rejected);
        assert_eq!(machine.advance(), TourTransition::Exited);
    }
}
