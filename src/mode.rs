//! Query mode routing
//!
//! A mode is a named routing directive that changes how the answer service
//! handles a question. The active mode (and, for module-scoped modes, the
//! selected module) is read at send time and attached to every request.
//!
//! Switching modes never touches the session or replays the conversation; it
//! only appends a client-local annotation to the timeline.

use crate::api::{ModeCatalog, ModeDescriptor};
use crate::error::{DocbotError, Result};
use crate::timeline::ConversationTimeline;
use colored::Colorize;

/// Guided overview of the whole documented workflow
pub const FULL_OVERVIEW: &str = "full_overview";

/// Questions scoped to one module
pub const MODULE_DEEP_DIVE: &str = "module_deep_dive";

/// Unscoped question answering
pub const GENERAL: &str = "general";

/// Routing metadata attached to one outbound request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// Mode id
    pub mode: String,
    /// Scoping module, if any
    pub module: Option<String>,
}

/// Built-in catalog used until the service's catalog is loaded
pub fn default_catalog() -> ModeCatalog {
    ModeCatalog {
        modes: vec![
            ModeDescriptor::new(
                FULL_OVERVIEW,
                "Full Overview",
                "Step-by-step guided tour of the entire workflow",
                false,
            ),
            ModeDescriptor::new(
                MODULE_DEEP_DIVE,
                "Module Deep-Dive",
                "In-depth exploration of a specific module",
                true,
            ),
            ModeDescriptor::new(GENERAL, "General Q&A", "Ask any question about the platform", false),
        ],
        modules: vec![
            "Digital Twin".to_string(),
            "RF Prediction".to_string(),
            "UE Tracks".to_string(),
            "Orchestration".to_string(),
        ],
    }
}

/// Owner of the active mode and scoping module
#[derive(Debug, Clone)]
pub struct ModeController {
    catalog: ModeCatalog,
    mode: String,
    module: Option<String>,
}

impl ModeController {
    /// Create a controller over a catalog with an initial mode
    ///
    /// # Errors
    ///
    /// Returns `UnknownMode` if `initial` is not in a non-empty catalog
    ///
    /// # Examples
    ///
    /// ```
    /// use docbot::mode::{default_catalog, ModeController, GENERAL};
    ///
    /// let controller = ModeController::new(default_catalog(), GENERAL).unwrap();
    /// assert_eq!(controller.route().mode, "general");
    /// assert!(controller.route().module.is_none());
    /// ```
    pub fn new(catalog: ModeCatalog, initial: &str) -> Result<Self> {
        let controller = Self {
            catalog,
            mode: initial.to_string(),
            module: None,
        };
        controller.ensure_known(initial)?;
        Ok(controller)
    }

    /// Active mode id
    pub fn mode(&self) -> &str {
        &self.mode
    }

    /// Selected scoping module
    pub fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    /// The catalog this controller validates against
    pub fn catalog(&self) -> &ModeCatalog {
        &self.catalog
    }

    /// Descriptor of the active mode, if the catalog knows it
    pub fn descriptor(&self) -> Option<&ModeDescriptor> {
        self.catalog.modes.iter().find(|m| m.id == self.mode)
    }

    /// Whether the active mode requires a scoping module
    pub fn requires_module(&self) -> bool {
        self.descriptor().is_some_and(|d| d.requires_module)
    }

    /// Routing metadata for a request sent now
    pub fn route(&self) -> Route {
        Route {
            mode: self.mode.clone(),
            module: self.module.clone(),
        }
    }

    /// Create a controller over a catalog fetched from the service
    ///
    /// The preferred mode is used when the service offers it; otherwise the
    /// first offered mode becomes active, since the service decides which
    /// modes a deployment has.
    ///
    /// # Errors
    ///
    /// Returns `UnknownMode` if the catalog is empty and `preferred` is not
    /// accepted by it
    pub fn from_service_catalog(catalog: ModeCatalog, preferred: &str) -> Result<Self> {
        if catalog.modes.is_empty() || catalog.modes.iter().any(|m| m.id == preferred) {
            return Self::new(catalog, preferred);
        }
        let fallback = catalog.modes[0].id.clone();
        tracing::warn!(
            "Mode {} not offered by service, falling back to {}",
            preferred,
            fallback
        );
        Self::new(catalog, &fallback)
    }

    /// Switch the active mode and annotate the timeline
    ///
    /// Selecting the mode that is already active is a no-op. Switching to a
    /// mode that does not require a module drops the selected module.
    ///
    /// # Returns
    ///
    /// `true` if the mode changed
    ///
    /// # Errors
    ///
    /// Returns `UnknownMode` if the id is not in the catalog
    pub fn set_mode(&mut self, new_mode: &str, timeline: &mut ConversationTimeline) -> Result<bool> {
        self.ensure_known(new_mode)?;
        if self.mode == new_mode {
            return Ok(false);
        }

        let old_mode = std::mem::replace(&mut self.mode, new_mode.to_string());
        if !self.requires_module() {
            self.module = None;
        }
        tracing::info!("Mode changed from {} to {}", old_mode, new_mode);
        timeline.append_system_annotation(&format!("mode changed to {}", new_mode));
        Ok(true)
    }

    /// Select the scoping module for the active mode
    ///
    /// # Errors
    ///
    /// Returns `ModuleNotAllowed` if the active mode does not take a module
    /// or the module is not offered by the catalog
    pub fn set_module(&mut self, module: &str, timeline: &mut ConversationTimeline) -> Result<bool> {
        let canonical = self.resolve_module(module)?;
        if self.module.as_deref() == Some(canonical.as_str()) {
            return Ok(false);
        }
        tracing::info!("Module changed to {}", canonical);
        timeline.append_system_annotation(&format!("module changed to {}", canonical));
        self.module = Some(canonical);
        Ok(true)
    }

    /// Preselect a module at construction time, without annotating
    ///
    /// # Errors
    ///
    /// Same as [`ModeController::set_module`]
    pub fn with_module(mut self, module: &str) -> Result<Self> {
        self.module = Some(self.resolve_module(module)?);
        Ok(self)
    }

    /// Format a prompt string with mode indicators
    ///
    /// # Examples
    ///
    /// ```
    /// use docbot::mode::{default_catalog, ModeController, FULL_OVERVIEW};
    ///
    /// let controller = ModeController::new(default_catalog(), FULL_OVERVIEW).unwrap();
    /// assert_eq!(controller.format_prompt(), "[full_overview] >> ");
    /// ```
    pub fn format_prompt(&self) -> String {
        match &self.module {
            Some(module) => format!("[{}:{}] >> ", self.mode, module),
            None => format!("[{}] >> ", self.mode),
        }
    }

    /// Format a colored prompt string for terminal output
    pub fn format_colored_prompt(&self) -> String {
        let mode = self.mode.cyan().bold();
        match &self.module {
            Some(module) => format!("[{}:{}] >> ", mode, module.yellow()),
            None => format!("[{}] >> ", mode),
        }
    }

    fn resolve_module(&self, module: &str) -> Result<String> {
        if !self.requires_module() {
            return Err(DocbotError::ModuleNotAllowed(format!(
                "mode {} does not take a module",
                self.mode
            ))
            .into());
        }
        if self.catalog.modules.is_empty() {
            return Ok(module.to_string());
        }
        self.catalog
            .modules
            .iter()
            .find(|m| m.eq_ignore_ascii_case(module))
            .cloned()
            .ok_or_else(|| {
                DocbotError::ModuleNotAllowed(format!(
                    "{}. Must be one of: {}",
                    module,
                    self.catalog.modules.join(", ")
                ))
                .into()
            })
    }

    fn ensure_known(&self, mode: &str) -> Result<()> {
        if self.catalog.modes.is_empty() || self.catalog.modes.iter().any(|m| m.id == mode) {
            return Ok(());
        }
        let valid: Vec<&str> = self.catalog.modes.iter().map(|m| m.id.as_str()).collect();
        Err(DocbotError::UnknownMode(format!(
            "{}. Must be one of: {}",
            mode,
            valid.join(", ")
        ))
        .into())
    }
}
