//! Persona system prompt
//!
//! The persona is plain template text with a `{display_name}` placeholder,
//! loaded from a file or taken from the built-in default.

use std::path::Path;
use tracing::info;

use crate::history::Turn;
use crate::{Error, Result};

/// Placeholder replaced by the session's display name
pub const DISPLAY_NAME_PLACEHOLDER: &str = "{display_name}";

const DEFAULT_TEMPLATE: &str = include_str!("../../../prompts/persona.md");

/// Parameterised persona template
#[derive(Debug, Clone)]
pub struct PersonaPrompt {
    template: String,
}

impl PersonaPrompt {
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        if template.trim().is_empty() {
            return Err(Error::Template("persona template is empty".to_string()));
        }
        Ok(Self { template })
    }

    /// Load the template from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let template = std::fs::read_to_string(path).map_err(|e| {
            Error::Template(format!("Failed to read {}: {}", path.display(), e))
        })?;
        info!("Loaded persona template from {}", path.display());
        Self::new(template)
    }

    /// Use the file when a path is configured, the built-in template otherwise
    pub fn load(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Render the template for one display name
    pub fn render(&self, display_name: &str) -> String {
        self.template.replace(DISPLAY_NAME_PLACEHOLDER, display_name)
    }

    /// System turn followed by the replayed history and the new human turn
    pub fn compose(&self, display_name: &str, history: Vec<Turn>, query: &str) -> Vec<Turn> {
        let mut turns = Vec::with_capacity(history.len() + 2);
        turns.push(Turn::system(self.render(display_name)));
        turns.extend(history);
        turns.push(Turn::human(query));
        turns
    }

    pub fn template(&self) -> &str {
        &self.template
    }
}

impl Default for PersonaPrompt {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
        }
    }
}
