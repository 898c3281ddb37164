//! Controller configuration.

use serde::{Deserialize, Serialize};

/// Per-controller settings.
///
/// Deserializes from partial documents; missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Label for spans and diagnostics. Defaults to the root view's name.
    pub name: Option<String>,
    /// Validate selector outputs and own props against their descriptors,
    /// logging mismatches. On by default in debug builds.
    pub check_prop_types: bool,
    /// Skip revision bumps when a store notification leaves the selector
    /// output unchanged.
    pub skip_unchanged: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            name: None,
            check_prop_types: cfg!(debug_assertions),
            skip_unchanged: true,
        }
    }
}

impl ControllerConfig {
    /// Set the diagnostic label.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}
