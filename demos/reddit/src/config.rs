//! Browser configuration, loaded from TOML.
//!
//! ```toml
//! reddits = ["reactjs", "frontend", "rust"]
//! initial = "reactjs"
//! log_filter = "ambit_core=debug,info"
//!
//! [source]
//! kind = "http"
//! base_url = "https://www.reddit.com"
//!
//! [controller]
//! check_prop_types = true
//! ```

use std::path::Path;

use ambit_core::ControllerConfig;
use serde::{Deserialize, Serialize};

use crate::errors::DemoError;

/// Where posts come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Built-in fixture listings.
    #[default]
    Fixture,
    /// JSON listings over HTTP.
    Http,
}

/// Posts source settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Source implementation.
    pub kind: SourceKind,
    /// Root of the listing API for the HTTP source.
    pub base_url: String,
    /// Simulated response delay of the fixture source.
    pub latency_ms: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::Fixture,
            base_url: "https://www.reddit.com".to_string(),
            latency_ms: 250,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Subreddits offered by the picker.
    pub reddits: Vec<String>,
    /// Subreddit shown at startup.
    pub initial: String,
    /// `tracing` filter directive; overrides `RUST_LOG`.
    pub log_filter: Option<String>,
    /// Posts source.
    pub source: SourceConfig,
    /// Controller settings.
    pub controller: ControllerConfig,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            reddits: vec!["reactjs".to_string(), "frontend".to_string()],
            initial: "reactjs".to_string(),
            log_filter: None,
            source: SourceConfig::default(),
            controller: ControllerConfig::default().named("reddit"),
        }
    }
}

impl DemoConfig {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> Result<Self, DemoError> {
        let config_str = std::fs::read_to_string(path).map_err(|source| DemoError::FileSystem {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&config_str).map_err(|message| DemoError::Configuration {
            path: path.display().to_string(),
            message,
        })
    }

    /// Parse a TOML document; absent keys keep their defaults.
    pub fn parse(config_str: &str) -> Result<Self, String> {
        toml::from_str(config_str).map_err(|e| e.to_string())
    }
}
