//! Router configuration.
//!
//! Loaded from TOML, with a couple of switches that can be flipped from the
//! environment:
//!
//! - `WAYMARK_HTML5_MODE`: `true` to drop the hash prefix from generated links
//! - `WAYMARK_CANCEL_SUPERSEDED`: `false` to let superseded transitions finish
//!   resolving (their commit is still skipped)

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Generate path URLs instead of fragment URLs.
    pub html5_mode: bool,
    /// Prefix of fragment URLs when not in HTML5 mode.
    pub hash_prefix: String,
    /// Stop awaiting a transition's dependencies once a newer transition starts.
    pub cancel_superseded: bool,
    /// Buffer size of the transition event channel.
    pub event_capacity: usize,
    /// Location used when a URL matches no state.
    pub default_url: Option<String>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            html5_mode: false,
            hash_prefix: "#".to_string(),
            cancel_superseded: true,
            event_capacity: 64,
            default_url: None,
        }
    }
}

impl RouterConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Apply `WAYMARK_*` environment overrides. Unparseable values are ignored
    /// with a warning.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(value) = env_flag("WAYMARK_HTML5_MODE") {
            self.html5_mode = value;
        }
        if let Some(value) = env_flag("WAYMARK_CANCEL_SUPERSEDED") {
            self.cancel_superseded = value;
        }
        self
    }
}

fn env_flag(name: &str) -> Option<bool> {
    let raw = std::env::var(name).ok()?;
    let parsed = parse_flag(&raw);
    if parsed.is_none() {
        tracing::warn!("Ignoring {}={}: expected true or false", name, raw);
    }
    parsed
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
