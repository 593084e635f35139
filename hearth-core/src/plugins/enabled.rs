//! Enabled list - which plugins to enable at startup
//!
//! Stored as TOML in `~/.config/hearth/enabled.toml`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

use super::error::PluginHostError;

/// Persisted set of plugin names to enable
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct EnabledList {
    /// Set of enabled plugin names
    #[serde(default)]
    pub enabled: BTreeSet<String>,
}

impl EnabledList {
    /// Load the list from a TOML file
    ///
    /// Returns an empty list if the file doesn't exist.
    pub fn load(path: &Path) -> Result<Self, PluginHostError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let list: Self =
            toml::from_str(&content).map_err(|e| PluginHostError::EnabledList(e.to_string()))?;
        Ok(list)
    }

    /// Save the list to a TOML file
    pub fn save(&self, path: &Path) -> Result<(), PluginHostError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| PluginHostError::EnabledList(e.to_string()))?;

        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent().filter(|p| !p.exists()) {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check if a plugin is enabled
    pub fn is_enabled(&self, name: &str) -> bool {
        self.enabled.contains(name)
    }

    /// Enable a plugin. Returns false if it already was.
    pub fn enable(&mut self, name: &str) -> bool {
        self.enabled.insert(name.to_string())
    }

    /// Disable a plugin. Returns false if it wasn't enabled.
    pub fn disable(&mut self, name: &str) -> bool {
        self.enabled.remove(name)
    }

    /// Enabled plugin names, sorted
    pub fn enabled_plugins(&self) -> impl Iterator<Item = &str> {
        self.enabled.iter().map(String::as_str)
    }
}
