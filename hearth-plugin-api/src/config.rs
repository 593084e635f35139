//! PluginConfig - per-plugin persistent key/value store backed by TOML
//!
//! Keys are dot-delimited paths into nested tables: `moderation.spam.limit`
//! addresses `limit` inside `[moderation.spam]`. A literal dot inside a
//! segment is written as `\.`.

use crate::error::PluginError;
use serde::{Serialize, de::DeserializeOwned};
use std::path::Path;

/// Plugin configuration - persistent key-value store backed by TOML
#[derive(Debug, Clone, Default)]
pub struct PluginConfig {
    values: toml::Table,
    dirty: bool,
}

impl PluginConfig {
    /// Create a new empty config
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, PluginError> {
        let values: toml::Table =
            toml::from_str(content).map_err(|e| PluginError::Config(e.to_string()))?;
        Ok(Self {
            values,
            dirty: false,
        })
    }

    /// Load configuration from a TOML file
    ///
    /// Returns an empty config if the file doesn't exist.
    pub fn load(path: &Path) -> Result<Self, PluginError> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Save configuration to a TOML file
    pub fn save(&mut self, path: &Path) -> Result<(), PluginError> {
        let content = toml::to_string_pretty(&self.values)
            .map_err(|e| PluginError::Serialization(e.to_string()))?;

        if let Some(parent) = path.parent().filter(|p| !p.exists()) {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        self.dirty = false;
        Ok(())
    }

    /// Get a configuration value
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.lookup(key).and_then(|v| v.clone().try_into().ok())
    }

    /// Get a configuration value, or `default` when absent or mistyped
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    /// Check whether a key is present
    pub fn contains(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    /// Set a configuration value, creating intermediate tables
    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> Result<(), PluginError> {
        let value =
            toml::Value::try_from(value).map_err(|e| PluginError::Serialization(e.to_string()))?;
        let segments = split_key(key);
        let Some((leaf, parents)) = segments.split_last() else {
            return Err(PluginError::config("empty configuration key"));
        };

        let mut table = &mut self.values;
        for segment in parents {
            let entry = table
                .entry(segment.clone())
                .or_insert(toml::Value::Table(toml::Table::new()));
            table = match entry {
                toml::Value::Table(t) => t,
                _ => {
                    return Err(PluginError::Config(format!(
                        "'{segment}' in '{key}' is not a table"
                    )));
                }
            };
        }
        table.insert(leaf.clone(), value);
        self.dirty = true;
        Ok(())
    }

    /// Remove a key, returning whether it was present
    pub fn remove(&mut self, key: &str) -> bool {
        let segments = split_key(key);
        let Some((leaf, parents)) = segments.split_last() else {
            return false;
        };

        let mut table = &mut self.values;
        for segment in parents {
            match table.get_mut(segment) {
                Some(toml::Value::Table(t)) => table = t,
                _ => return false,
            }
        }
        let removed = table.remove(leaf).is_some();
        self.dirty |= removed;
        removed
    }

    /// Merge bundled defaults into this config.
    ///
    /// Keys already present are never overwritten; missing keys are copied
    /// in. Recursion only descends where both sides hold a table. Returns
    /// true if anything was added.
    pub fn merge_defaults(&mut self, defaults: &toml::Table) -> bool {
        let changed = merge_missing(&mut self.values, defaults);
        self.dirty |= changed;
        changed
    }

    /// The underlying document
    pub fn as_table(&self) -> &toml::Table {
        &self.values
    }

    /// Check if the config has been modified since loading/saving
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Mark the config as clean (internal use after save)
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    fn lookup(&self, key: &str) -> Option<&toml::Value> {
        let segments = split_key(key);
        let (leaf, parents) = segments.split_last()?;
        let mut table = &self.values;
        for segment in parents {
            table = table.get(segment)?.as_table()?;
        }
        table.get(leaf)
    }
}

fn merge_missing(target: &mut toml::Table, defaults: &toml::Table) -> bool {
    let mut changed = false;
    for (key, default) in defaults {
        match target.get_mut(key) {
            None => {
                target.insert(key.clone(), default.clone());
                changed = true;
            }
            Some(toml::Value::Table(existing)) => {
                if let toml::Value::Table(nested) = default {
                    changed |= merge_missing(existing, nested);
                }
            }
            Some(_) => {}
        }
    }
    changed
}

/// Split a dotted key into segments, honouring `\.` as a literal dot.
pub fn split_key(key: &str) -> Vec<String> {
    if key.is_empty() {
        return Vec::new();
    }

    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = key.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'.') => {
                current.push('.');
                chars.next();
            }
            '.' => segments.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    segments.push(current);
    segments
}
