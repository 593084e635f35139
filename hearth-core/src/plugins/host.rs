//! PluginHost - the plugin runtime owned by the process entry point
//!
//! Loading lives in `resolver`, state transitions in `lifecycle` and
//! directory sweeps in `discovery`; this file holds the host itself and
//! its read-only queries.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use hearth_plugin_api::{PluginDescriptor, PluginState};

use super::isolation::{ArtifactLoader, DylibLoader};
use super::instance::PluginInstance;
use super::registry::PluginRegistry;
use crate::platform::{ChatClientFactory, DetachedClientFactory};

/// Default artifact file extension
pub const DEFAULT_EXTENSION: &str = "plugin";

/// Configuration for PluginHost
#[derive(Debug, Clone)]
pub struct PluginHostConfig {
    /// Directory scanned for artifacts (~/.config/hearth/plugins)
    pub plugin_dir: PathBuf,
    /// Root of the per-plugin data directories (~/.local/share/hearth/plugins)
    pub data_dir: PathBuf,
    /// Artifact file extension, without the dot
    pub extension: String,
    /// Persisted list of plugins to enable at startup
    pub enabled_list: PathBuf,
}

impl Default for PluginHostConfig {
    fn default() -> Self {
        Self {
            plugin_dir: hearth_paths::plugin_dir(),
            data_dir: hearth_paths::plugin_data_dir(),
            extension: DEFAULT_EXTENSION.to_string(),
            enabled_list: hearth_paths::enabled_list_path(),
        }
    }
}

impl PluginHostConfig {
    /// Config rooted at one directory, as used by tests and `--plugins`
    pub fn rooted(plugin_dir: impl Into<PathBuf>, data_dir: impl Into<PathBuf>) -> Self {
        let plugin_dir = plugin_dir.into();
        Self {
            enabled_list: plugin_dir.join("enabled.toml"),
            plugin_dir,
            data_dir: data_dir.into(),
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }
}

/// Information about a plugin
#[derive(Debug, Clone)]
pub struct PluginInfo {
    /// Resolved plugin name
    pub name: String,
    /// Plugin descriptor
    pub descriptor: PluginDescriptor,
    /// Current state
    pub state: PluginState,
    /// Plugins that depend on this one
    pub dependants: Vec<String>,
    /// Chat commands the plugin registered
    pub commands: Vec<String>,
    /// When the plugin was enabled, if it is
    pub enabled_at: Option<DateTime<Utc>>,
    /// Whether the plugin holds a platform connection
    pub has_connection: bool,
}

/// The plugin host loads, enables, disables and unloads plugins
pub struct PluginHost {
    pub(crate) config: PluginHostConfig,
    pub(crate) loader: Arc<dyn ArtifactLoader>,
    pub(crate) clients: Arc<dyn ChatClientFactory>,
    pub(crate) registry: PluginRegistry,
}

impl PluginHost {
    /// Create a new plugin host
    pub fn new(
        config: PluginHostConfig,
        loader: Arc<dyn ArtifactLoader>,
        clients: Arc<dyn ChatClientFactory>,
    ) -> Self {
        Self {
            config,
            loader,
            clients,
            registry: PluginRegistry::new(),
        }
    }

    /// Host that loads native plugin libraries and gives them detached
    /// platform connections
    pub fn with_dylib(config: PluginHostConfig) -> Self {
        Self::new(
            config,
            Arc::new(DylibLoader::new()),
            Arc::new(DetachedClientFactory),
        )
    }

    pub fn config(&self) -> &PluginHostConfig {
        &self.config
    }

    /// Where the artifact for a requested name lives
    pub fn artifact_path(&self, name: &str) -> PathBuf {
        self.config
            .plugin_dir
            .join(format!("{name}.{}", self.config.extension))
    }

    // ─── Queries ────────────────────────────────────────────────────

    /// Look up a loaded plugin by exact name
    pub fn get_plugin(&self, name: &str) -> Option<&PluginInstance> {
        self.registry.get(name)
    }

    /// Look up a loaded plugin by its concrete type
    pub fn get_plugin_by_type<T: 'static>(&self) -> Option<&PluginInstance> {
        self.registry.find_by_type::<T>()
    }

    /// Plugins that directly depend on `name`
    pub fn dependants_of(&self, name: &str) -> &[String] {
        self.registry.dependants_of(name)
    }

    pub fn plugin_count(&self) -> usize {
        self.registry.len()
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Get info for one plugin
    pub fn plugin_info(&self, name: &str) -> Option<PluginInfo> {
        let instance = self.registry.get(name)?;
        Some(PluginInfo {
            name: instance.name().to_string(),
            descriptor: instance.descriptor().clone(),
            state: instance.state(),
            dependants: self.registry.dependants_of(name).to_vec(),
            commands: self
                .registry
                .commands()
                .commands_of(name)
                .into_iter()
                .map(str::to_owned)
                .collect(),
            enabled_at: instance.enabled_at(),
            has_connection: instance.client().is_some(),
        })
    }

    /// List all loaded plugins in load order
    pub fn list_plugins(&self) -> Vec<PluginInfo> {
        self.registry
            .names()
            .iter()
            .filter_map(|name| self.plugin_info(name))
            .collect()
    }
}
