use hearth_core::PluginHostConfig;
use hearth_core::plugins::DEFAULT_EXTENSION;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawHearthConfig {
    #[serde(default)]
    pub plugins: RawPluginsConfig,

    #[serde(default)]
    pub log: LogConfig,
}

/// Plugin section as stored in TOML (optional fields for proper merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawPluginsConfig {
    /// Directory scanned for plugin artifacts
    pub dir: Option<PathBuf>,

    /// Root of the per-plugin data directories
    pub data_dir: Option<PathBuf>,

    /// Artifact file extension
    pub extension: Option<String>,

    /// Enable the plugins on the enabled list at startup
    pub auto_enable: Option<bool>,
}

/// Final configuration with defaults applied
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HearthConfig {
    #[serde(default)]
    pub plugins: PluginsConfig,

    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginsConfig {
    pub dir: PathBuf,
    pub data_dir: PathBuf,
    pub extension: String,
    pub auto_enable: bool,
}

impl Default for PluginsConfig {
    fn default() -> Self {
        Self {
            dir: hearth_paths::plugin_dir(),
            data_dir: hearth_paths::plugin_data_dir(),
            extension: DEFAULT_EXTENSION.to_string(),
            auto_enable: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LogConfig {
    /// Default tracing filter, e.g. `"info,hearth_core=debug"`
    pub filter: Option<String>,
}

impl HearthConfig {
    /// Host configuration, optionally pointed at another plugin directory.
    ///
    /// The enabled list lives beside the artifacts when the directory is
    /// overridden, so a throwaway plugin dir never edits the user's list.
    pub fn host_config(&self, plugin_dir: Option<&Path>) -> PluginHostConfig {
        let enabled_list = match plugin_dir {
            Some(dir) => dir.join("enabled.toml"),
            None => hearth_paths::enabled_list_path(),
        };
        PluginHostConfig {
            plugin_dir: plugin_dir.map_or_else(|| self.plugins.dir.clone(), Path::to_path_buf),
            data_dir: self.plugins.data_dir.clone(),
            extension: self.plugins.extension.clone(),
            enabled_list,
        }
    }
}
