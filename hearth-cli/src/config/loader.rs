use super::types::{HearthConfig, LogConfig, PluginsConfig, RawHearthConfig, RawPluginsConfig};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (user + project)
    pub fn load() -> Result<HearthConfig> {
        Self::load_from_paths(&Self::user_config_path(), &Self::project_config_path())
    }

    /// Load configuration from explicit user and project files.
    ///
    /// Missing files are skipped; project values override user values.
    pub fn load_from_paths(user_path: &Path, project_path: &Path) -> Result<HearthConfig> {
        let mut raw = RawHearthConfig::default();

        // Layer 1: User config
        if let Some(user_config) = Self::read_raw(user_path)? {
            raw = Self::merge_raw(raw, user_config);
        }

        // Layer 2: Project config
        if let Some(project_config) = Self::read_raw(project_path)? {
            raw = Self::merge_raw(raw, project_config);
        }

        Ok(Self::finalize(raw))
    }

    /// Get user config path
    pub fn user_config_path() -> PathBuf {
        hearth_paths::config_dir().join("config.toml")
    }

    /// Get project config path
    /// Can be overridden with HEARTH_PROJECT_CONFIG_DIR env var
    pub fn project_config_path() -> PathBuf {
        match std::env::var_os("HEARTH_PROJECT_CONFIG_DIR") {
            Some(dir) => PathBuf::from(dir).join("config.toml"),
            None => PathBuf::from(".hearth/config.toml"),
        }
    }

    fn read_raw(path: &Path) -> Result<Option<RawHearthConfig>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let raw = toml::from_str(&contents)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(Some(raw))
    }

    /// Merge two raw configs (overlay values override base only if explicitly set)
    fn merge_raw(base: RawHearthConfig, overlay: RawHearthConfig) -> RawHearthConfig {
        RawHearthConfig {
            plugins: RawPluginsConfig {
                dir: overlay.plugins.dir.or(base.plugins.dir),
                data_dir: overlay.plugins.data_dir.or(base.plugins.data_dir),
                extension: overlay.plugins.extension.or(base.plugins.extension),
                auto_enable: overlay.plugins.auto_enable.or(base.plugins.auto_enable),
            },
            log: LogConfig {
                filter: overlay.log.filter.or(base.log.filter),
            },
        }
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: RawHearthConfig) -> HearthConfig {
        let defaults = PluginsConfig::default();
        HearthConfig {
            plugins: PluginsConfig {
                dir: raw.plugins.dir.unwrap_or(defaults.dir),
                data_dir: raw.plugins.data_dir.unwrap_or(defaults.data_dir),
                extension: raw.plugins.extension.unwrap_or(defaults.extension),
                auto_enable: raw.plugins.auto_enable.unwrap_or(defaults.auto_enable),
            },
            log: raw.log,
        }
    }
}
