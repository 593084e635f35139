//! XDG Base Directory paths for hearth.
//!
//! The host keeps plugin artifacts under the config directory and each
//! plugin's private data (config store, files) under the data directory.

use std::path::PathBuf;

const APP_DIR: &str = "hearth";

fn xdg_dir(env_var: &str, home_relative: &str) -> PathBuf {
    match std::env::var_os(env_var) {
        Some(base) if !base.is_empty() => PathBuf::from(base).join(APP_DIR),
        _ => match dirs::home_dir() {
            Some(home) => home.join(home_relative).join(APP_DIR),
            None => PathBuf::from(home_relative).join(APP_DIR),
        },
    }
}

/// Get the hearth config directory.
///
/// Returns `$XDG_CONFIG_HOME/hearth` if set, otherwise `~/.config/hearth`.
///
/// # Examples
///
/// ```
/// let config = hearth_paths::config_dir();
/// assert!(config.ends_with("hearth"));
/// ```
pub fn config_dir() -> PathBuf {
    xdg_dir("XDG_CONFIG_HOME", ".config")
}

/// Get the hearth data directory.
///
/// Returns `$XDG_DATA_HOME/hearth` if set, otherwise `~/.local/share/hearth`.
pub fn data_dir() -> PathBuf {
    xdg_dir("XDG_DATA_HOME", ".local/share")
}

/// Directory scanned for plugin artifacts.
pub fn plugin_dir() -> PathBuf {
    config_dir().join("plugins")
}

/// Root of the per-plugin data directories.
pub fn plugin_data_dir() -> PathBuf {
    data_dir().join("plugins")
}

/// File listing the plugins to enable at startup.
pub fn enabled_list_path() -> PathBuf {
    config_dir().join("enabled.toml")
}
