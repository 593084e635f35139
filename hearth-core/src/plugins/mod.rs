//! Plugin system for hearth
//!
//! This module provides the infrastructure for loading and managing plugins:
//!
//! - [`PluginHost`]: The runtime that loads, enables, disables and unloads plugins
//! - [`PluginRegistry`]: The table of live plugins and their dependency edges
//! - [`EnabledList`]: Which plugins to enable at startup
//! - [`PluginHostError`]: Error types for plugin operations
//!
//! # Plugin Discovery
//!
//! Artifacts are files named `<name>.plugin` in `~/.config/hearth/plugins/`.
//! The file stem is the name a plugin is requested under; the name in its
//! descriptor is the one it is registered under.
//!
//! Each plugin gets a private directory `~/.local/share/hearth/plugins/<name>/`
//! holding its `config.toml`.
//!
//! # Example
//!
//! ```ignore
//! use hearth_core::plugins::{EnabledList, PluginHost, PluginHostConfig};
//!
//! let config = PluginHostConfig::default();
//! let enabled = EnabledList::load(&config.enabled_list)?;
//! let mut host = PluginHost::with_dylib(config);
//!
//! // Load everything, enable what the operator asked for
//! let report = host.bootstrap(&enabled).await?;
//!
//! // Manage plugins
//! host.disable("moderation").await?;
//! host.unload("moderation").await?;
//! ```

mod commands;
mod descriptor;
mod discovery;
mod enabled;
mod error;
mod host;
mod instance;
mod isolation;
mod lifecycle;
mod registry;
mod resolver;

pub use commands::{CommandRegistry, RegisteredPluginCommand};
pub use discovery::{BootstrapReport, DiscoveredArtifact, LoadOutcome, discover_artifacts};
pub use enabled::EnabledList;
pub use error::{ErrorKind, HookKind, InvalidPlugin, PluginHostError};
pub use host::{DEFAULT_EXTENSION, PluginHost, PluginHostConfig, PluginInfo};
pub use instance::PluginInstance;
pub use isolation::{
    ArtifactLoader, ContextGuard, DylibLoader, IsolationContext, RegisterFn, StaticLoader,
};
pub use registry::{PluginRegistry, RegistryView};
