//! Plugin host error types

use std::fmt;
use std::path::PathBuf;

use hearth_plugin_api::{PluginError, PluginState};
use thiserror::Error;

/// Ways an artifact can be malformed
#[derive(Error, Debug)]
pub enum InvalidPlugin {
    /// The artifact registers no plugin type
    #[error("artifact exports no plugin type")]
    NoPluginType,

    /// The artifact registers more than one plugin type
    #[error("artifact exports {count} plugin types ({}), expected exactly one", .types.join(", "))]
    MultiplePluginTypes { count: usize, types: Vec<String> },

    /// The plugin type declares no identity metadata
    #[error("plugin type {type_name} declares no descriptor")]
    MissingDescriptor { type_name: String },

    /// The descriptor's name or version is blank
    #[error("plugin type {type_name} declares an empty {field}")]
    EmptyIdentity {
        type_name: String,
        field: &'static str,
    },

    /// API version mismatch between hearth and plugin
    #[error("API version mismatch: hearth expects {expected}, plugin has {found}")]
    ApiVersionMismatch { expected: u32, found: u32 },

    /// Failed to load dynamic library
    #[error("failed to load plugin library: {0}")]
    Library(#[from] libloading::Error),

    /// Artifact does not name a statically linked plugin
    #[error("unknown built-in artifact '{0}'")]
    UnknownArtifact(String),
}

/// Lifecycle hook a failure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    Load,
    Enable,
    Disable,
    Unload,
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Load => "load",
            Self::Enable => "enable",
            Self::Disable => "disable",
            Self::Unload => "unload",
        };
        f.write_str(s)
    }
}

/// Errors that can occur in the plugin host
#[derive(Error, Debug)]
pub enum PluginHostError {
    /// No artifact for the requested name
    #[error("Plugin '{name}' not found at {path}")]
    NotFound { name: String, path: PathBuf },

    /// The artifact is malformed
    #[error("Invalid plugin '{name}': {reason}")]
    Invalid {
        name: String,
        #[source]
        reason: InvalidPlugin,
    },

    /// Another plugin already uses this name
    #[error("Plugin name '{name}' is already registered")]
    DuplicateName { name: String },

    /// A plugin depends on itself, directly or transitively
    #[error("Circular plugin dependency: {}", .chain.join(" -> "))]
    CircularDependency { name: String, chain: Vec<String> },

    /// No plugin registered under this name
    #[error("Plugin '{name}' is not loaded")]
    NotLoaded { name: String },

    /// Operation not allowed in the plugin's current state
    #[error("Cannot {operation} plugin '{name}' while it is {state}")]
    InvalidState {
        name: String,
        state: PluginState,
        operation: &'static str,
    },

    /// A plugin-authored hook returned an error or panicked
    #[error("Plugin '{name}' {hook} hook failed: {source}")]
    Hook {
        name: String,
        hook: HookKind,
        source: PluginError,
    },

    /// Building or opening the platform connection failed
    #[error("Connection for plugin '{name}' failed: {source}")]
    Connection { name: String, source: PluginError },

    /// The plugin's configuration store could not be read or written
    #[error("Configuration error for plugin '{name}': {source}")]
    Config { name: String, source: PluginError },

    /// Enabled-list error (parsing, saving, etc.)
    #[error("Enabled list error: {0}")]
    EnabledList(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification used in bootstrap reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Invalid,
    DuplicateName,
    CircularDependency,
    NotLoaded,
    InvalidState,
    HookFailure,
    Connection,
    Config,
    Io,
}

impl PluginHostError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Invalid { .. } => ErrorKind::Invalid,
            Self::DuplicateName { .. } => ErrorKind::DuplicateName,
            Self::CircularDependency { .. } => ErrorKind::CircularDependency,
            Self::NotLoaded { .. } => ErrorKind::NotLoaded,
            Self::InvalidState { .. } => ErrorKind::InvalidState,
            Self::Hook { .. } => ErrorKind::HookFailure,
            Self::Connection { .. } => ErrorKind::Connection,
            Self::Config { .. } | Self::EnabledList(_) => ErrorKind::Config,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    pub(crate) fn invalid(name: &str, reason: InvalidPlugin) -> Self {
        Self::Invalid {
            name: name.to_string(),
            reason,
        }
    }

    pub(crate) fn not_loaded(name: &str) -> Self {
        Self::NotLoaded {
            name: name.to_string(),
        }
    }
}
