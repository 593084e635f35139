//! PluginContext - a plugin's private scope of host services

use crate::client::ChatClient;
use crate::command::CommandSpec;
use crate::config::PluginConfig;
use crate::error::PluginError;
use crate::service::BackgroundService;
use crate::types::{PluginState, PluginSummary};
use serde::{Serialize, de::DeserializeOwned};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Read-only view of the host's plugin table.
///
/// Handed to every plugin so it can look at its peers without holding a
/// reference to the host itself.
pub trait PluginDirectory: Send + Sync {
    /// Every registered plugin
    fn plugins(&self) -> Vec<PluginSummary>;

    /// Look up one plugin by exact name
    fn get(&self, name: &str) -> Option<PluginSummary> {
        self.plugins().into_iter().find(|p| p.name == name)
    }

    /// Whether the named plugin is registered and enabled
    fn is_enabled(&self, name: &str) -> bool {
        self.get(name).is_some_and(|p| p.state == PluginState::Enabled)
    }
}

/// Directory used when a context is built outside a host
struct EmptyDirectory;

impl PluginDirectory for EmptyDirectory {
    fn plugins(&self) -> Vec<PluginSummary> {
        Vec::new()
    }
}

/// Plugin's interface to host capabilities.
///
/// Built by the host for each plugin instance and passed to every hook. It
/// carries:
/// - the plugin's name and private data directory
/// - its configuration store
/// - a view of the other plugins ([`PluginDirectory`])
/// - its platform connection, when a credential is configured
/// - command and background-service registration
pub struct PluginContext {
    plugin_name: String,
    data_dir: PathBuf,
    config: PluginConfig,
    directory: Arc<dyn PluginDirectory>,
    client: Option<Arc<dyn ChatClient>>,
    pending_commands: Vec<CommandSpec>,
    pending_services: Vec<Box<dyn BackgroundService>>,
}

impl PluginContext {
    /// Create a new plugin context
    pub fn new(plugin_name: String, data_dir: PathBuf) -> Self {
        Self::with_config(plugin_name, data_dir, PluginConfig::new())
    }

    /// Create a context with a pre-loaded config
    pub fn with_config(plugin_name: String, data_dir: PathBuf, config: PluginConfig) -> Self {
        Self {
            plugin_name,
            data_dir,
            config,
            directory: Arc::new(EmptyDirectory),
            client: None,
            pending_commands: Vec::new(),
            pending_services: Vec::new(),
        }
    }

    /// Builder: set the view of the host's plugins
    pub fn with_directory(mut self, directory: Arc<dyn PluginDirectory>) -> Self {
        self.directory = directory;
        self
    }

    /// Builder: attach the platform connection
    pub fn with_client(mut self, client: Arc<dyn ChatClient>) -> Self {
        self.client = Some(client);
        self
    }

    // ─── Identity & Storage ─────────────────────────────────────────

    /// Get the plugin's name
    pub fn plugin_name(&self) -> &str {
        &self.plugin_name
    }

    /// Get the plugin's private data directory
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    // ─── Configuration ───────────────────────────────────────────────

    /// Read a configuration value
    ///
    /// # Example
    /// ```ignore
    /// let limit: Option<u32> = ctx.config_get("spam.limit");
    /// ```
    pub fn config_get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.config.get(key)
    }

    /// Read a configuration value with a fallback
    pub fn config_get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.config.get_or(key, default)
    }

    /// Write a configuration value
    ///
    /// The host persists dirty configuration when the plugin is disabled or
    /// unloaded.
    pub fn config_set<T: Serialize>(&mut self, key: &str, value: T) -> Result<(), PluginError> {
        self.config.set(key, value)
    }

    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    /// Get a mutable reference to the config (for internal use by PluginHost)
    pub fn config_mut(&mut self) -> &mut PluginConfig {
        &mut self.config
    }

    // ─── Peers & Connection ─────────────────────────────────────────

    /// View of every plugin registered with the host
    pub fn plugins(&self) -> &dyn PluginDirectory {
        self.directory.as_ref()
    }

    /// The plugin's platform connection, if a credential is configured
    pub fn client(&self) -> Option<&Arc<dyn ChatClient>> {
        self.client.as_ref()
    }

    /// Detach the connection (used by PluginHost on teardown)
    pub fn take_client(&mut self) -> Option<Arc<dyn ChatClient>> {
        self.client.take()
    }

    // ─── Command Registration ───────────────────────────────────────

    /// Declare a chat command this plugin handles.
    ///
    /// Returns error if the name is already declared by this plugin. Clashes
    /// with other plugins are reported by the host as warnings.
    pub fn register_command(&mut self, spec: CommandSpec) -> Result<(), PluginError> {
        if self.pending_commands.iter().any(|c| c.name == spec.name) {
            return Err(PluginError::DuplicateCommand(spec.name));
        }
        self.pending_commands.push(spec);
        Ok(())
    }

    /// Get commands pending registration (used by PluginHost)
    pub fn pending_commands(&self) -> &[CommandSpec] {
        &self.pending_commands
    }

    /// Take pending commands (used by PluginHost after load)
    pub fn take_pending_commands(&mut self) -> Vec<CommandSpec> {
        std::mem::take(&mut self.pending_commands)
    }

    // ─── Background Services ────────────────────────────────────────

    /// Register a service to run while the plugin is enabled
    pub fn register_service(&mut self, service: Box<dyn BackgroundService>) {
        self.pending_services.push(service);
    }

    /// Take registered services (used by PluginHost after load)
    pub fn take_pending_services(&mut self) -> Vec<Box<dyn BackgroundService>> {
        std::mem::take(&mut self.pending_services)
    }

    // ─── Logging ─────────────────────────────────────────────────────

    /// Log an info message (automatically prefixed with plugin name)
    pub fn log_info(&self, message: &str) {
        tracing::info!(plugin = %self.plugin_name, "{}", message);
    }

    /// Log a warning message
    pub fn log_warn(&self, message: &str) {
        tracing::warn!(plugin = %self.plugin_name, "{}", message);
    }

    /// Log an error message
    pub fn log_error(&self, message: &str) {
        tracing::error!(plugin = %self.plugin_name, "{}", message);
    }

    /// Log a debug message
    pub fn log_debug(&self, message: &str) {
        tracing::debug!(plugin = %self.plugin_name, "{}", message);
    }
}
