//! Command registry for plugin chat commands
//!
//! Command names are global across plugins. A clash never blocks a plugin
//! from loading; it is reported so the operator can sort it out.

use std::collections::HashMap;

use hearth_plugin_api::CommandSpec;

/// A command registered by a plugin
#[derive(Debug, Clone)]
pub struct RegisteredPluginCommand {
    /// Name of the plugin that owns this command
    pub plugin_name: String,
    /// Command specification
    pub spec: CommandSpec,
}

/// Registry of all plugin commands
#[derive(Debug, Default)]
pub struct CommandRegistry {
    /// Commands by name; later registrations are kept alongside earlier ones
    commands: HashMap<String, Vec<RegisteredPluginCommand>>,
}

impl CommandRegistry {
    /// Create a new empty command registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register commands for a plugin.
    ///
    /// Returns the names that were already claimed by another plugin.
    pub fn register(&mut self, plugin_name: &str, commands: Vec<CommandSpec>) -> Vec<String> {
        let mut collisions = Vec::new();
        for spec in commands {
            let owners = self.commands.entry(spec.name.clone()).or_default();
            if let Some(existing) = owners.iter().find(|c| c.plugin_name != plugin_name) {
                tracing::warn!(
                    plugin = %plugin_name,
                    command = %spec.name,
                    owner = %existing.plugin_name,
                    "Command already registered by another plugin"
                );
                collisions.push(spec.name.clone());
            }
            owners.push(RegisteredPluginCommand {
                plugin_name: plugin_name.to_string(),
                spec,
            });
        }
        collisions
    }

    /// Plugins that registered a command, in registration order
    pub fn owners(&self, command: &str) -> Vec<&str> {
        self.commands
            .get(command)
            .map(|owners| owners.iter().map(|c| c.plugin_name.as_str()).collect())
            .unwrap_or_default()
    }

    /// Command names registered by a plugin
    pub fn commands_of(&self, plugin_name: &str) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .commands
            .iter()
            .filter(|(_, owners)| owners.iter().any(|c| c.plugin_name == plugin_name))
            .map(|(name, _)| name.as_str())
            .collect();
        names.sort_unstable();
        names
    }

    /// Get all registered commands
    pub fn all_commands(&self) -> impl Iterator<Item = &RegisteredPluginCommand> {
        self.commands.values().flatten()
    }

    /// Unregister all commands for a plugin
    pub fn unregister(&mut self, plugin_name: &str) {
        self.commands.retain(|_, owners| {
            owners.retain(|c| c.plugin_name != plugin_name);
            !owners.is_empty()
        });
    }
}
