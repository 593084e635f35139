//! Plugin registry - the one authoritative table of live plugins
//!
//! Owns every [`PluginInstance`] by resolved name and keeps the derived
//! indexes next to it: load order, the enabled set, reverse dependency
//! edges and command ownership. Only `add`, `remove` and `set_enabled`
//! change which plugins exist or run.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

use hearth_plugin_api::{CommandSpec, PluginDirectory, PluginState, PluginSummary};

use super::commands::CommandRegistry;
use super::error::PluginHostError;
use super::instance::PluginInstance;

/// Registry of loaded plugins
#[derive(Default)]
pub struct PluginRegistry {
    plugins: HashMap<String, PluginInstance>,
    /// Resolved names, oldest first
    load_order: Vec<String>,
    enabled: HashSet<String>,
    /// Dependency name -> plugins that declared it
    dependants: HashMap<String, Vec<String>>,
    commands: CommandRegistry,
    view: RegistryView,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly loaded instance
    pub fn add(&mut self, instance: PluginInstance) -> Result<(), PluginHostError> {
        let name = instance.name().to_string();
        if self.plugins.contains_key(&name) {
            return Err(PluginHostError::DuplicateName { name });
        }
        if instance.is_enabled() {
            self.enabled.insert(name.clone());
        }
        self.load_order.push(name.clone());
        self.plugins.insert(name, instance);
        self.refresh_view();
        Ok(())
    }

    /// Remove an instance and every index entry that mentions it
    pub fn remove(&mut self, name: &str) -> Option<PluginInstance> {
        let instance = self.plugins.remove(name)?;
        self.load_order.retain(|n| n != name);
        self.enabled.remove(name);
        self.dependants.remove(name);
        for dependants in self.dependants.values_mut() {
            dependants.retain(|n| n != name);
        }
        self.commands.unregister(name);
        self.refresh_view();
        Some(instance)
    }

    /// Flip a plugin between Enabled and Disabled. Returns false if unknown.
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        let Some(instance) = self.plugins.get_mut(name) else {
            return false;
        };
        if enabled {
            instance.set_state(PluginState::Enabled);
            self.enabled.insert(name.to_string());
        } else {
            instance.set_state(PluginState::Disabled);
            self.enabled.remove(name);
        }
        self.refresh_view();
        true
    }

    // ─── Lookup ─────────────────────────────────────────────────────

    pub fn contains(&self, name: &str) -> bool {
        self.plugins.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&PluginInstance> {
        self.plugins.get(name)
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut PluginInstance> {
        self.plugins.get_mut(name)
    }

    /// Find the plugin that was loaded from the artifact `requested`
    pub fn find_by_requested_name(&self, requested: &str) -> Option<&PluginInstance> {
        self.iter().find(|p| p.requested_name() == requested)
    }

    /// Find the plugin whose object has the given Rust type name
    pub fn find_by_type_name(&self, type_name: &str) -> Option<&PluginInstance> {
        self.iter().find(|p| p.type_name() == type_name)
    }

    /// Find the plugin whose object is a `T`
    pub fn find_by_type<T: 'static>(&self) -> Option<&PluginInstance> {
        self.find_by_type_name(std::any::type_name::<T>())
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.enabled.contains(name)
    }

    /// Names in load order
    pub fn names(&self) -> &[String] {
        &self.load_order
    }

    /// Instances in load order
    pub fn iter(&self) -> impl Iterator<Item = &PluginInstance> {
        self.load_order.iter().filter_map(|n| self.plugins.get(n))
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    // ─── Dependency index ───────────────────────────────────────────

    /// Record that `dependant` requires `dependency`
    pub fn add_dependant(&mut self, dependency: &str, dependant: &str) {
        let list = self.dependants.entry(dependency.to_string()).or_default();
        if !list.iter().any(|n| n == dependant) {
            list.push(dependant.to_string());
        }
    }

    /// Plugins that directly depend on `name`
    pub fn dependants_of(&self, name: &str) -> &[String] {
        self.dependants.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    // ─── Commands ───────────────────────────────────────────────────

    /// Record a plugin's commands, returning names another plugin already had
    pub fn register_commands(&mut self, name: &str, commands: Vec<CommandSpec>) -> Vec<String> {
        self.commands.register(name, commands)
    }

    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    // ─── Shared view ────────────────────────────────────────────────

    /// Read-only view handed to plugins
    pub fn view(&self) -> RegistryView {
        self.view.clone()
    }

    fn refresh_view(&self) {
        let summaries = self
            .iter()
            .map(|p| PluginSummary {
                name: p.name().to_string(),
                version: p.version().to_string(),
                state: p.state(),
            })
            .collect();
        self.view.replace(summaries);
    }
}

/// Snapshot of the registry that plugins may hold on to
#[derive(Clone, Default)]
pub struct RegistryView(Arc<RwLock<Vec<PluginSummary>>>);

impl RegistryView {
    fn replace(&self, summaries: Vec<PluginSummary>) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = summaries;
    }
}

impl PluginDirectory for RegistryView {
    fn plugins(&self) -> Vec<PluginSummary> {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_default_is_empty() {
        let registry = PluginRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.names().is_empty());
        assert!(registry.view().plugins().is_empty());
    }

    #[test]
    fn test_dependants_have_no_duplicates() {
        let mut registry = PluginRegistry::new();
        registry.add_dependant("storage", "greeter");
        registry.add_dependant("storage", "greeter");
        registry.add_dependant("storage", "audit");

        assert_eq!(registry.dependants_of("storage"), ["greeter", "audit"]);
        assert!(registry.dependants_of("greeter").is_empty());
    }

    #[test]
    fn test_unknown_plugin_operations() {
        let mut registry = PluginRegistry::new();
        assert!(!registry.set_enabled("ghost", true));
        assert!(registry.remove("ghost").is_none());
        assert!(registry.get("ghost").is_none());
        assert!(!registry.is_enabled("ghost"));
    }

    #[test]
    fn test_register_commands_reports_collisions() {
        let mut registry = PluginRegistry::new();
        registry.register_commands("a", vec![CommandSpec::new("ping", "Ping")]);
        let collisions = registry.register_commands("b", vec![CommandSpec::new("ping", "Ping")]);

        assert_eq!(collisions, vec!["ping"]);
        assert_eq!(registry.commands().owners("ping"), vec!["a", "b"]);
    }
}
