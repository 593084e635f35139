//! PluginRegistrar - what a plugin artifact hands to the host on load
//!
//! A dynamic library fills a registrar through its `_hearth_plugin_register`
//! entry point (generated by [`export_plugin!`](crate::export_plugin)).
//! Statically linked plugins fill one directly.

use crate::types::PluginDescriptor;
use crate::Plugin;

/// Constructor for a plugin instance
pub type PluginFactory = fn() -> Box<dyn Plugin>;

/// One plugin type exported by an artifact
#[derive(Clone)]
pub struct PluginEntry {
    /// Rust type name of the plugin, used for lookup by type
    pub type_name: &'static str,
    /// Identity metadata, if the type declares any
    pub descriptor: Option<PluginDescriptor>,
    /// Creates a fresh instance
    pub factory: PluginFactory,
}

impl std::fmt::Debug for PluginEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginEntry")
            .field("type_name", &self.type_name)
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// Collects the plugin types an artifact exports
#[derive(Debug, Default)]
pub struct PluginRegistrar {
    build_version: Option<String>,
    entries: Vec<PluginEntry>,
}

impl PluginRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the version the artifact was built as
    pub fn set_build_version(&mut self, version: impl Into<String>) {
        self.build_version = Some(version.into());
    }

    /// Register a plugin type
    pub fn register<P: Plugin + Default + 'static>(&mut self) {
        self.entries.push(PluginEntry {
            type_name: std::any::type_name::<P>(),
            descriptor: P::descriptor(),
            factory: create::<P>,
        });
    }

    /// Register an entry built by hand
    pub fn register_entry(&mut self, entry: PluginEntry) {
        self.entries.push(entry);
    }

    pub fn build_version(&self) -> Option<&str> {
        self.build_version.as_deref()
    }

    pub fn entries(&self) -> &[PluginEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<PluginEntry> {
        self.entries
    }
}

fn create<P: Plugin + Default + 'static>() -> Box<dyn Plugin> {
    Box::new(P::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PluginContext, PluginError, async_trait};

    #[derive(Default)]
    struct Named;

    #[async_trait]
    impl Plugin for Named {
        fn descriptor() -> Option<PluginDescriptor> {
            Some(PluginDescriptor::new("named", "1.0.0"))
        }

        async fn on_load(&mut self, _ctx: &mut PluginContext) -> Result<(), PluginError> {
            Ok(())
        }
    }

    #[test]
    fn test_register_records_type_and_descriptor() {
        let mut registrar = PluginRegistrar::new();
        registrar.set_build_version("1.0.1");
        registrar.register::<Named>();

        assert_eq!(registrar.build_version(), Some("1.0.1"));
        let entry = &registrar.entries()[0];
        assert!(entry.type_name.ends_with("Named"));
        assert_eq!(entry.descriptor.as_ref().unwrap().name, "named");
    }

    #[test]
    fn test_factory_creates_fresh_instances() {
        let mut registrar = PluginRegistrar::new();
        registrar.register::<Named>();
        let entry = registrar.into_entries().remove(0);

        let _first = (entry.factory)();
        let _second = (entry.factory)();
    }
}
