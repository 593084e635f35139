//! Contexts for plugins linked into the host binary
//!
//! An artifact here is a small text file holding the key of a registration
//! function known to the loader. Built-in plugins ship that way, and so do
//! test fixtures.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use hearth_plugin_api::PluginRegistrar;

use super::{ArtifactLoader, IsolationContext};
use crate::plugins::error::{InvalidPlugin, PluginHostError};

/// Registration entry point of a statically linked plugin
pub type RegisterFn = fn(&mut PluginRegistrar);

/// Resolves artifacts to registration functions compiled into the host
#[derive(Clone, Default)]
pub struct StaticLoader {
    artifacts: HashMap<String, RegisterFn>,
    live: Arc<AtomicUsize>,
}

impl StaticLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: make `key` resolvable
    pub fn with_artifact(mut self, key: impl Into<String>, register: RegisterFn) -> Self {
        self.artifacts.insert(key.into(), register);
        self
    }

    /// Contexts created and not yet unloaded, across all clones
    pub fn live_contexts(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

impl ArtifactLoader for StaticLoader {
    fn create_context(&self, name: &str) -> Result<Box<dyn IsolationContext>, PluginHostError> {
        self.live.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(StaticContext {
            name: name.to_string(),
            artifacts: self.artifacts.clone(),
            live: Arc::clone(&self.live),
        }))
    }
}

struct StaticContext {
    name: String,
    artifacts: HashMap<String, RegisterFn>,
    live: Arc<AtomicUsize>,
}

impl IsolationContext for StaticContext {
    fn name(&self) -> &str {
        &self.name
    }

    fn load_artifact(&mut self, bytes: &[u8]) -> Result<PluginRegistrar, PluginHostError> {
        let key = String::from_utf8_lossy(bytes).trim().to_string();
        let register = self.artifacts.get(&key).ok_or_else(|| {
            PluginHostError::invalid(&self.name, InvalidPlugin::UnknownArtifact(key.clone()))
        })?;

        let mut registrar = PluginRegistrar::new();
        register(&mut registrar);
        Ok(registrar)
    }

    fn unload(self: Box<Self>) {}
}

impl Drop for StaticContext {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}
