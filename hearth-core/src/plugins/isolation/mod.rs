//! Isolation contexts - disposable units of plugin code loading
//!
//! Every plugin instance owns exactly one context. Unloading the context
//! reclaims the plugin's code, so it must only happen after the plugin
//! object and everything it handed out has been dropped. [`ContextGuard`]
//! enforces that ordering when it is the last field of its owner.

mod dylib;
mod statics;

pub use dylib::DylibLoader;
pub use statics::{RegisterFn, StaticLoader};

use hearth_plugin_api::PluginRegistrar;

use super::error::PluginHostError;

/// One loaded artifact's code
pub trait IsolationContext: Send {
    /// Name the context was created for
    fn name(&self) -> &str;

    /// Load artifact bytes and run its registration entry point
    fn load_artifact(&mut self, bytes: &[u8]) -> Result<PluginRegistrar, PluginHostError>;

    /// Release the loaded code. Consumes the context, so it runs at most once.
    fn unload(self: Box<Self>);
}

/// Creates isolation contexts
pub trait ArtifactLoader: Send + Sync {
    fn create_context(&self, name: &str) -> Result<Box<dyn IsolationContext>, PluginHostError>;
}

/// Unloads its context when dropped
pub struct ContextGuard(Option<Box<dyn IsolationContext>>);

impl ContextGuard {
    pub fn new(context: Box<dyn IsolationContext>) -> Self {
        Self(Some(context))
    }
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        if let Some(context) = self.0.take() {
            tracing::debug!(context = %context.name(), "Unloading isolation context");
            context.unload();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_plugin_api::{Plugin, PluginContext, PluginDescriptor, PluginError, async_trait};

    #[derive(Default)]
    struct Sample;

    #[async_trait]
    impl Plugin for Sample {
        fn descriptor() -> Option<PluginDescriptor> {
            Some(PluginDescriptor::new("sample", "0.1.0"))
        }

        async fn on_load(&mut self, _ctx: &mut PluginContext) -> Result<(), PluginError> {
            Ok(())
        }
    }

    fn register_sample(registrar: &mut PluginRegistrar) {
        registrar.register::<Sample>();
    }

    #[test]
    fn test_guard_unloads_on_drop() {
        let loader = StaticLoader::new().with_artifact("sample", register_sample);
        let context = loader.create_context("sample").unwrap();
        assert_eq!(loader.live_contexts(), 1);

        let guard = ContextGuard::new(context);
        drop(guard);

        assert_eq!(loader.live_contexts(), 0);
    }
}
