//! Chat platform connections
//!
//! The host never talks to the chat platform itself. It asks a
//! [`ChatClientFactory`] for one connection per plugin that has a credential
//! configured, then connects and disconnects it as the plugin is enabled and
//! disabled.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use hearth_plugin_api::{ChatClient, Intents, PluginError};

/// Builds platform connections for plugins
pub trait ChatClientFactory: Send + Sync {
    fn create(
        &self,
        plugin: &str,
        token: &str,
        intents: &Intents,
    ) -> Result<Arc<dyn ChatClient>, PluginError>;
}

/// Factory used when no platform integration is linked in.
///
/// Its clients only track whether they are connected, which is enough to
/// run plugins that do not need live platform events.
#[derive(Debug, Default, Clone)]
pub struct DetachedClientFactory;

impl ChatClientFactory for DetachedClientFactory {
    fn create(
        &self,
        plugin: &str,
        token: &str,
        intents: &Intents,
    ) -> Result<Arc<dyn ChatClient>, PluginError> {
        if token.trim().is_empty() {
            return Err(PluginError::connection("empty connection token"));
        }
        if intents.is_privileged() {
            tracing::info!(plugin = %plugin, "Plugin requests privileged intents");
        }
        Ok(Arc::new(DetachedClient {
            plugin: plugin.to_string(),
            connected: AtomicBool::new(false),
        }))
    }
}

/// A connection that goes nowhere
#[derive(Debug)]
pub struct DetachedClient {
    plugin: String,
    connected: AtomicBool,
}

#[async_trait]
impl ChatClient for DetachedClient {
    async fn connect(&self) -> Result<(), PluginError> {
        self.connected.store(true, Ordering::SeqCst);
        tracing::debug!(plugin = %self.plugin, "Detached client connected");
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), PluginError> {
        self.connected.store(false, Ordering::SeqCst);
        tracing::debug!(plugin = %self.plugin, "Detached client disconnected");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}
