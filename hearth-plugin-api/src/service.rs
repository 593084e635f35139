//! Background services owned by a plugin

use async_trait::async_trait;

use crate::error::PluginError;

/// A long-running task a plugin registers during `on_load`.
///
/// The host starts every registered service when the plugin is enabled and
/// stops them when it is disabled.
#[async_trait]
pub trait BackgroundService: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    async fn start(&mut self) -> Result<(), PluginError>;

    async fn stop(&mut self) -> Result<(), PluginError>;
}
