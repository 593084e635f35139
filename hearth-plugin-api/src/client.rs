//! Platform connection interface
//!
//! The host builds one connection per plugin that has a credential configured.
//! The connection runs its own event dispatch; the host only opens it after a
//! successful enable and closes it on disable or unload.

use async_trait::async_trait;

use crate::error::PluginError;

/// A plugin's private connection to the chat platform
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Open the connection and start receiving events
    async fn connect(&self) -> Result<(), PluginError>;

    /// Close the connection
    async fn disconnect(&self) -> Result<(), PluginError>;

    /// Whether the connection is currently open
    fn is_connected(&self) -> bool;
}
