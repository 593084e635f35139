//! hearth-core: plugin host runtime for the hearth chat bot
//!
//! This crate provides the host side of hearth's plugin system:
//!
//! - **Plugin host** - [`PluginHost`] discovers, loads, enables, disables and
//!   unloads plugins, resolving their dependencies on the way
//! - **Isolation** - [`plugins::DylibLoader`] loads each plugin's code into its
//!   own disposable context so it can be reclaimed and reloaded
//! - **Platform** - [`platform::ChatClientFactory`] builds the chat connections
//!   the host opens and closes for plugins
//!
//! # Quick Start
//!
//! ```no_run
//! use hearth_core::{EnabledList, PluginHost, PluginHostConfig};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PluginHostConfig::default();
//!     let enabled = EnabledList::load(&config.enabled_list)?;
//!     let mut host = PluginHost::with_dylib(config);
//!
//!     let report = host.bootstrap(&enabled).await?;
//!     for (name, kind) in report.failures() {
//!         eprintln!("{name} failed to load: {kind:?}");
//!     }
//!
//!     host.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                     PluginHost                       │
//! │  discovery ─▶ resolver ─▶ lifecycle                  │
//! │                  │            │                      │
//! │  ┌───────────────▼────────────▼───────────────────┐  │
//! │  │                PluginRegistry                  │  │
//! │  │  PluginInstance ─ plugin + context + client    │  │
//! │  │        └─ ContextGuard (isolation context)     │  │
//! │  └────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────┘
//! ```

pub mod platform;
pub mod plugins;

// Re-export key types for convenience
pub use platform::{ChatClientFactory, DetachedClientFactory};
pub use plugins::{
    BootstrapReport, EnabledList, ErrorKind, PluginHost, PluginHostConfig, PluginHostError,
    PluginInfo, PluginInstance,
};
