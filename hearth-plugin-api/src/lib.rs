//! hearth-plugin-api - Plugin API for the hearth chat bot host
//!
//! This crate provides the traits and types needed to write plugins for hearth.
//! Plugins are native Rust dynamic libraries that the host loads, enables,
//! disables and unloads at run time without restarting.
//!
//! # Example
//!
//! ```ignore
//! use hearth_plugin_api::{
//!     Plugin, PluginContext, PluginDescriptor, PluginError, async_trait, export_plugin,
//! };
//!
//! #[derive(Default)]
//! pub struct Greeter;
//!
//! #[async_trait]
//! impl Plugin for Greeter {
//!     fn descriptor() -> Option<PluginDescriptor> {
//!         Some(PluginDescriptor::new("greeter", "0.1.0").with_dependencies(["storage"]))
//!     }
//!
//!     async fn on_load(&mut self, ctx: &mut PluginContext) -> Result<(), PluginError> {
//!         ctx.log_info("Greeter loaded");
//!         Ok(())
//!     }
//! }
//!
//! export_plugin!(Greeter);
//! ```

pub mod client;
pub mod command;
pub mod config;
pub mod context;
pub mod error;
pub mod registrar;
pub mod service;
pub mod types;

pub use async_trait::async_trait;
pub use client::ChatClient;
pub use command::CommandSpec;
pub use config::PluginConfig;
pub use context::{PluginContext, PluginDirectory};
pub use error::PluginError;
pub use registrar::{PluginEntry, PluginFactory, PluginRegistrar};
pub use service::BackgroundService;
pub use types::*;

/// Current plugin API version. Plugins must match this exactly.
/// This is checked when loading plugins to ensure compatibility.
pub const API_VERSION: u32 = 1;

/// Configuration key holding the platform connection credential.
///
/// When absent the plugin runs without a live platform connection.
pub const CONNECTION_TOKEN_KEY: &str = "connection.token";

/// The core plugin trait - implement this to create a hearth plugin.
///
/// Every hook is awaited to completion by the host before the plugin's
/// lifecycle state advances. Only `on_load` is mandatory.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Static identity metadata for this plugin type.
    ///
    /// Returning `None` makes the artifact invalid: the host refuses to load a
    /// plugin it cannot name.
    fn descriptor() -> Option<PluginDescriptor>
    where
        Self: Sized,
    {
        None
    }

    /// Called once after dependencies are loaded and the context is built.
    /// Register commands and background services here.
    async fn on_load(&mut self, ctx: &mut PluginContext) -> Result<(), PluginError>;

    /// Called when the plugin is enabled, before its connection is opened.
    async fn on_enable(&mut self, _ctx: &mut PluginContext) -> Result<(), PluginError> {
        Ok(())
    }

    /// Called when the plugin is disabled, before its connection is closed.
    async fn on_disable(&mut self, _ctx: &mut PluginContext) -> Result<(), PluginError> {
        Ok(())
    }

    /// Called right before the plugin is dropped and its code reclaimed.
    async fn on_unload(&mut self, _ctx: &mut PluginContext) -> Result<(), PluginError> {
        Ok(())
    }
}

/// Export plugin types for dynamic loading.
///
/// This macro generates the entry points that hearth uses to inspect and
/// instantiate the plugins of a library. A library is expected to export
/// exactly one plugin type; listing more makes it ambiguous and the host
/// rejects it.
///
/// # Usage
///
/// ```ignore
/// hearth_plugin_api::export_plugin!(MyPlugin);
/// ```
///
/// # Generated Functions
///
/// - `_hearth_plugin_api_version()`: Returns the API version
/// - `_hearth_plugin_register()`: Records the plugin types and the crate version
#[macro_export]
macro_rules! export_plugin {
    ($($plugin_type:ty),+ $(,)?) => {
        #[unsafe(no_mangle)]
        pub extern "C" fn _hearth_plugin_api_version() -> u32 {
            $crate::API_VERSION
        }

        #[unsafe(no_mangle)]
        #[allow(improper_ctypes_definitions)]
        pub extern "C" fn _hearth_plugin_register(registrar: &mut $crate::PluginRegistrar) {
            registrar.set_build_version(env!("CARGO_PKG_VERSION"));
            $(registrar.register::<$plugin_type>();)+
        }
    };
}
