//! PluginInstance - a loaded plugin and everything the host keeps for it

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures_util::FutureExt;
use hearth_plugin_api::{
    BackgroundService, ChatClient, Plugin, PluginConfig, PluginContext, PluginDescriptor,
    PluginError, PluginState,
};
use tracing::Instrument;

use super::descriptor::Extracted;
use super::error::{HookKind, PluginHostError};
use super::isolation::ContextGuard;

/// A loaded plugin with its runtime state.
///
/// Dropping an instance tears it down in a fixed order: background
/// services, then the plugin object and its connection, and only then the
/// isolation context holding their code.
pub struct PluginInstance {
    descriptor: PluginDescriptor,
    type_name: &'static str,
    /// Name the instance was requested under (artifact file stem)
    requested_name: String,
    state: PluginState,
    /// Resolved dependency descriptors, in declaration order
    dependencies: Vec<PluginDescriptor>,
    config_path: PathBuf,
    enabled_at: Option<DateTime<Utc>>,
    services: Vec<Box<dyn BackgroundService>>,
    services_running: bool,
    plugin: Option<Box<dyn Plugin>>,
    context: PluginContext,
    span: tracing::Span,
    // Must stay the last field
    isolation: ContextGuard,
}

impl PluginInstance {
    /// Construct the plugin object from an extracted artifact
    pub(crate) fn new(
        extracted: Extracted,
        requested_name: &str,
        dependencies: Vec<PluginDescriptor>,
        context: PluginContext,
        config_path: PathBuf,
        isolation: ContextGuard,
    ) -> Result<Self, PluginHostError> {
        let Extracted {
            descriptor,
            type_name,
            factory,
        } = extracted;

        let plugin = std::panic::catch_unwind(factory).map_err(|_| PluginHostError::Hook {
            name: descriptor.name.clone(),
            hook: HookKind::Load,
            source: PluginError::custom("plugin panicked while being constructed"),
        })?;

        let span = tracing::info_span!("plugin", name = %descriptor.name);

        Ok(Self {
            descriptor,
            type_name,
            requested_name: requested_name.to_string(),
            state: PluginState::Loaded,
            dependencies,
            config_path,
            enabled_at: None,
            services: Vec::new(),
            services_running: false,
            plugin: Some(plugin),
            context,
            span,
            isolation,
        })
    }

    // ─── Accessors ──────────────────────────────────────────────────

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn version(&self) -> &str {
        &self.descriptor.version
    }

    pub fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    /// Rust type name of the plugin object
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn requested_name(&self) -> &str {
        &self.requested_name
    }

    pub fn state(&self) -> PluginState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.state.is_enabled()
    }

    /// Descriptors of the plugins this one depends on, in declaration order
    pub fn dependencies(&self) -> &[PluginDescriptor] {
        &self.dependencies
    }

    pub fn data_dir(&self) -> &Path {
        self.context.data_dir()
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn config(&self) -> &PluginConfig {
        self.context.config()
    }

    /// When the plugin was last enabled, if it is enabled
    pub fn enabled_at(&self) -> Option<DateTime<Utc>> {
        self.enabled_at
    }

    pub fn client(&self) -> Option<&Arc<dyn ChatClient>> {
        self.context.client()
    }

    // ─── Host-side mutation ─────────────────────────────────────────

    pub(crate) fn set_state(&mut self, state: PluginState) {
        self.state = state;
    }

    pub(crate) fn set_enabled_at(&mut self, at: Option<DateTime<Utc>>) {
        self.enabled_at = at;
    }

    pub(crate) fn context_mut(&mut self) -> &mut PluginContext {
        &mut self.context
    }

    /// Move services the plugin registered during load into the instance
    pub(crate) fn adopt_services(&mut self) {
        self.services = self.context.take_pending_services();
    }

    /// Run one lifecycle hook to completion inside the plugin's span.
    ///
    /// Errors and panics both come back as [`PluginHostError::Hook`].
    pub(crate) async fn call(&mut self, hook: HookKind) -> Result<(), PluginHostError> {
        let Some(plugin) = self.plugin.as_mut() else {
            return Ok(());
        };
        let ctx = &mut self.context;

        let result = guarded(
            async move {
                match hook {
                    HookKind::Load => plugin.on_load(ctx).await,
                    HookKind::Enable => plugin.on_enable(ctx).await,
                    HookKind::Disable => plugin.on_disable(ctx).await,
                    HookKind::Unload => plugin.on_unload(ctx).await,
                }
            },
            || format!("plugin panicked in {hook} hook"),
        )
        .instrument(self.span.clone())
        .await;

        result.map_err(|source| PluginHostError::Hook {
            name: self.descriptor.name.clone(),
            hook,
            source: detach(source),
        })
    }

    /// Start every background service in registration order.
    ///
    /// On the first failure the services already started are stopped again
    /// and the failure is returned.
    pub(crate) async fn start_services(&mut self) -> Result<(), PluginError> {
        if self.services_running {
            return Ok(());
        }

        for index in 0..self.services.len() {
            let service = &mut self.services[index];
            let service_name = service.name().to_string();
            let result = guarded(service.start(), || "service panicked while starting".into())
                .instrument(self.span.clone())
                .await;

            if let Err(e) = result {
                roll_back_services(&self.descriptor.name, &mut self.services[..index]).await;
                return Err(PluginError::Service {
                    name: service_name,
                    message: e.to_string(),
                });
            }
            tracing::debug!(plugin = %self.descriptor.name, service = %service_name, "Service started");
        }

        self.services_running = true;
        Ok(())
    }

    /// Stop every background service, newest first. Failures are logged
    /// and do not keep the remaining services running.
    pub(crate) async fn stop_services(&mut self) {
        if !self.services_running {
            return;
        }

        for service in self.services.iter_mut().rev() {
            let service_name = service.name().to_string();
            let result = guarded(service.stop(), || "service panicked while stopping".into())
                .instrument(self.span.clone())
                .await;
            if let Err(e) = result {
                tracing::warn!(
                    plugin = %self.descriptor.name,
                    service = %service_name,
                    error = %e,
                    "Failed to stop service"
                );
            }
        }

        self.services_running = false;
    }

    /// Open the platform connection, if the plugin has one
    pub(crate) async fn connect(&self) -> Result<(), PluginError> {
        match self.context.client() {
            Some(client) => {
                guarded(client.connect(), || "client panicked while connecting".into()).await
            }
            None => Ok(()),
        }
    }

    /// Close the platform connection, if open. Failures are logged.
    pub(crate) async fn disconnect(&self) {
        let Some(client) = self.context.client().filter(|c| c.is_connected()) else {
            return;
        };
        let result =
            guarded(client.disconnect(), || "client panicked while disconnecting".into()).await;
        if let Err(e) = result {
            tracing::warn!(plugin = %self.descriptor.name, error = %e, "Failed to disconnect client");
        }
    }

    /// Write the config store back to disk if it changed
    pub(crate) fn persist_config(&mut self) -> Result<(), PluginHostError> {
        let config = self.context.config_mut();
        if !config.is_dirty() {
            return Ok(());
        }
        config
            .save(&self.config_path)
            .map_err(|source| PluginHostError::Config {
                name: self.descriptor.name.clone(),
                source,
            })
    }
}

impl Drop for PluginInstance {
    fn drop(&mut self) {
        self.services.clear();
        drop(self.context.take_pending_services());
        drop(self.plugin.take());
        drop(self.context.take_client());
        tracing::debug!(plugin = %self.descriptor.name, "Plugin instance dropped");
        // `isolation` is dropped after this, unloading the code
    }
}

impl std::fmt::Debug for PluginInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginInstance")
            .field("name", &self.descriptor.name)
            .field("version", &self.descriptor.version)
            .field("state", &self.state)
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// Await plugin-authored code, turning a panic into an error
async fn guarded<F>(fut: F, on_panic: impl FnOnce() -> String) -> Result<(), PluginError>
where
    F: Future<Output = Result<(), PluginError>>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(result) => result,
        Err(_) => Err(PluginError::Custom(on_panic())),
    }
}

/// Stop already started services, newest first, logging failures
async fn roll_back_services(plugin: &str, started: &mut [Box<dyn BackgroundService>]) {
    for service in started.iter_mut().rev() {
        let service_name = service.name().to_string();
        let result = guarded(service.stop(), || "service panicked while stopping".into()).await;
        if let Err(e) = result {
            tracing::warn!(
                plugin = %plugin,
                service = %service_name,
                error = %e,
                "Failed to stop service during rollback"
            );
        }
    }
}

/// Rebuild a plugin-made error from host-owned data.
///
/// A boxed source inside `PluginError::Io` carries a vtable from the
/// plugin's code, which is gone once its isolation context unloads.
fn detach(error: PluginError) -> PluginError {
    match error {
        PluginError::Io(e) => PluginError::Io(std::io::Error::new(e.kind(), e.to_string())),
        PluginError::Config(m) => PluginError::Config(m),
        PluginError::Serialization(m) => PluginError::Serialization(m),
        PluginError::Connection(m) => PluginError::Connection(m),
        PluginError::Service { name, message } => PluginError::Service { name, message },
        PluginError::DuplicateCommand(m) => PluginError::DuplicateCommand(m),
        PluginError::Custom(m) => PluginError::Custom(m),
    }
}
