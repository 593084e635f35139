//! Lifecycle transitions: enable, disable, unload, reload and shutdown
//!
//! Enable fails closed: if anything goes wrong the plugin stays where it
//! was and whatever had been started is stopped again. Disable and unload
//! fail open: hook errors are logged and the transition completes anyway.

use std::collections::HashSet;

use chrono::Utc;
use hearth_plugin_api::PluginState;

use super::error::{HookKind, PluginHostError};
use super::host::PluginHost;

impl PluginHost {
    /// Enable a loaded plugin.
    ///
    /// Returns `Ok(false)` if it was already enabled.
    pub async fn enable(&mut self, name: &str) -> Result<bool, PluginHostError> {
        let Some(instance) = self.registry.get_mut(name) else {
            return Err(PluginHostError::not_loaded(name));
        };
        if instance.is_enabled() {
            tracing::debug!(plugin = %name, "Plugin already enabled");
            return Ok(false);
        }

        instance.set_enabled_at(Some(Utc::now()));

        if let Err(source) = instance.start_services().await {
            instance.set_enabled_at(None);
            let err = PluginHostError::Hook {
                name: name.to_string(),
                hook: HookKind::Enable,
                source,
            };
            tracing::error!(plugin = %name, error = %err, "Failed to start plugin services");
            return Err(err);
        }

        if let Err(err) = instance.call(HookKind::Enable).await {
            instance.stop_services().await;
            instance.set_enabled_at(None);
            tracing::error!(plugin = %name, error = %err, "Plugin enable hook failed");
            return Err(err);
        }

        if let Err(source) = instance.connect().await {
            instance.stop_services().await;
            if let Err(e) = instance.call(HookKind::Disable).await {
                tracing::warn!(plugin = %name, error = %e, "Plugin disable hook failed during rollback");
            }
            instance.disconnect().await;
            instance.set_enabled_at(None);
            let err = PluginHostError::Connection {
                name: name.to_string(),
                source,
            };
            tracing::error!(plugin = %name, error = %err, "Failed to open plugin connection");
            return Err(err);
        }

        self.registry.set_enabled(name, true);
        tracing::info!(plugin = %name, "Plugin enabled");
        Ok(true)
    }

    /// Disable an enabled plugin.
    ///
    /// Returns `Ok(false)` if it was not enabled. Always ends disabled.
    pub async fn disable(&mut self, name: &str) -> Result<bool, PluginHostError> {
        let Some(instance) = self.registry.get_mut(name) else {
            return Err(PluginHostError::not_loaded(name));
        };
        if !instance.is_enabled() {
            tracing::debug!(plugin = %name, "Plugin not enabled");
            return Ok(false);
        }

        instance.stop_services().await;
        if let Err(e) = instance.call(HookKind::Disable).await {
            tracing::warn!(plugin = %name, error = %e, "Plugin disable hook failed");
        }
        instance.set_enabled_at(None);
        instance.disconnect().await;
        if let Err(e) = instance.persist_config() {
            tracing::warn!(plugin = %name, error = %e, "Failed to save plugin config");
        }

        self.registry.set_enabled(name, false);
        tracing::info!(plugin = %name, "Plugin disabled");
        Ok(true)
    }

    /// Unload a disabled plugin and, before it, every plugin that depends on
    /// it directly or transitively. Enabled dependants are disabled first.
    ///
    /// Returns the unloaded names, deepest dependant first.
    pub async fn unload(&mut self, name: &str) -> Result<Vec<String>, PluginHostError> {
        let Some(instance) = self.registry.get(name) else {
            return Err(PluginHostError::not_loaded(name));
        };
        if instance.is_enabled() {
            return Err(PluginHostError::InvalidState {
                name: name.to_string(),
                state: instance.state(),
                operation: "unload",
            });
        }

        let order = self.cascade_order(name);
        for target in &order {
            if target != name && self.registry.is_enabled(target) {
                tracing::info!(plugin = %target, dependency = %name, "Disabling dependant before unload");
                self.disable(target).await?;
            }
            self.teardown(target).await;
        }
        Ok(order)
    }

    /// Unload, then load again from disk, restoring enabled state.
    ///
    /// Dependants swept up by the unload are reloaded too. Returns the names
    /// that were loaded again.
    pub async fn reload(&mut self, name: &str) -> Result<Vec<String>, PluginHostError> {
        if !self.registry.contains(name) {
            return Err(PluginHostError::not_loaded(name));
        }

        let plan: Vec<(String, String, bool)> = self
            .cascade_order(name)
            .into_iter()
            .filter_map(|n| {
                let instance = self.registry.get(&n)?;
                Some((n, instance.requested_name().to_string(), instance.is_enabled()))
            })
            .collect();

        self.disable(name).await?;
        self.unload(name).await?;

        let mut reloaded = Vec::with_capacity(plan.len());
        let mut target_error = None;
        for (resolved, requested, was_enabled) in plan.iter().rev() {
            let loaded = self
                .load_plugin(requested)
                .await
                .map(|p| p.name().to_string());
            let new_name = match loaded {
                Ok(new_name) => new_name,
                Err(e) if resolved == name => return Err(e),
                Err(e) => {
                    tracing::warn!(plugin = %resolved, error = %e, "Failed to reload dependant");
                    continue;
                }
            };

            if *was_enabled {
                if let Err(e) = self.enable(&new_name).await {
                    if resolved == name {
                        target_error = Some(e);
                    }
                }
            }
            reloaded.push(new_name);
        }

        tracing::info!(plugin = %name, count = reloaded.len(), "Plugin reloaded");
        match target_error {
            Some(e) => Err(e),
            None => Ok(reloaded),
        }
    }

    /// Disable and unload every plugin, newest first
    pub async fn shutdown(&mut self) {
        let names: Vec<String> = self.registry.names().iter().rev().cloned().collect();
        for name in names {
            if !self.registry.contains(&name) {
                continue;
            }
            if let Err(e) = self.disable(&name).await {
                tracing::warn!(plugin = %name, error = %e, "Failed to disable plugin during shutdown");
            }
            if let Err(e) = self.unload(&name).await {
                tracing::warn!(plugin = %name, error = %e, "Failed to unload plugin during shutdown");
            }
        }
        tracing::info!("Plugin host shut down");
    }

    /// `name` and all its transitive dependants, dependants first
    fn cascade_order(&self, name: &str) -> Vec<String> {
        fn visit(host: &PluginHost, name: &str, seen: &mut HashSet<String>, out: &mut Vec<String>) {
            if !seen.insert(name.to_string()) {
                return;
            }
            for dependant in host.registry.dependants_of(name) {
                visit(host, dependant, seen, out);
            }
            out.push(name.to_string());
        }

        let mut order = Vec::new();
        visit(self, name, &mut HashSet::new(), &mut order);
        order
    }

    /// Run the unload hook and drop one instance. The caller has already
    /// dealt with its dependants.
    async fn teardown(&mut self, name: &str) {
        let Some(instance) = self.registry.get_mut(name) else {
            return;
        };

        if let Err(e) = instance.call(HookKind::Unload).await {
            tracing::warn!(plugin = %name, error = %e, "Plugin unload hook failed");
        }
        if let Err(e) = instance.persist_config() {
            tracing::warn!(plugin = %name, error = %e, "Failed to save plugin config");
        }
        instance.disconnect().await;
        instance.set_state(PluginState::Unloaded);

        // Dropping the instance unloads its isolation context
        drop(self.registry.remove(name));
        tracing::info!(plugin = %name, "Plugin unloaded");
    }
}
