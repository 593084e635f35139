//! Dependency resolution - loading a plugin and everything it requires

use std::path::Path;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::LocalBoxFuture;
use hearth_plugin_api::{
    CONNECTION_TOKEN_KEY, ChatClient, Intents, PluginConfig, PluginContext, PluginDescriptor,
    PluginError,
};

use super::descriptor;
use super::error::{HookKind, PluginHostError};
use super::host::PluginHost;
use super::instance::PluginInstance;
use super::isolation::ContextGuard;

/// Requested names currently being loaded, outermost first.
///
/// Scoped to one top-level [`PluginHost::load_plugin`] call.
#[derive(Debug, Default)]
pub(crate) struct LoadStack(Vec<String>);

impl LoadStack {
    fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|n| n == name)
    }

    fn push(&mut self, name: &str) {
        self.0.push(name.to_string());
    }

    fn pop(&mut self) {
        self.0.pop();
    }

    /// The cycle closed by requesting `name` again
    fn cycle_to(&self, name: &str) -> Vec<String> {
        let start = self.0.iter().position(|n| n == name).unwrap_or(0);
        let mut chain = self.0[start..].to_vec();
        chain.push(name.to_string());
        chain
    }
}

impl PluginHost {
    /// Load a plugin by requested name, loading its dependencies first.
    ///
    /// Loading a name that is already registered is a no-op that returns the
    /// live instance. A newly loaded plugin starts out disabled.
    pub async fn load_plugin(&mut self, name: &str) -> Result<&PluginInstance, PluginHostError> {
        let mut stack = LoadStack::default();
        let resolved = self.resolve(name, &mut stack).await?;
        self.registry
            .get(&resolved)
            .ok_or_else(|| PluginHostError::not_loaded(&resolved))
    }

    fn resolve<'a>(
        &'a mut self,
        name: &'a str,
        stack: &'a mut LoadStack,
    ) -> LocalBoxFuture<'a, Result<String, PluginHostError>> {
        async move {
            if stack.contains(name) {
                return Err(PluginHostError::CircularDependency {
                    name: name.to_string(),
                    chain: stack.cycle_to(name),
                });
            }

            if self.registry.contains(name) {
                tracing::debug!(plugin = %name, "Plugin already loaded");
                return Ok(name.to_string());
            }
            if let Some(loaded) = self.registry.find_by_requested_name(name) {
                let resolved = loaded.name().to_string();
                tracing::debug!(requested = %name, plugin = %resolved, "Plugin already loaded");
                return Ok(resolved);
            }

            stack.push(name);
            let result = self.load_uncached(name, stack).await;
            stack.pop();
            result
        }
        .boxed_local()
    }

    async fn load_uncached(
        &mut self,
        requested: &str,
        stack: &mut LoadStack,
    ) -> Result<String, PluginHostError> {
        // 1. Read the artifact in one go; no handle outlives this call
        let path = self.artifact_path(requested);
        if !path.is_file() {
            return Err(PluginHostError::NotFound {
                name: requested.to_string(),
                path,
            });
        }
        let bytes = std::fs::read(&path)?;

        // 2. Load it into a fresh isolation context
        let mut context = self.loader.create_context(requested)?;
        let registrar = match context.load_artifact(&bytes) {
            Ok(registrar) => registrar,
            Err(e) => {
                context.unload();
                return Err(e);
            }
        };
        let isolation = ContextGuard::new(context);
        drop(bytes);

        // 3. Identify it
        let extracted = descriptor::extract(registrar)
            .map_err(|reason| PluginHostError::invalid(requested, reason))?;
        let resolved = extracted.descriptor.name.clone();
        if resolved != requested {
            tracing::debug!(requested = %requested, plugin = %resolved, "Plugin resolved under a different name");
        }

        // 4. Dependencies, in declaration order
        let declared = extracted.descriptor.dependencies.clone();
        let mut dependency_names = Vec::with_capacity(declared.len());
        let mut dependencies = Vec::with_capacity(declared.len());
        for dependency in &declared {
            let dependency_name = self.resolve(dependency, stack).await.inspect_err(|e| {
                tracing::error!(plugin = %resolved, dependency = %dependency, error = %e, "Failed to load dependency");
            })?;
            if let Some(loaded) = self.registry.get(&dependency_name) {
                dependencies.push(loaded.descriptor().clone());
            }
            dependency_names.push(dependency_name);
        }

        // 5. Name conflicts
        if self.registry.contains(&resolved) {
            return Err(PluginHostError::DuplicateName { name: resolved });
        }

        // 6. Private storage, configuration and connection
        let data_dir = self.config.data_dir.join(&resolved);
        std::fs::create_dir_all(&data_dir)?;
        let config_path = data_dir.join("config.toml");
        let config = prepare_config(&resolved, &extracted.descriptor, &config_path)?;
        let client = self.build_client(&resolved, &extracted.descriptor, &config)?;

        let mut plugin_context = PluginContext::with_config(resolved.clone(), data_dir, config)
            .with_directory(Arc::new(self.registry.view()));
        if let Some(client) = client {
            plugin_context = plugin_context.with_client(client);
        }

        // 7. Instantiate and run the load hook
        let mut instance = PluginInstance::new(
            extracted,
            requested,
            dependencies,
            plugin_context,
            config_path,
            isolation,
        )?;
        if let Err(e) = instance.call(HookKind::Load).await {
            tracing::error!(plugin = %resolved, error = %e, "Plugin load hook failed");
            drop(instance);
            return Err(e);
        }
        instance.adopt_services();
        let commands = instance.context_mut().take_pending_commands();

        // 8. Register
        self.registry.add(instance)?;
        for dependency in &dependency_names {
            self.registry.add_dependant(dependency, &resolved);
        }
        self.registry.register_commands(&resolved, commands);

        if let Some(loaded) = self.registry.get(&resolved) {
            tracing::info!(
                plugin = %resolved,
                version = %loaded.version(),
                dependencies = loaded.dependencies().len(),
                "Plugin loaded"
            );
        }
        Ok(resolved)
    }

    /// Build the plugin's connection if a credential is configured
    fn build_client(
        &self,
        name: &str,
        descriptor: &PluginDescriptor,
        config: &PluginConfig,
    ) -> Result<Option<Arc<dyn ChatClient>>, PluginHostError> {
        let Some(token) = config
            .get::<String>(CONNECTION_TOKEN_KEY)
            .filter(|t| !t.trim().is_empty())
        else {
            tracing::debug!(plugin = %name, "No connection token, running without a connection");
            return Ok(None);
        };

        let intents = descriptor.intents.clone().unwrap_or_else(Intents::minimal);
        self.clients
            .create(name, &token, &intents)
            .map(Some)
            .map_err(|source| PluginHostError::Connection {
                name: name.to_string(),
                source,
            })
    }
}

/// Load the plugin's config store and merge in its bundled defaults.
///
/// The file is written back when it did not exist yet or the merge added
/// keys.
fn prepare_config(
    name: &str,
    descriptor: &PluginDescriptor,
    path: &Path,
) -> Result<PluginConfig, PluginHostError> {
    let config_error = |source: PluginError| PluginHostError::Config {
        name: name.to_string(),
        source,
    };

    let existed = path.exists();
    let mut config = PluginConfig::load(path).map_err(config_error)?;

    let mut changed = !existed;
    if let Some(defaults) = &descriptor.default_config {
        let defaults: toml::Table = toml::from_str(defaults)
            .map_err(|e| config_error(PluginError::Config(e.to_string())))?;
        changed |= config.merge_defaults(&defaults);
    }

    if changed {
        config.save(path).map_err(config_error)?;
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_stack_cycle_chain() {
        let mut stack = LoadStack::default();
        stack.push("a");
        stack.push("b");
        stack.push("c");

        assert!(stack.contains("b"));
        assert_eq!(stack.cycle_to("b"), vec!["b", "c", "b"]);

        stack.pop();
        assert!(!stack.contains("c"));
    }

    #[test]
    fn test_prepare_config_creates_file_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let descriptor = PluginDescriptor::new("greeter", "1.0.0")
            .with_default_config("greeting = \"hello\"\n[limits]\nper_minute = 5\n");

        let config = prepare_config("greeter", &descriptor, &path).unwrap();

        assert!(path.exists());
        assert_eq!(config.get::<String>("greeting"), Some("hello".to_string()));
        assert_eq!(config.get::<i64>("limits.per_minute"), Some(5));
        assert!(!config.is_dirty());
    }

    #[test]
    fn test_prepare_config_keeps_user_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "greeting = \"howdy\"\n").unwrap();
        let descriptor = PluginDescriptor::new("greeter", "1.0.0")
            .with_default_config("greeting = \"hello\"\nfarewell = \"bye\"\n");

        prepare_config("greeter", &descriptor, &path).unwrap();

        let on_disk = PluginConfig::load(&path).unwrap();
        assert_eq!(on_disk.get::<String>("greeting"), Some("howdy".to_string()));
        assert_eq!(on_disk.get::<String>("farewell"), Some("bye".to_string()));
    }

    #[test]
    fn test_prepare_config_rejects_bad_defaults() {
        let dir = TempDir::new().unwrap();
        let descriptor =
            PluginDescriptor::new("broken", "1.0.0").with_default_config("this is = = not toml");

        let result = prepare_config("broken", &descriptor, &dir.path().join("config.toml"));
        assert!(matches!(result, Err(PluginHostError::Config { .. })));
    }
}
