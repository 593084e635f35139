//! Shared fixtures for plugin host integration tests
//!
//! Fixture plugins are statically linked and served by a `StaticLoader`.
//! Their hooks append to a per-thread event log; `#[tokio::test]` runs on a
//! current-thread runtime, so every hook of a test lands in that test's log.

#![allow(dead_code)]

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use hearth_core::plugins::{PluginHost, PluginHostConfig, StaticLoader};
use hearth_core::ChatClientFactory;
use hearth_plugin_api::{
    BackgroundService, ChatClient, Intents, PluginError, async_trait,
};
use tempfile::TempDir;

// ─── Event log ──────────────────────────────────────────────────────

thread_local! {
    static EVENTS: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

pub fn record(plugin: &str, what: &str) {
    EVENTS.with(|e| e.borrow_mut().push(format!("{plugin}:{what}")));
}

/// Every event recorded so far, as `plugin:event`
pub fn events() -> Vec<String> {
    EVENTS.with(|e| e.borrow().clone())
}

/// How often `plugin` recorded `what`
pub fn count(plugin: &str, what: &str) -> usize {
    let needle = format!("{plugin}:{what}");
    EVENTS.with(|e| e.borrow().iter().filter(|ev| **ev == needle).count())
}

/// Position of the first `plugin:what` in the log
pub fn position(plugin: &str, what: &str) -> Option<usize> {
    let needle = format!("{plugin}:{what}");
    EVENTS.with(|e| e.borrow().iter().position(|ev| *ev == needle))
}

pub fn clear_events() {
    EVENTS.with(|e| e.borrow_mut().clear());
}

// ─── Fixture plugins ────────────────────────────────────────────────

/// How a fixture plugin behaves in its hooks
#[derive(Clone, Copy)]
pub struct Behaviour {
    pub fail_load: bool,
    pub fail_enable: bool,
    pub panic_enable: bool,
    pub fail_disable: bool,
    pub fail_unload: bool,
    pub fail_service: bool,
    pub with_service: bool,
    pub commands: &'static [&'static str],
    pub set_config: Option<(&'static str, &'static str)>,
}

impl Behaviour {
    pub const NONE: Behaviour = Behaviour {
        fail_load: false,
        fail_enable: false,
        panic_enable: false,
        fail_disable: false,
        fail_unload: false,
        fail_service: false,
        with_service: false,
        commands: &[],
        set_config: None,
    };
}

/// Define a fixture plugin type and its registration function.
///
/// `fixture!(Alpha, register_alpha, PluginDescriptor::new("a", "1.0.0"));`
macro_rules! fixture {
    ($ty:ident, $register:ident, $descriptor:expr) => {
        fixture!($ty, $register, $descriptor, $crate::common::Behaviour::NONE);
    };
    ($ty:ident, $register:ident, $descriptor:expr, $behaviour:expr) => {
        #[derive(Default)]
        pub struct $ty;

        impl $ty {
            const BEHAVIOUR: $crate::common::Behaviour = $behaviour;
        }

        #[hearth_plugin_api::async_trait]
        impl hearth_plugin_api::Plugin for $ty {
            fn descriptor() -> Option<hearth_plugin_api::PluginDescriptor> {
                $descriptor
            }

            async fn on_load(
                &mut self,
                ctx: &mut hearth_plugin_api::PluginContext,
            ) -> Result<(), hearth_plugin_api::PluginError> {
                $crate::common::record(ctx.plugin_name(), "load");
                let behaviour = Self::BEHAVIOUR;
                for command in behaviour.commands {
                    ctx.register_command(hearth_plugin_api::CommandSpec::new(*command, "fixture"))?;
                }
                if behaviour.with_service {
                    ctx.register_service(Box::new($crate::common::RecordingService::new(
                        ctx.plugin_name(),
                        behaviour.fail_service,
                    )));
                }
                if let Some((key, value)) = behaviour.set_config {
                    ctx.config_set(key, value)?;
                }
                if behaviour.fail_load {
                    return Err(hearth_plugin_api::PluginError::custom("load refused"));
                }
                Ok(())
            }

            async fn on_enable(
                &mut self,
                ctx: &mut hearth_plugin_api::PluginContext,
            ) -> Result<(), hearth_plugin_api::PluginError> {
                $crate::common::record(ctx.plugin_name(), "enable");
                if Self::BEHAVIOUR.panic_enable {
                    panic!("fixture panicked on enable");
                }
                if Self::BEHAVIOUR.fail_enable {
                    return Err(hearth_plugin_api::PluginError::custom("enable refused"));
                }
                Ok(())
            }

            async fn on_disable(
                &mut self,
                ctx: &mut hearth_plugin_api::PluginContext,
            ) -> Result<(), hearth_plugin_api::PluginError> {
                $crate::common::record(ctx.plugin_name(), "disable");
                if Self::BEHAVIOUR.fail_disable {
                    return Err(hearth_plugin_api::PluginError::custom("disable refused"));
                }
                Ok(())
            }

            async fn on_unload(
                &mut self,
                ctx: &mut hearth_plugin_api::PluginContext,
            ) -> Result<(), hearth_plugin_api::PluginError> {
                $crate::common::record(ctx.plugin_name(), "unload");
                if Self::BEHAVIOUR.fail_unload {
                    return Err(hearth_plugin_api::PluginError::custom("unload refused"));
                }
                Ok(())
            }
        }

        impl Drop for $ty {
            fn drop(&mut self) {
                $crate::common::record(stringify!($ty), "drop");
            }
        }

        pub fn $register(registrar: &mut hearth_plugin_api::PluginRegistrar) {
            registrar.register::<$ty>();
        }
    };
}

/// Background service that records its start and stop
pub struct RecordingService {
    owner: String,
    fail_start: bool,
}

impl RecordingService {
    pub fn new(owner: &str, fail_start: bool) -> Self {
        Self {
            owner: owner.to_string(),
            fail_start,
        }
    }
}

#[async_trait]
impl BackgroundService for RecordingService {
    fn name(&self) -> &str {
        "recorder"
    }

    async fn start(&mut self) -> Result<(), PluginError> {
        record(&self.owner, "service_start");
        if self.fail_start {
            return Err(PluginError::custom("service refused to start"));
        }
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), PluginError> {
        record(&self.owner, "service_stop");
        Ok(())
    }
}

// ─── Platform connections ───────────────────────────────────────────

/// Client that records connect/disconnect
pub struct RecordingClient {
    plugin: String,
    connected: AtomicBool,
    fail_connect: bool,
}

#[async_trait]
impl ChatClient for RecordingClient {
    async fn connect(&self) -> Result<(), PluginError> {
        record(&self.plugin, "connect");
        if self.fail_connect {
            return Err(PluginError::connection("gateway unreachable"));
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), PluginError> {
        record(&self.plugin, "disconnect");
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

/// Factory that remembers which connections it built
#[derive(Default)]
pub struct RecordingClientFactory {
    pub fail_connect: AtomicBool,
    created: Mutex<Vec<(String, String, Intents)>>,
}

impl RecordingClientFactory {
    /// `(plugin, token, intents)` for every client built
    pub fn created(&self) -> Vec<(String, String, Intents)> {
        self.created
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl ChatClientFactory for RecordingClientFactory {
    fn create(
        &self,
        plugin: &str,
        token: &str,
        intents: &Intents,
    ) -> Result<Arc<dyn ChatClient>, PluginError> {
        self.created
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push((plugin.to_string(), token.to_string(), intents.clone()));
        Ok(Arc::new(RecordingClient {
            plugin: plugin.to_string(),
            connected: AtomicBool::new(false),
            fail_connect: self.fail_connect.load(Ordering::SeqCst),
        }))
    }
}

// ─── Harness ────────────────────────────────────────────────────────

/// A host rooted in a temporary directory
pub struct Harness {
    pub dir: TempDir,
    pub loader: StaticLoader,
    pub clients: Arc<RecordingClientFactory>,
    pub host: PluginHost,
}

impl Harness {
    pub fn new(loader: StaticLoader) -> Self {
        Self::with_clients(loader, RecordingClientFactory::default())
    }

    pub fn with_clients(loader: StaticLoader, clients: RecordingClientFactory) -> Self {
        clear_events();
        let dir = TempDir::new().unwrap();
        let config = PluginHostConfig::rooted(dir.path().join("plugins"), dir.path().join("data"));
        std::fs::create_dir_all(&config.plugin_dir).unwrap();

        let clients = Arc::new(clients);
        let host = PluginHost::new(config, Arc::new(loader.clone()), clients.clone());
        Self {
            dir,
            loader,
            clients,
            host,
        }
    }

    pub fn plugin_dir(&self) -> PathBuf {
        self.host.config().plugin_dir.clone()
    }

    /// Data directory the host gives a plugin
    pub fn data_dir(&self, plugin: &str) -> PathBuf {
        self.host.config().data_dir.join(plugin)
    }

    /// Place `{stem}.plugin` in the plugin directory, pointing at `key`
    pub fn write_artifact(&self, stem: &str, key: &str) {
        write_artifact(&self.plugin_dir(), stem, key);
    }

    /// Pre-seed a plugin's config.toml before it loads
    pub fn write_config(&self, plugin: &str, toml: &str) {
        let dir = self.data_dir(plugin);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("config.toml"), toml).unwrap();
    }
}

pub fn write_artifact(dir: &Path, stem: &str, key: &str) {
    std::fs::write(dir.join(format!("{stem}.plugin")), key).unwrap();
}
