//! Hello Plugin - A simple example plugin for hearth
//!
//! This plugin demonstrates:
//! - Declaring identity with `Plugin::descriptor` and exporting it with `export_plugin!`
//! - Shipping default configuration that the host merges into `config.toml`
//! - Registering a command during `on_load`
//! - Counting enables across reloads through the config store
//!
//! ## Building
//!
//! ```bash
//! cargo build --release
//! ```
//!
//! ## Installing
//!
//! ```bash
//! cp target/release/libhello_plugin.so ~/.config/hearth/plugins/hello.plugin
//! hearth plugin enable hello
//! ```

use hearth_plugin_api::{
    Author, CommandSpec, Plugin, PluginContext, PluginDescriptor, PluginError, async_trait,
    export_plugin,
};

const DEFAULT_CONFIG: &str = r#"
greeting = "Hello from hearth!"

[connection]
token = ""
"#;

/// Greets the channel and keeps a running count of how often it was enabled.
#[derive(Default)]
pub struct HelloPlugin {
    greeting: String,
}

#[async_trait]
impl Plugin for HelloPlugin {
    fn descriptor() -> Option<PluginDescriptor> {
        Some(
            PluginDescriptor::new("hello", env!("CARGO_PKG_VERSION"))
                .with_description("A simple example plugin that says hello")
                .with_author(Author {
                    name: "hearth-team".to_string(),
                    ..Default::default()
                })
                .with_default_config(DEFAULT_CONFIG),
        )
    }

    async fn on_load(&mut self, ctx: &mut PluginContext) -> Result<(), PluginError> {
        self.greeting = ctx.config_get_or("greeting", "Hello!".to_string());
        ctx.register_command(CommandSpec::new("hello", "Reply with a greeting"))?;
        ctx.log_info("Hello plugin loaded!");
        Ok(())
    }

    async fn on_enable(&mut self, ctx: &mut PluginContext) -> Result<(), PluginError> {
        let times = ctx.config_get_or::<i64>("stats.enabled_count", 0) + 1;
        ctx.config_set("stats.enabled_count", times)?;

        let others = ctx.plugins().plugins().len().saturating_sub(1);
        ctx.log_info(&format!(
            "{} (enabled {} times, {} other plugins around)",
            self.greeting, times, others
        ));
        if ctx.client().is_none() {
            ctx.log_debug("No connection token configured, running offline");
        }
        Ok(())
    }

    async fn on_disable(&mut self, ctx: &mut PluginContext) -> Result<(), PluginError> {
        ctx.log_info("Goodbye!");
        Ok(())
    }
}

// This macro generates the C ABI entry points for dynamic loading
export_plugin!(HelloPlugin);
