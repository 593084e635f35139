//! Plugin management commands

use crate::config::HearthConfig;
use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use hearth_core::plugins::discover_artifacts;
use hearth_core::{EnabledList, PluginHost, PluginHostConfig, PluginInfo};
use std::path::PathBuf;

/// Plugin management arguments
#[derive(Args)]
pub struct PluginArgs {
    /// Plugin directory to manage instead of the configured one
    #[arg(long, value_name = "DIR", global = true)]
    pub plugins: Option<PathBuf>,

    #[command(subcommand)]
    pub command: PluginCommands,
}

/// Plugin subcommands
#[derive(Subcommand)]
pub enum PluginCommands {
    /// List installed plugins
    List {
        /// Only show plugins on the enabled list
        #[arg(long)]
        enabled: bool,
    },
    /// Enable a plugin at the next start
    Enable {
        /// Plugin name to enable
        name: String,
    },
    /// Stop enabling a plugin at start
    Disable {
        /// Plugin name to disable
        name: String,
    },
    /// Load a plugin and show its details
    Info {
        /// Plugin name
        name: String,
    },
}

/// Run plugin command
pub async fn run(args: PluginArgs, config: &HearthConfig) -> Result<()> {
    let host_config = config.host_config(args.plugins.as_deref());

    match args.command {
        PluginCommands::List { enabled } => list_plugins(&host_config, enabled),
        PluginCommands::Enable { name } => {
            if enable_plugin(&host_config, &name)? {
                println!("Enabled plugin: {}", name);
            } else {
                println!("Plugin '{}' is already enabled", name);
            }
            Ok(())
        }
        PluginCommands::Disable { name } => {
            if disable_plugin(&host_config, &name)? {
                println!("Disabled plugin: {}", name);
            } else {
                println!("Plugin '{}' was not enabled", name);
            }
            Ok(())
        }
        PluginCommands::Info { name } => show_plugin_info(host_config, &name).await,
    }
}

fn list_plugins(config: &PluginHostConfig, only_enabled: bool) -> Result<()> {
    let enabled = EnabledList::load(&config.enabled_list)?;
    let artifacts = discover_artifacts(&config.plugin_dir, &config.extension)?;

    if artifacts.is_empty() {
        println!("No plugins installed");
        println!();
        println!("Plugin directory: {}", config.plugin_dir.display());
        println!();
        println!("To install a plugin:");
        println!(
            "  1. Copy the plugin library: cp libmy_plugin.so {}/my-plugin.{}",
            config.plugin_dir.display(),
            config.extension
        );
        println!("  2. Enable the plugin: hearth plugin enable my-plugin");
        return Ok(());
    }

    for artifact in artifacts {
        let is_enabled = enabled.is_enabled(&artifact.name);
        if only_enabled && !is_enabled {
            continue;
        }
        let status = if is_enabled { "✓" } else { "○" };
        println!("{} {}", status, artifact.name);
    }

    Ok(())
}

/// Add `name` to the enabled list. Returns false if it was already there.
fn enable_plugin(config: &PluginHostConfig, name: &str) -> Result<bool> {
    let path = config.plugin_dir.join(format!("{}.{}", name, config.extension));
    if !path.is_file() {
        bail!(
            "no plugin named '{}' in {} (run 'hearth plugin list')",
            name,
            config.plugin_dir.display()
        );
    }

    let mut enabled = EnabledList::load(&config.enabled_list)?;
    let changed = enabled.enable(name);
    if changed {
        enabled.save(&config.enabled_list)?;
    }
    Ok(changed)
}

/// Remove `name` from the enabled list. Returns false if it was not listed.
fn disable_plugin(config: &PluginHostConfig, name: &str) -> Result<bool> {
    let mut enabled = EnabledList::load(&config.enabled_list)?;
    let changed = enabled.disable(name);
    if changed {
        enabled.save(&config.enabled_list)?;
    }
    Ok(changed)
}

async fn show_plugin_info(config: PluginHostConfig, name: &str) -> Result<()> {
    let mut host = PluginHost::with_dylib(config);

    let loaded = host.load_plugin(name).await.map(|p| p.name().to_string());
    let resolved = match loaded {
        Ok(resolved) => resolved,
        Err(e) => {
            host.shutdown().await;
            return Err(e.into());
        }
    };

    if let Some(info) = host.plugin_info(&resolved) {
        print!("{}", format_info(&info));
    }

    host.shutdown().await;
    Ok(())
}

fn format_info(info: &PluginInfo) -> String {
    let d = &info.descriptor;
    let mut out = String::new();
    out.push_str(&format!("Name:         {}\n", d.name));
    out.push_str(&format!("Version:      {}\n", d.version));
    out.push_str(&format!(
        "Author:       {}\n",
        d.author.as_ref().map_or("Unknown", |a| a.name.as_str())
    ));
    out.push_str(&format!(
        "Description:  {}\n",
        d.description.as_deref().unwrap_or("No description")
    ));
    out.push_str(&format!("Status:       {}\n", info.state));
    out.push_str(&format!(
        "Connection:   {}\n",
        if info.has_connection { "yes" } else { "no" }
    ));

    if !d.dependencies.is_empty() {
        out.push_str(&format!("Depends on:   {}\n", d.dependencies.join(", ")));
    }
    if !info.dependants.is_empty() {
        out.push_str(&format!("Required by:  {}\n", info.dependants.join(", ")));
    }
    if !info.commands.is_empty() {
        out.push_str("\nCommands:\n");
        for command in &info.commands {
            out.push_str(&format!("  {}\n", command));
        }
    }
    out
}
