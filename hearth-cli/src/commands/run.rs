//! Run the plugin host until interrupted

use crate::config::HearthConfig;
use anyhow::Result;
use clap::Args;
use hearth_core::{BootstrapReport, EnabledList, PluginHost};
use std::path::PathBuf;

/// Arguments for `hearth run`
#[derive(Args)]
pub struct RunArgs {
    /// Load plugins from this directory instead of the configured one
    #[arg(long, value_name = "DIR")]
    pub plugins: Option<PathBuf>,
}

/// Bootstrap the host, wait for Ctrl-C, then shut down
pub async fn run(args: RunArgs, config: &HearthConfig) -> Result<()> {
    let host_config = config.host_config(args.plugins.as_deref());
    let enabled = if config.plugins.auto_enable {
        EnabledList::load(&host_config.enabled_list)?
    } else {
        EnabledList::default()
    };

    tracing::info!(dir = %host_config.plugin_dir.display(), "Starting plugin host");
    let mut host = PluginHost::with_dylib(host_config);
    let report = host.bootstrap(&enabled).await?;
    print_report(&report);

    tracing::info!("Running, press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    tracing::info!("Shutting down");
    host.shutdown().await;
    Ok(())
}

fn print_report(report: &BootstrapReport) {
    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(name) if *name == outcome.requested => println!("✓ {}", name),
            Ok(name) => println!("✓ {} ({})", name, outcome.requested),
            Err(e) => println!("✗ {}: {}", outcome.requested, e),
        }
    }
    for (name, e) in &report.enable_errors {
        println!("✗ {} failed to enable: {}", name, e);
    }
    if report.outcomes.is_empty() {
        println!("No plugins found");
    }
}
