use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "hearth", about = "Plugin host for a community chat bot")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Load plugins and run until interrupted
    Run(commands::run::RunArgs),
    /// Manage plugins
    Plugin(commands::plugin::PluginArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::ConfigLoader::load()?;

    // RUST_LOG wins, then --verbose, then the configured filter
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new(config.log.filter.as_deref().unwrap_or("info"))
        }
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Run(args) => commands::run::run(args, &config).await,
        Commands::Plugin(args) => commands::plugin::run(args, &config).await,
    }
}
