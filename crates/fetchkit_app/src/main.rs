//! Command-line fetch runner.
//!
//! Loads a RON config, activates a runner for the configured URL and reads
//! commands from stdin, printing the visible result after every change.
mod app;
mod command;
mod config;
mod effects;
mod render;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use config::{AppConfig, PolicyConfig, DEFAULT_CONFIG_FILENAME};
use fetchkit_core::SupersedePolicy;

#[derive(Debug, Parser)]
#[command(name = "fetchkit")]
#[command(about = "Fetch a JSON endpoint on demand or when watched values change", long_about = None)]
struct Args {
    /// Path to the RON config file
    #[arg(long, short, default_value = DEFAULT_CONFIG_FILENAME)]
    config: PathBuf,

    /// Endpoint to fetch (overrides the config file)
    #[arg(long)]
    url: Option<String>,

    /// When to fetch automatically (overrides the config file)
    #[arg(long, value_enum)]
    policy: Option<PolicyConfig>,

    /// Abort the in-flight request when a newer one starts
    #[arg(long)]
    cancel_previous: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = AppConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    if let Some(url) = args.url {
        config.url = url;
    }
    if let Some(policy) = args.policy {
        config.policy = policy;
    }
    if args.cancel_previous {
        config.supersede = SupersedePolicy::CancelPrevious;
    }
    config.validate()?;

    fetchkit_logging::initialize(&config.log.destination, config.log_level()?);

    app::run_app(config)
}
