mod cli;
mod commands;

use anyhow::Context;
use clap::Parser;
use fujinet_core::HalConfig;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = HalConfig::load(cli.config.as_deref()).context("loading configuration")?;
    commands::run(cli.command, config)
}

/// Logs go to stderr so `get` output on stdout stays clean.
fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
