use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use gitdb::{Engine, EngineConfig};
use tracing::Level;

mod cli;
mod commands;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading engine config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    // The one engine for this process; commands borrow it.
    let engine = Arc::new(Engine::with_config(config));
    engine
        .open(&cli.store)
        .with_context(|| format!("opening store {}", cli.store.display()))?;

    commands::run_command(&engine, cli.command)
}
