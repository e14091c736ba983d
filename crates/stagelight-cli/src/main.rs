//! Stagelight command-line entry point.

mod cli;
mod commands;

use anyhow::Context as _;
use clap::Parser;
use cli::Cli;
use stagelight_core::Editor;
use stagelight_core::storage::FileStorage;
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let storage = match &cli.store_dir {
        Some(dir) => FileStorage::new(dir.clone())
            .with_context(|| format!("open project store '{}'", dir.display()))?,
        None => FileStorage::default_location().context("open default project store")?,
    };
    log::info!("Using project store at {}", storage.base_path().display());

    let mut editor = Editor::open(Arc::new(storage));
    let stdout = std::io::stdout();
    commands::run(&mut editor, cli.cmd, &mut stdout.lock())
}
