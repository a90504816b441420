//! lorekeep - export a tabletop world into a zip of linked Markdown notes

pub mod cli;
pub mod domain;
pub mod export;
pub mod infra;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Command, config::Config, handlers::handle_export};

/// Main entry point for the CLI application.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    if let Err(err) = infra::logging::init_tracing(cli.verbose) {
        eprintln!("warning: logging disabled: {err}");
    }
    let config = Config::load(cli.config.as_deref())?;

    match &cli.command {
        Command::Export(args) => handle_export(args, &config),
    }
}
