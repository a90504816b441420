//! CLI command definitions and handlers

pub mod config;
pub mod handlers;
pub mod output;

use clap::{ArgAction, ArgGroup, Parser, Subcommand};
use std::path::PathBuf;

use crate::export::{DumpFormat, ExportTarget};
use output::OutputFormat;

/// lorekeep - export a tabletop world into linked Markdown notes
#[derive(Parser, Debug)]
#[command(name = "lorekeep", version, about, long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.config/lorekeep/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Export a document, folder, directory or compendium pack to a zip
    Export(ExportArgs),
}

/// Dump format for documents without a dedicated renderer
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum DumpArg {
    Yaml,
    Json,
}

impl From<DumpArg> for DumpFormat {
    fn from(arg: DumpArg) -> Self {
        match arg {
            DumpArg::Yaml => DumpFormat::Yaml,
            DumpArg::Json => DumpFormat::Json,
        }
    }
}

/// Arguments for the `export` command
#[derive(Parser, Debug)]
#[command(group(
    ArgGroup::new("target")
        .required(true)
        .args(["document", "folder", "directory", "pack"])
))]
pub struct ExportArgs {
    /// World file (JSON)
    pub world: PathBuf,

    /// Export one document by uuid (e.g. JournalEntry.abc123)
    #[arg(long)]
    pub document: Option<String>,

    /// Export a folder and everything below it
    #[arg(long)]
    pub folder: Option<String>,

    /// Export every top-level entry of a document type (e.g. Actor)
    #[arg(long)]
    pub directory: Option<String>,

    /// Export a compendium pack by collection id
    #[arg(long)]
    pub pack: Option<String>,

    /// Directory asset paths are relative to (default: the world's directory)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Directory the zip is written to
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,

    /// Format of the structured data block
    #[arg(long, value_enum)]
    pub dump_format: Option<DumpArg>,

    /// Render scenes as generic documents instead of Leaflet maps
    #[arg(long)]
    pub no_leaflet: bool,

    /// Name notes and journal directories after documents instead of ids
    #[arg(long)]
    pub names: bool,

    /// Leave out GM-only pages and secret blocks
    #[arg(long)]
    pub player: bool,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

impl ExportArgs {
    /// The selected target. Clap guarantees exactly one is set.
    pub fn target(&self) -> Option<ExportTarget> {
        if let Some(uuid) = &self.document {
            return Some(ExportTarget::Document(uuid.clone()));
        }
        if let Some(id) = &self.folder {
            return Some(ExportTarget::Folder(id.clone()));
        }
        if let Some(kind) = &self.directory {
            return Some(ExportTarget::Directory(kind.clone()));
        }
        self.pack.clone().map(ExportTarget::Pack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("lorekeep").chain(args.iter().copied()))
    }

    #[test]
    fn export_requires_exactly_one_target() {
        assert!(parse(&["export", "world.json"]).is_err());
        assert!(parse(&["export", "world.json", "--folder", "f1", "--pack", "p"]).is_err());
    }

    #[test]
    fn export_parses_target_and_overrides() {
        let cli = parse(&[
            "-vv", "export", "world.json", "--pack", "world.monsters", "--names", "--player",
            "--dump-format", "json",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Command::Export(args) = cli.command;
        assert_eq!(args.target(), Some(ExportTarget::Pack("world.monsters".into())));
        assert!(args.names && args.player && !args.no_leaflet);
        assert!(matches!(args.dump_format, Some(DumpArg::Json)));
        assert_eq!(args.output, PathBuf::from("."));
    }
}
