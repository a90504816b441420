//! Handler for the `export` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::cli::{ExportArgs, config::Config, output::{Output, OutputFormat}};
use crate::export::{ExportSummary, Exporter, LinkCounts};
use crate::infra::{LocalFetcher, LocalWorld};

use super::{DirectorySink, TerminalNotifier};

/// Result of an export operation.
#[derive(Debug, Serialize)]
pub struct ExportResult {
    /// Path of the written zip
    pub path: String,
    /// Number of notes in the archive
    pub notes: usize,
    /// Number of distinct assets in the archive
    pub assets: usize,
    pub links: LinkCounts,
    /// Documents or packs that failed to export
    pub failed: Vec<String>,
}

impl ExportResult {
    fn new(output: &std::path::Path, summary: ExportSummary) -> Self {
        Self {
            path: output.join(&summary.archive).display().to_string(),
            notes: summary.notes,
            assets: summary.assets,
            links: summary.links,
            failed: summary.failed,
        }
    }
}

/// Handle the `export` command.
pub fn handle_export(args: &ExportArgs, config: &Config) -> Result<()> {
    let target = args.target().context("no export target given")?;
    let world = LocalWorld::load(&args.world)?;
    tracing::info!(world = %world.name(), export = %target, "loaded world");

    let data_dir: PathBuf = config.data_dir(args);
    let quiet = matches!(args.format, OutputFormat::Json);
    let exporter = Exporter::new(
        Arc::new(world),
        Arc::new(LocalFetcher::new(data_dir)),
        Arc::new(DirectorySink::new(&args.output)),
    )
    .with_config(config.export_config(args))
    .with_notifier(Arc::new(TerminalNotifier::new(quiet)));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let summary = runtime
        .block_on(exporter.export(&target))
        .with_context(|| format!("failed to export {}", target))?;

    let result = ExportResult::new(&args.output, summary);
    let message = human_message(&result);
    print_result(args.format, result, &message)
}

fn human_message(result: &ExportResult) -> String {
    let mut message = format!(
        "Exported {} notes and {} assets to {}",
        result.notes, result.assets, result.path
    );
    if result.links.broken > 0 {
        message.push_str(&format!("\n{} unresolved references", result.links.broken));
    }
    if !result.failed.is_empty() {
        message.push_str(&format!("\nFailed: {}", result.failed.join(", ")));
    }
    message
}

fn print_result(format: OutputFormat, result: ExportResult, human_message: &str) -> Result<()> {
    match format {
        OutputFormat::Human => {
            println!("{}", human_message);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&Output::new(result))?);
        }
    }
    Ok(())
}
