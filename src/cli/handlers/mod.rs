//! Command handlers for the CLI.

mod export;

use std::io::Write;
use std::path::PathBuf;

use crate::export::{ArchiveSink, Notifier};

pub use export::{ExportResult, handle_export};

// ===========================================
// Host adapters for the terminal
// ===========================================

/// Notifier that prints progress and warnings to stderr.
pub(crate) struct TerminalNotifier {
    quiet: bool,
}

impl TerminalNotifier {
    /// A quiet notifier only prints warnings.
    pub(crate) fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl Notifier for TerminalNotifier {
    fn progress_started(&self, message: &str) {
        if !self.quiet {
            eprintln!("{}...", message);
        }
    }

    fn progress_finished(&self) {}

    fn warn(&self, message: &str) {
        eprintln!("warning: {}", message);
    }
}

/// Writes finished archives into a directory.
pub(crate) struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub(crate) fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ArchiveSink for DirectorySink {
    fn save(&self, filename: &str, bytes: &[u8]) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let mut file = std::fs::File::create(self.dir.join(filename))?;
        file.write_all(bytes)?;
        file.flush()
    }
}
