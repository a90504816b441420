//! In-memory archive assembled during a run and serialized once at the end.

use std::collections::BTreeMap;
use std::io::{Cursor, Write};
use std::sync::{Mutex, PoisonError};

use futures::future::join_all;
use tokio::task::JoinHandle;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::export::error::Result;
use crate::export::paths::OutputPath;

enum Entry {
    Note(String),
    /// Bytes of an asset whose fetch may still be running.
    Asset(JoinHandle<Vec<u8>>),
}

/// The serialized archive.
#[derive(Debug)]
pub struct FinishedArchive {
    pub bytes: Vec<u8>,
    pub notes: usize,
    pub assets: usize,
}

/// Map from archive path to entry.
#[derive(Default)]
pub struct Archive {
    entries: Mutex<BTreeMap<String, Entry>>,
}

impl Archive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a finished note. A later note at the same path replaces the
    /// earlier one.
    pub fn add_note(&self, path: &OutputPath, text: String) {
        let previous = self
            .lock()
            .insert(path.to_string(), Entry::Note(text));
        if previous.is_some() {
            tracing::warn!(path = %path, "two notes share one path; keeping the last");
        }
    }

    /// Registers the pending bytes of an asset.
    pub fn add_asset(&self, path: String, bytes: JoinHandle<Vec<u8>>) {
        self.lock().insert(path, Entry::Asset(bytes));
    }

    pub fn contains(&self, path: &str) -> bool {
        self.lock().contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Waits for every pending asset and writes the zip.
    ///
    /// Entries are drained; the archive is empty afterwards.
    pub async fn finish(&self) -> Result<FinishedArchive> {
        let entries = std::mem::take(&mut *self.lock());

        let mut notes = Vec::new();
        let mut asset_paths = Vec::new();
        let mut asset_fetches = Vec::new();
        for (path, entry) in entries {
            match entry {
                Entry::Note(text) => notes.push((path, text)),
                Entry::Asset(handle) => {
                    asset_paths.push(path);
                    asset_fetches.push(handle);
                }
            }
        }

        tracing::debug!(assets = asset_fetches.len(), "awaiting asset fetches");
        let fetched = join_all(asset_fetches).await;

        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

        for (path, text) in &notes {
            zip.start_file(path.as_str(), options)?;
            zip.write_all(text.as_bytes())?;
        }
        for (path, result) in asset_paths.iter().zip(fetched) {
            let bytes = result.unwrap_or_else(|err| {
                tracing::warn!(asset = %path, error = %err, "asset task failed");
                Vec::new()
            });
            zip.start_file(path.as_str(), options)?;
            zip.write_all(&bytes)?;
        }

        let bytes = zip.finish()?.into_inner();
        Ok(FinishedArchive {
            bytes,
            notes: notes.len(),
            assets: asset_paths.len(),
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
