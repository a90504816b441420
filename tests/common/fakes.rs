//! In-memory implementations of the exporter's host ports.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use lorekeep::export::{
    ArchiveSink, AssetFetcher, ConvertError, FetchError, HtmlConverter, Notifier,
};

/// Fetcher that records every request and returns the source as bytes.
///
/// Sources containing `missing` fail.
#[derive(Default)]
pub struct CountingFetcher {
    pub calls: Mutex<Vec<String>>,
}

impl CountingFetcher {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AssetFetcher for CountingFetcher {
    async fn fetch(&self, source: &str) -> Result<Vec<u8>, FetchError> {
        self.calls.lock().unwrap().push(source.to_string());
        if source.contains("missing") {
            return Err(FetchError::UnsafePath(source.to_string()));
        }
        Ok(source.as_bytes().to_vec())
    }
}

/// Sink that keeps saved archives in memory.
#[derive(Default)]
pub struct MemorySink {
    pub files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemorySink {
    pub fn get(&self, filename: &str) -> Vec<u8> {
        self.files
            .lock()
            .unwrap()
            .get(filename)
            .cloned()
            .unwrap_or_else(|| panic!("Nothing saved as {filename}"))
    }

    pub fn is_empty(&self) -> bool {
        self.files.lock().unwrap().is_empty()
    }
}

impl ArchiveSink for MemorySink {
    fn save(&self, filename: &str, bytes: &[u8]) -> std::io::Result<()> {
        self.files
            .lock()
            .unwrap()
            .insert(filename.to_string(), bytes.to_vec());
        Ok(())
    }
}

/// Notifier that keeps every message.
#[derive(Default)]
pub struct RecordingNotifier {
    pub started: Mutex<Vec<String>>,
    pub finished: Mutex<usize>,
    pub warnings: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn progress_started(&self, message: &str) {
        self.started.lock().unwrap().push(message.to_string());
    }

    fn progress_finished(&self) {
        *self.finished.lock().unwrap() += 1;
    }

    fn warn(&self, message: &str) {
        self.warnings.lock().unwrap().push(message.to_string());
    }
}

/// Converter that drops paragraph tags and keeps everything else verbatim.
pub struct PlainConverter;

impl HtmlConverter for PlainConverter {
    fn convert(&self, html: &str) -> Result<String, ConvertError> {
        Ok(html.replace("<p>", "").replace("</p>", "\n"))
    }
}
