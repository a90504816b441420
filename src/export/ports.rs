//! Capabilities the exporter needs from its host.
//!
//! Each port is a narrow trait so a run can be driven by the JSON world
//! loader and local fetcher shipped in `infra`, or by in-memory fakes.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Folder, FolderContents, LinkTarget, PackContents, PackInfo};

/// Error loading part of the host's content tree.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("compendium pack not found: {0}")]
    PackNotFound(String),

    #[error("failed to load compendium pack {pack}: {reason}")]
    PackLoad { pack: String, reason: String },
}

/// The host's document model.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Synchronous lookup among already loaded documents.
    fn document(&self, uuid: &str) -> Option<LinkTarget>;

    /// Lookup of a bare id inside a named collection (a pack id, or a
    /// world collection such as `JournalEntry`).
    fn collection_document(&self, _collection: &str, _id: &str) -> Option<LinkTarget> {
        None
    }

    /// Whether `uuid` cannot be resolved now but may resolve through [`fetch`](Self::fetch).
    fn is_deferred(&self, uuid: &str) -> bool;

    /// Asynchronous lookup, loading whatever is needed.
    async fn fetch(&self, uuid: &str) -> Option<LinkTarget>;

    fn folder(&self, id: &str) -> Option<Folder>;

    /// Direct children of a folder.
    fn folder_contents(&self, folder_id: &str) -> FolderContents;

    /// Top level of a sidebar directory: folders without a parent, documents
    /// without a folder and packs without a folder, for one document type.
    fn directory_contents(&self, document_type: &str) -> FolderContents;

    fn pack(&self, id: &str) -> Option<PackInfo>;

    /// Loads every document and internal folder of a pack.
    async fn pack_contents(&self, id: &str) -> Result<PackContents, SourceError>;
}

/// Error fetching an asset's bytes.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("unsafe asset path: {0}")]
    UnsafePath(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("request for {url} failed: {reason}")]
    Http { url: String, reason: String },
}

/// Retrieves binary assets referenced by documents.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    async fn fetch(&self, source: &str) -> Result<Vec<u8>, FetchError>;
}

/// Error from the structural HTML converter.
#[derive(Debug, Error)]
#[error("html conversion failed: {0}")]
pub struct ConvertError(pub String);

/// Structural rich-text to Markdown conversion.
pub trait HtmlConverter: Send + Sync {
    fn convert(&self, html: &str) -> Result<String, ConvertError>;
}

/// User-facing notifications.
pub trait Notifier: Send + Sync {
    /// Shows a persistent progress indicator.
    fn progress_started(&self, message: &str);

    /// Dismisses the progress indicator.
    fn progress_finished(&self);

    /// Shows a transient warning.
    fn warn(&self, message: &str);
}

/// The download mechanism receiving the finished archive.
pub trait ArchiveSink: Send + Sync {
    fn save(&self, filename: &str, bytes: &[u8]) -> std::io::Result<()>;
}

/// Notifier that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn progress_started(&self, message: &str) {
        tracing::info!("{}", message);
    }

    fn progress_finished(&self) {
        tracing::info!("export finished");
    }

    fn warn(&self, message: &str) {
        tracing::warn!("{}", message);
    }
}
