//! Export of a document tree into a zip of interlinked Markdown notes.
//!
//! The [`Exporter`] walks a target (a document, folder, directory or
//! compendium pack), renders each document with its type's renderer or a
//! user template, rewrites references into wiki links, collects assets,
//! and serializes the archive once all deferred work has settled.

mod archive;
mod assets;
mod config;
mod error;
mod html;
mod links;
mod paths;
pub mod ports;
mod render;
mod template;
mod walker;

pub use archive::{Archive, FinishedArchive};
pub use assets::{ASSET_DIR, AssetStore, MAX_PATH_LEN, asset_link, asset_name};
pub use config::{DumpFormat, ExportConfig};
pub use error::{ExportError, Result};
pub use html::{
    Html2MdConverter, convert_html, escape_table_links, strip_secrets, unescape_wiki_links,
};
pub use links::{LinkCounts, LinkResolver, PendingLinks, dummy_link, format_link};
pub use paths::{OutputPath, PathPlanner};
pub use ports::{
    ArchiveSink, AssetFetcher, ConvertError, DocumentSource, FetchError, HtmlConverter,
    LogNotifier, Notifier, SourceError,
};
pub use render::{Note, NoteScope, RunContext, render_document};
pub use template::TemplateCache;
pub use walker::{ExportSummary, ExportTarget, Exporter, RunState};
