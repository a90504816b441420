//! Tree walk and run orchestration.
//!
//! A run moves through `idle → collecting → finalizing → done`. Collecting
//! renders every document of the target into the in-memory archive;
//! finalizing waits for the asset fetches still in flight, serializes the
//! zip and hands it to the sink. Run-scoped state is dropped at `done`.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::domain::{Document, Folder, FolderContents, LinkTarget, PackInfo};
use crate::export::archive::Archive;
use crate::export::assets::AssetStore;
use crate::export::config::ExportConfig;
use crate::export::error::{ExportError, Result};
use crate::export::html::Html2MdConverter;
use crate::export::links::{LinkCounts, LinkResolver};
use crate::export::paths::PathPlanner;
use crate::export::ports::{
    ArchiveSink, AssetFetcher, DocumentSource, HtmlConverter, LogNotifier, Notifier, SourceError,
};
use crate::export::render::{RunContext, render_document};
use crate::export::template::TemplateCache;

/// What to export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportTarget {
    /// One document, by uuid.
    Document(String),
    /// A folder and everything below it.
    Folder(String),
    /// Every top-level folder and unfiled document of one document type
    /// (also the chat log and combat tracker).
    Directory(String),
    /// A compendium pack, by collection id.
    Pack(String),
}

impl fmt::Display for ExportTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Document(uuid) => write!(f, "document {}", uuid),
            Self::Folder(id) => write!(f, "folder {}", id),
            Self::Directory(kind) => write!(f, "{} directory", kind),
            Self::Pack(id) => write!(f, "pack {}", id),
        }
    }
}

/// Lifecycle of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Collecting,
    Finalizing,
    Done,
}

/// Outcome of a run.
#[derive(Debug, Clone, Serialize)]
pub struct ExportSummary {
    pub archive: String,
    pub notes: usize,
    pub assets: usize,
    pub links: LinkCounts,
    /// Uuids of documents (or ids of packs) that failed to export.
    pub failed: Vec<String>,
}

/// Unit of collection work, in output order.
enum WorkItem {
    Document {
        ancestry: Vec<String>,
        doc: Arc<Document>,
    },
    Pack {
        ancestry: Vec<String>,
        pack: PackInfo,
    },
}

/// Drives export runs against a host.
pub struct Exporter {
    source: Arc<dyn DocumentSource>,
    fetcher: Arc<dyn AssetFetcher>,
    sink: Arc<dyn ArchiveSink>,
    converter: Arc<dyn HtmlConverter>,
    notifier: Arc<dyn Notifier>,
    config: ExportConfig,
}

impl Exporter {
    pub fn new(
        source: Arc<dyn DocumentSource>,
        fetcher: Arc<dyn AssetFetcher>,
        sink: Arc<dyn ArchiveSink>,
    ) -> Self {
        Self {
            source,
            fetcher,
            sink,
            converter: Arc::new(Html2MdConverter),
            notifier: Arc::new(LogNotifier),
            config: ExportConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ExportConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_converter(mut self, converter: Arc<dyn HtmlConverter>) -> Self {
        self.converter = converter;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Exports `target` into one archive and saves it through the sink.
    ///
    /// Must run inside a tokio runtime: deferred lookups and asset fetches
    /// are spawned onto it.
    pub async fn export(&self, target: &ExportTarget) -> Result<ExportSummary> {
        let mut state = RunState::Idle;
        tracing::debug!(export = %target, state = ?state, "export requested");

        let (display, work) = self.plan(target).await?;
        if work.is_empty() {
            return Err(ExportError::EmptyTarget(target.to_string()));
        }
        let archive_name = PathPlanner::archive_name(&display);

        self.notifier
            .progress_started(&format!("Exporting {} to {}", display, archive_name));
        let ctx = self.run_context();

        transition(&mut state, RunState::Collecting, target);
        let failed = self.collect(&ctx, work).await;

        transition(&mut state, RunState::Finalizing, target);
        let finished = ctx.archive.finish().await;
        self.notifier.progress_finished();
        let finished = finished?;

        self.sink
            .save(&archive_name, &finished.bytes)
            .map_err(|source| ExportError::Save {
                filename: archive_name.clone(),
                source,
            })?;

        let summary = ExportSummary {
            archive: archive_name,
            notes: finished.notes,
            assets: finished.assets,
            links: ctx.resolver.counts(),
            failed,
        };
        drop(ctx);
        transition(&mut state, RunState::Done, target);

        tracing::info!(
            archive = %summary.archive,
            notes = summary.notes,
            assets = summary.assets,
            failed = summary.failed.len(),
            "export complete"
        );
        Ok(summary)
    }

    fn run_context(&self) -> Arc<RunContext> {
        let planner = PathPlanner::new(&self.config);
        let archive = Arc::new(Archive::new());
        Arc::new(RunContext {
            config: self.config.clone(),
            planner,
            resolver: Arc::new(LinkResolver::new(planner, Arc::clone(&self.source))),
            assets: AssetStore::new(Arc::clone(&self.fetcher), Arc::clone(&archive)),
            archive,
            converter: Arc::clone(&self.converter),
            notifier: Arc::clone(&self.notifier),
            templates: TemplateCache::default(),
        })
    }

    /// Resolves the target to its display name and the work to do.
    ///
    /// Fails when the target does not exist.
    async fn plan(&self, target: &ExportTarget) -> Result<(String, Vec<WorkItem>)> {
        let mut work = Vec::new();
        match target {
            ExportTarget::Document(uuid) => {
                let found = match self.source.document(uuid) {
                    Some(found) => Some(found),
                    None => self.source.fetch(uuid).await,
                };
                let doc = match found {
                    Some(LinkTarget::Document(doc)) => doc,
                    // A page exports as its whole journal.
                    Some(LinkTarget::Page { journal, .. }) => journal,
                    None => return Err(ExportError::DocumentNotFound(uuid.clone())),
                };
                let display = doc.name().to_string();
                work.push(WorkItem::Document {
                    ancestry: Vec::new(),
                    doc,
                });
                Ok((display, work))
            }
            ExportTarget::Folder(id) => {
                let folder = self
                    .source
                    .folder(id)
                    .ok_or_else(|| ExportError::FolderNotFound(id.clone()))?;
                let mut visited = HashSet::new();
                self.plan_folder(&folder, &[], &mut work, &mut visited);
                Ok((folder.name, work))
            }
            ExportTarget::Directory(kind) => {
                let contents = self.source.directory_contents(kind);
                let mut visited = HashSet::new();
                self.plan_contents(contents, &[], &mut work, &mut visited);
                Ok((kind.clone(), work))
            }
            ExportTarget::Pack(id) => {
                let pack = self
                    .source
                    .pack(id)
                    .ok_or_else(|| SourceError::PackNotFound(id.clone()))?;
                let display = pack.label.clone();
                work.push(WorkItem::Pack {
                    ancestry: Vec::new(),
                    pack,
                });
                Ok((display, work))
            }
        }
    }

    fn plan_folder(
        &self,
        folder: &Folder,
        ancestry: &[String],
        work: &mut Vec<WorkItem>,
        visited: &mut HashSet<String>,
    ) {
        if !visited.insert(folder.id.clone()) {
            tracing::warn!(folder = %folder.id, "folder cycle; skipping");
            return;
        }
        let mut ancestry = ancestry.to_vec();
        ancestry.push(PathPlanner::folder_segment(folder));
        let contents = self.source.folder_contents(&folder.id);
        self.plan_contents(contents, &ancestry, work, visited);
    }

    /// Documents first, then child folders, then packs.
    fn plan_contents(
        &self,
        contents: FolderContents,
        ancestry: &[String],
        work: &mut Vec<WorkItem>,
        visited: &mut HashSet<String>,
    ) {
        for doc in contents.documents {
            work.push(WorkItem::Document {
                ancestry: ancestry.to_vec(),
                doc,
            });
        }
        for child in &contents.folders {
            self.plan_folder(child, ancestry, work, visited);
        }
        for pack in contents.packs {
            work.push(WorkItem::Pack {
                ancestry: ancestry.to_vec(),
                pack,
            });
        }
    }

    /// Renders every work item; returns what failed.
    async fn collect(&self, ctx: &Arc<RunContext>, work: Vec<WorkItem>) -> Vec<String> {
        let mut failed = Vec::new();
        for item in work {
            match item {
                WorkItem::Document { ancestry, doc } => {
                    if !export_document(ctx, &doc, &ancestry).await {
                        failed.push(doc.uuid().to_string());
                    }
                }
                WorkItem::Pack { ancestry, pack } => {
                    let contents = match self.source.pack_contents(&pack.id).await {
                        Ok(contents) => contents,
                        Err(err) => {
                            tracing::warn!(pack = %pack.id, error = %err, "skipping pack");
                            failed.push(pack.id.clone());
                            continue;
                        }
                    };
                    let mut root = ancestry;
                    root.push(PathPlanner::pack_segment(&pack));
                    for doc in &contents.documents {
                        let mut ancestry = root.clone();
                        ancestry.extend(
                            contents
                                .ancestry(doc.folder())
                                .into_iter()
                                .map(PathPlanner::folder_segment),
                        );
                        if !export_document(ctx, doc, &ancestry).await {
                            failed.push(doc.uuid().to_string());
                        }
                    }
                }
            }
        }
        failed
    }
}

/// Renders one document into the archive. Failures are logged, not raised.
async fn export_document(ctx: &Arc<RunContext>, doc: &Arc<Document>, ancestry: &[String]) -> bool {
    tracing::debug!(uuid = %doc.uuid(), "rendering");
    match render_document(ctx, doc, ancestry).await {
        Ok(notes) => {
            for note in notes {
                ctx.archive.add_note(&note.path, note.text);
            }
            true
        }
        Err(err) => {
            tracing::warn!(uuid = %doc.uuid(), error = %err, "failed to export document");
            false
        }
    }
}

fn transition(state: &mut RunState, next: RunState, target: &ExportTarget) {
    tracing::debug!(export = %target, from = ?*state, to = ?next, "export state");
    *state = next;
}
