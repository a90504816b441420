//! Per-type Markdown renderers.
//!
//! A renderer turns one document into one or more notes. Every note is
//! rendered inside a [`NoteScope`], which collects the deferred link
//! lookups started while building its body and settles them before the
//! note is handed back.

mod generic;
mod journal;
mod playlist;
mod scene;
mod table;

use std::sync::Arc;

use crate::domain::{Document, DocumentKind, LinkTarget};
use crate::export::archive::Archive;
use crate::export::assets::AssetStore;
use crate::export::config::ExportConfig;
use crate::export::error::Result;
use crate::export::html;
use crate::export::links::{LinkResolver, PendingLinks};
use crate::export::paths::{OutputPath, PathPlanner};
use crate::export::ports::{HtmlConverter, Notifier};
use crate::export::template::{self, TemplateCache};
use crate::infra::{FrontMatter, serialize};

/// State shared by everything rendered in one run.
pub struct RunContext {
    pub config: ExportConfig,
    pub planner: PathPlanner,
    pub resolver: Arc<LinkResolver>,
    pub assets: AssetStore,
    pub archive: Arc<Archive>,
    pub converter: Arc<dyn HtmlConverter>,
    pub notifier: Arc<dyn Notifier>,
    pub templates: TemplateCache,
}

/// A rendered note and where it goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub path: OutputPath,
    pub text: String,
}

/// Rendering context of a single note.
///
/// `relative_to` anchors relative references (`@UUID[.pageId]`) and the
/// collection fallback of the resolver. Clones share pending lookups.
#[derive(Clone)]
pub struct NoteScope {
    ctx: Arc<RunContext>,
    relative_to: Option<LinkTarget>,
    pending: PendingLinks,
}

impl NoteScope {
    pub fn new(ctx: &Arc<RunContext>, relative_to: Option<LinkTarget>) -> Self {
        Self {
            ctx: Arc::clone(ctx),
            relative_to,
            pending: PendingLinks::new(),
        }
    }

    pub fn ctx(&self) -> &RunContext {
        &self.ctx
    }

    /// Rewrites the document references in `text`.
    pub fn convert_links(&self, text: &str) -> String {
        self.ctx
            .resolver
            .convert_links(text, self.relative_to.as_ref(), &self.pending)
    }

    /// Runs one rich-text field through the HTML pipeline.
    pub fn convert_html(&self, html: &str) -> Option<String> {
        html::convert_html(
            html,
            self.ctx.config.include_gm_only,
            self.ctx.converter.as_ref(),
            |text| self.convert_links(text),
            |markdown| self.ctx.assets.convert_images(markdown),
        )
    }

    /// Link to an asset, fetching it on first use.
    pub fn asset(&self, source: &str, label: Option<&str>, inline: bool) -> String {
        self.ctx.assets.store(source, label, inline)
    }

    /// Link to a target that is already loaded.
    pub fn link_to(&self, target: &LinkTarget) -> String {
        self.ctx.resolver.link_to(target, None, None)
    }

    /// Settles pending lookups and prefixes the front-matter.
    pub async fn finish(&self, front: FrontMatter, body: String, path: OutputPath) -> Result<Note> {
        let body = html::escape_table_links(&self.pending.finalize(body).await);
        let text = serialize(&front, &body)?;
        Ok(Note { path, text })
    }
}

/// Front-matter of a whole document's note.
pub fn front_matter(doc: &Document) -> FrontMatter {
    FrontMatter::new(doc.name(), doc.uuid(), doc.document_name())
}

/// Renders a document with its configured template or its type's renderer.
pub async fn render_document(
    ctx: &Arc<RunContext>,
    doc: &Arc<Document>,
    ancestry: &[String],
) -> Result<Vec<Note>> {
    if let Some(path) = ctx.config.template_for(doc.document_name(), doc.subtype()) {
        let path = path.to_path_buf();
        return template::render(ctx, doc, ancestry, &path).await.map(|note| vec![note]);
    }

    match doc.kind() {
        DocumentKind::Journal(_) => journal::render(ctx, doc, ancestry).await,
        DocumentKind::RollTable(table) => {
            table::render(ctx, doc, table, ancestry).await.map(|note| vec![note])
        }
        DocumentKind::Scene(scene) if ctx.config.leaflet_scenes => {
            scene::render(ctx, doc, scene, ancestry).await.map(|note| vec![note])
        }
        DocumentKind::Playlist(playlist) => {
            playlist::render(ctx, doc, playlist, ancestry).await.map(|note| vec![note])
        }
        DocumentKind::Scene(_) | DocumentKind::Generic { .. } => {
            generic::render(ctx, doc, ancestry).await.map(|note| vec![note])
        }
    }
}

/// Note path of a single-note document.
fn document_path(ctx: &RunContext, doc: &Document, ancestry: &[String]) -> OutputPath {
    PathPlanner::note_path(ancestry, &ctx.planner.document_filename(doc))
}
