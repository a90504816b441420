//! Journal entries: a table-of-contents note plus one note per page, or a
//! single note when the journal has one page.

use std::sync::Arc;

use crate::domain::{Document, JournalPage, LinkTarget, PAGE_DOCUMENT_NAME, PageContent};
use crate::export::error::Result;
use crate::export::paths::PathPlanner;
use crate::export::render::{Note, NoteScope, RunContext, document_path, front_matter};
use crate::infra::FrontMatter;

pub(super) async fn render(
    ctx: &Arc<RunContext>,
    doc: &Arc<Document>,
    ancestry: &[String],
) -> Result<Vec<Note>> {
    let pages = visible_pages(ctx, doc);

    // Layout follows the stored page count so that links planned from the
    // journal alone agree with where pages are written.
    match doc.pages().len() {
        0 => {
            let scope = NoteScope::new(ctx, Some(LinkTarget::Document(Arc::clone(doc))));
            let note = scope
                .finish(front_matter(doc), String::new(), document_path(ctx, doc, ancestry))
                .await?;
            Ok(vec![note])
        }
        1 => {
            let scope = NoteScope::new(ctx, Some(LinkTarget::Document(Arc::clone(doc))));
            let body = match pages.first() {
                Some((_, page)) => page_body(&scope, page),
                None => String::new(),
            };
            let note = scope
                .finish(front_matter(doc), body, document_path(ctx, doc, ancestry))
                .await?;
            Ok(vec![note])
        }
        _ => render_multi_page(ctx, doc, ancestry, &pages).await,
    }
}

async fn render_multi_page(
    ctx: &Arc<RunContext>,
    doc: &Arc<Document>,
    ancestry: &[String],
    pages: &[(usize, &JournalPage)],
) -> Result<Vec<Note>> {
    let mut dir = ancestry.to_vec();
    dir.push(ctx.planner.journal_dir(doc));

    let toc_scope = NoteScope::new(ctx, Some(LinkTarget::Document(Arc::clone(doc))));
    let mut toc = String::new();
    for &(index, page) in pages {
        let target = LinkTarget::Page {
            journal: Arc::clone(doc),
            index,
        };
        let indent = "  ".repeat(usize::from(page.title.level.max(1)) - 1);
        toc.push_str(&format!("{}- {}\n", indent, toc_scope.link_to(&target)));
    }

    let mut notes = Vec::with_capacity(pages.len() + 1);
    notes.push(
        toc_scope
            .finish(
                front_matter(doc),
                toc,
                PathPlanner::note_path(&dir, &ctx.planner.document_filename(doc)),
            )
            .await?,
    );

    for &(index, page) in pages {
        let target = LinkTarget::Page {
            journal: Arc::clone(doc),
            index,
        };
        let path = PathPlanner::note_path(&dir, &ctx.planner.note_filename(&target));
        let scope = NoteScope::new(ctx, Some(target));
        let body = page_body(&scope, page);
        let front = FrontMatter::new(&page.name, &doc.page_uuid(page), PAGE_DOCUMENT_NAME);
        notes.push(scope.finish(front, body, path).await?);
    }

    Ok(notes)
}

/// Pages in `sort` order, without the ones hidden from players when
/// GM-only content is excluded. Indices point into the stored page list.
fn visible_pages<'a>(ctx: &RunContext, doc: &'a Document) -> Vec<(usize, &'a JournalPage)> {
    let mut pages: Vec<_> = doc
        .pages()
        .iter()
        .enumerate()
        .filter(|(_, page)| ctx.config.include_gm_only || !page.gm_only)
        .collect();
    pages.sort_by_key(|(_, page)| page.sort);
    pages
}

fn page_body(scope: &NoteScope, page: &JournalPage) -> String {
    let mut body = String::new();
    if page.title.show {
        body.push_str(&format!("# {}\n\n", page.name));
    }

    match &page.content {
        PageContent::Text { content } => {
            if let Some(markdown) = scope.convert_html(content) {
                body.push_str(&markdown);
            }
        }
        PageContent::Image { src, caption } => {
            if let Some(src) = src {
                body.push_str(&scope.asset(src, None, true));
                body.push('\n');
            }
            if let Some(caption) = caption.as_deref().filter(|c| !c.is_empty()) {
                body.push('\n');
                body.push_str(caption);
                body.push('\n');
            }
        }
        PageContent::Pdf { src } | PageContent::Video { src } => {
            if let Some(src) = src {
                body.push_str(&scope.asset(src, None, true));
                body.push('\n');
            }
        }
        PageContent::Unsupported => {}
    }
    body
}
