//! Playlists: description, then each sound with its audio file embedded.

use std::sync::Arc;

use crate::domain::{Document, LinkTarget, PlaylistData};
use crate::export::error::Result;
use crate::export::render::{Note, NoteScope, RunContext, document_path, front_matter};

pub(super) async fn render(
    ctx: &Arc<RunContext>,
    doc: &Arc<Document>,
    playlist: &PlaylistData,
    ancestry: &[String],
) -> Result<Note> {
    let scope = NoteScope::new(ctx, Some(LinkTarget::Document(Arc::clone(doc))));
    let mut body = String::new();

    if let Some(markdown) = playlist.description.as_deref().and_then(|d| scope.convert_html(d)) {
        push_block(&mut body, &markdown);
    }

    for sound in &playlist.sounds {
        push_block(&mut body, &format!("## {}", sound.name));
        if let Some(path) = sound.path.as_deref().filter(|p| !p.is_empty()) {
            push_block(&mut body, &scope.asset(path, None, true));
        }
        if let Some(markdown) = sound.description.as_deref().and_then(|d| scope.convert_html(d)) {
            push_block(&mut body, &markdown);
        }
    }

    scope
        .finish(front_matter(doc), body, document_path(ctx, doc, ancestry))
        .await
}

fn push_block(body: &mut String, block: &str) {
    let block = block.trim();
    if block.is_empty() {
        return;
    }
    if !body.is_empty() {
        body.push('\n');
    }
    body.push_str(block);
    body.push('\n');
}
