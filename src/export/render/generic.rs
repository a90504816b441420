//! Documents without a dedicated renderer: image, description, and a dump
//! of the remaining structured data.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::domain::{Document, LinkTarget};
use crate::export::config::DumpFormat;
use crate::export::error::Result;
use crate::export::render::{Note, NoteScope, RunContext, document_path, front_matter};

/// Rich-text fields rendered as prose, most specific first.
const DESCRIPTION_FIELDS: &[&str] = &[
    "system.description.value",
    "system.details.biography.value",
    "system.description",
    "description",
    "content",
];

pub(super) async fn render(
    ctx: &Arc<RunContext>,
    doc: &Arc<Document>,
    ancestry: &[String],
) -> Result<Note> {
    let scope = NoteScope::new(ctx, Some(LinkTarget::Document(Arc::clone(doc))));
    let mut body = String::new();

    if let Some(img) = doc.img() {
        body.push_str(&scope.asset(img, None, true));
        body.push_str("\n\n");
    }

    let mut data = doc.data().clone();
    for field in DESCRIPTION_FIELDS {
        let Some(html) = take_text(&mut data, field) else {
            continue;
        };
        if let Some(markdown) = scope.convert_html(&html) {
            body.push_str(markdown.trim_end());
            body.push_str("\n\n");
        }
    }

    if !data.is_empty() {
        if let Some(dump) = dump(ctx, doc, data)? {
            body.push_str(&scope.convert_links(&dump));
        }
    }

    let front = match doc.subtype() {
        Some(subtype) => front_matter(doc).tag(subtype),
        None => front_matter(doc),
    };
    scope
        .finish(front, body, document_path(ctx, doc, ancestry))
        .await
}

/// Fenced block with the remaining data, or `None` when the configured
/// format is unsupported.
fn dump(ctx: &RunContext, doc: &Document, data: Map<String, Value>) -> Result<Option<String>> {
    let format = ctx.config.dump_format;
    let Some(fence) = format.fence() else {
        tracing::warn!(uuid = %doc.uuid(), "unsupported dump format; omitting data block");
        return Ok(None);
    };

    let value = Value::Object(data);
    let text = match format {
        DumpFormat::Yaml => serde_yaml::to_string(&value)?,
        DumpFormat::Json => serde_json::to_string_pretty(&value)?,
        DumpFormat::Unsupported => return Ok(None),
    };
    Ok(Some(format!("```{}\n{}\n```\n", fence, text.trim_end())))
}

/// Removes a non-empty string at a dotted path and returns it.
///
/// Anything else at the path (objects, numbers, blanks) is left in place.
fn take_text(data: &mut Map<String, Value>, path: &str) -> Option<String> {
    let (parents, leaf) = match path.rsplit_once('.') {
        Some((parents, leaf)) => (Some(parents), leaf),
        None => (None, path),
    };

    let mut map = data;
    if let Some(parents) = parents {
        for key in parents.split('.') {
            map = map.get_mut(key)?.as_object_mut()?;
        }
    }

    let is_text = map
        .get(leaf)
        .and_then(Value::as_str)
        .is_some_and(|text| !text.trim().is_empty());
    if !is_text {
        return None;
    }
    match map.remove(leaf) {
        Some(Value::String(text)) => Some(text),
        _ => None,
    }
}
