//! Roll tables as Markdown tables.

use std::sync::Arc;

use serde_json::Value;

use crate::domain::{Document, LinkTarget, ResultKind, RollTableData, TableResult};
use crate::export::error::Result;
use crate::export::render::{Note, NoteScope, RunContext, document_path, front_matter};

pub(super) async fn render(
    ctx: &Arc<RunContext>,
    doc: &Arc<Document>,
    table: &RollTableData,
    ancestry: &[String],
) -> Result<Note> {
    let scope = NoteScope::new(ctx, Some(LinkTarget::Document(Arc::clone(doc))));
    let mut body = String::new();

    if let Some(description) = doc
        .data()
        .get("description")
        .and_then(Value::as_str)
        .filter(|d| !d.trim().is_empty())
    {
        if let Some(markdown) = scope.convert_html(description) {
            body.push_str(markdown.trim_end());
            body.push_str("\n\n");
        }
    }

    let formula = if table.formula.trim().is_empty() {
        "Roll"
    } else {
        table.formula.trim()
    };
    body.push_str(&format!("| {} | Result |\n", formula));
    body.push_str("|---|---|\n");

    for result in &table.results {
        body.push_str(&format!("| {} | {} |\n", range(result), result_text(&scope, result)));
    }

    scope
        .finish(front_matter(doc), body, document_path(ctx, doc, ancestry))
        .await
}

fn range(result: &TableResult) -> String {
    let [lo, hi] = result.range;
    if lo == hi {
        lo.to_string()
    } else {
        format!("{}-{}", lo, hi)
    }
}

fn result_text(scope: &NoteScope, result: &TableResult) -> String {
    let linked = match (result.kind, &result.document_collection, &result.document_id) {
        (ResultKind::Document, Some(collection), Some(id)) => {
            Some(format!("@{}[{}]{{{}}}", collection, id, result.text))
        }
        (ResultKind::Pack, Some(collection), Some(id)) => {
            Some(format!("@Compendium[{}.{}]{{{}}}", collection, id, result.text))
        }
        _ => None,
    };

    match linked {
        Some(reference) => scope.convert_links(&reference),
        None => scope
            .convert_html(&result.text)
            .map(|markdown| flatten(&markdown))
            .unwrap_or_default(),
    }
}

/// Table cells cannot hold line breaks.
fn flatten(markdown: &str) -> String {
    markdown
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
