//! User templates for documents of a given type.
//!
//! A template receives the document's structured data as its context and
//! three helpers:
//!
//! - `convert_html(text)` runs rich text through the HTML pipeline
//! - `fileconvert(filename, label)` embeds an asset
//! - `items_of_type(items, type)` filters a list by its `type` field

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use minijinja::{Environment, Value};

use crate::domain::{Document, LinkTarget};
use crate::export::error::{ExportError, Result};
use crate::export::paths::PathPlanner;
use crate::export::render::{Note, NoteScope, RunContext, front_matter};

const TEMPLATE_NAME: &str = "document.md";

/// Template sources read during a run, keyed by path.
#[derive(Default)]
pub struct TemplateCache {
    sources: Mutex<HashMap<PathBuf, Arc<str>>>,
}

impl TemplateCache {
    /// Reads a template, at most once per run.
    pub async fn load(&self, path: &Path) -> Result<Arc<str>> {
        if let Some(source) = self.lock().get(path) {
            return Ok(Arc::clone(source));
        }

        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ExportError::TemplateRead {
                path: path.to_path_buf(),
                source,
            })?;
        let source: Arc<str> = Arc::from(text);
        self.lock().insert(path.to_path_buf(), Arc::clone(&source));
        Ok(source)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, Arc<str>>> {
        self.sources.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Renders a document through the template at `path`.
///
/// A failure is reported to the user and fails this document only.
pub async fn render(
    ctx: &Arc<RunContext>,
    doc: &Arc<Document>,
    ancestry: &[String],
    path: &Path,
) -> Result<Note> {
    let scope = NoteScope::new(ctx, Some(LinkTarget::Document(Arc::clone(doc))));

    let rendered = ctx.templates.load(path).await.and_then(|source| {
        render_source(&scope, doc, &source).map_err(|source| ExportError::Template {
            path: path.to_path_buf(),
            source,
        })
    });
    let body = match rendered {
        Ok(body) => body,
        Err(err) => {
            ctx.notifier
                .warn(&format!("Template failed for {}: {}", doc.name(), err));
            return Err(err);
        }
    };

    let body = scope.convert_links(&body);
    let note_path = PathPlanner::note_path(ancestry, &ctx.planner.document_filename(doc));
    scope.finish(front_matter(doc), body, note_path).await
}

fn render_source(scope: &NoteScope, doc: &Document, source: &str) -> Result<String, minijinja::Error> {
    let mut env = Environment::new();

    let html_scope = scope.clone();
    env.add_function("convert_html", move |text: Option<String>| -> String {
        text.and_then(|text| html_scope.convert_html(&text))
            .unwrap_or_default()
    });

    let file_scope = scope.clone();
    env.add_function("fileconvert", move |filename: String, label: Option<String>| -> String {
        file_scope.asset(&filename, label.as_deref(), true)
    });

    env.add_filter("items_of_type", items_of_type);

    env.add_template(TEMPLATE_NAME, source)?;
    env.get_template(TEMPLATE_NAME)?.render(context(doc))
}

fn items_of_type(items: Vec<Value>, kind: &str) -> Vec<Value> {
    items
        .into_iter()
        .filter(|item| {
            item.get_attr("type")
                .ok()
                .is_some_and(|value| value.as_str() == Some(kind))
        })
        .collect()
}

/// Template context: the document's data plus its identity fields.
fn context(doc: &Document) -> serde_json::Value {
    let mut data = doc.data().clone();
    data.insert("id".into(), doc.id().into());
    data.insert("uuid".into(), doc.uuid().into());
    data.insert("name".into(), doc.name().into());
    data.insert("documentName".into(), doc.document_name().into());
    if let Some(img) = doc.img() {
        data.insert("img".into(), img.into());
    }
    serde_json::Value::Object(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::ExportConfig;
    use crate::export::render::testing::{
        RecordingNotifier, body, by_name, context_with, document,
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn template(text: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file
    }

    fn hero() -> Arc<Document> {
        document(json!({
            "documentName": "Actor", "_id": "a1", "name": "Mira", "type": "character",
            "img": "portraits/mira.png",
            "system": {"details": {"biography": {"value": "<p>Ally of @Actor[a1]</p>"}}},
            "items": [
                {"name": "Sword", "type": "weapon"},
                {"name": "Shield", "type": "armor"},
                {"name": "Axe", "type": "weapon"}
            ]
        }))
    }

    #[tokio::test]
    async fn renders_with_helpers() {
        let file = template(
            "# {{ name }}\n\
             {{ fileconvert(img, \"portrait\") }}\n\
             {{ convert_html(system.details.biography.value) }}\n\
             {% for item in items | items_of_type(\"weapon\") %}- {{ item.name }}\n{% endfor %}\
             See @UUID[{{ uuid }}]{self}",
        );
        let doc = hero();
        let mut config = by_name();
        config.templates.insert("Actor".into(), file.path().to_path_buf());
        let ctx = context_with(config, vec![Arc::clone(&doc)], Arc::new(RecordingNotifier::default()));

        let note = render(&ctx, &doc, &[], file.path()).await.unwrap();
        assert_eq!(
            body(&note),
            "# Mira\n\
             ![[portraits-mira.png|portrait]]\n\
             Ally of [[Mira]]\n\n\
             - Sword\n\
             - Axe\n\
             See [[Mira|self]]"
        );
    }

    #[tokio::test]
    async fn template_source_is_cached() {
        let file = template("v1");
        let cache = TemplateCache::default();
        assert_eq!(&*cache.load(file.path()).await.unwrap(), "v1");

        std::fs::write(file.path(), "v2").unwrap();
        assert_eq!(&*cache.load(file.path()).await.unwrap(), "v1");
    }

    #[tokio::test]
    async fn failing_template_notifies_and_errors() {
        let file = template("{{ name | no_such_filter }}");
        let doc = hero();
        let notifier = Arc::new(RecordingNotifier::default());
        let ctx = context_with(ExportConfig::default(), vec![], Arc::clone(&notifier));

        let err = render(&ctx, &doc, &[], file.path()).await.unwrap_err();
        assert!(matches!(err, ExportError::Template { .. }));
        let warnings = notifier.warnings.lock().unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("Mira"));
    }

    #[tokio::test]
    async fn missing_template_file_is_a_read_error() {
        let doc = hero();
        let notifier = Arc::new(RecordingNotifier::default());
        let ctx = context_with(ExportConfig::default(), vec![], Arc::clone(&notifier));

        let err = render(&ctx, &doc, &[], Path::new("/nonexistent/t.md")).await.unwrap_err();
        assert!(matches!(err, ExportError::TemplateRead { .. }));
        assert_eq!(notifier.warnings.lock().unwrap().len(), 1);
    }
}
