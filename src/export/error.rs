//! Errors raised while exporting.

use std::path::PathBuf;

use thiserror::Error;

use crate::export::ports::SourceError;

/// Errors that fail a single document or a whole export run.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("document not found: {0}")]
    DocumentNotFound(String),

    #[error("folder not found: {0}")]
    FolderNotFound(String),

    #[error("nothing to export for {0}")]
    EmptyTarget(String),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("failed to read template {path}: {source}")]
    TemplateRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("template {path} failed to render: {source}")]
    Template {
        path: PathBuf,
        #[source]
        source: minijinja::Error,
    },

    #[error("failed to write YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to write JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to write archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("failed to save archive {filename}: {source}")]
    Save {
        filename: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = ExportError> = std::result::Result<T, E>;
