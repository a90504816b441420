//! Destination paths inside the archive.
//!
//! Every path is a pure function of a document's identity and its ancestry
//! in the content tree, so two runs over the same world produce the same
//! layout and links stay valid between exports.

use std::fmt;

use crate::domain::{Document, Folder, LinkTarget, PackInfo};
use crate::export::config::ExportConfig;
use crate::infra::valid_filename;

/// A slash-delimited path relative to the archive root.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OutputPath(String);

impl OutputPath {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for OutputPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Assigns filenames and directories to exported documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathPlanner {
    note_name_uses_id: bool,
    journal_folder_uses_id: bool,
}

impl PathPlanner {
    pub fn new(config: &ExportConfig) -> Self {
        Self {
            note_name_uses_id: config.note_name_uses_id,
            journal_folder_uses_id: config.journal_folder_uses_id,
        }
    }

    /// Filename (without extension) of the note a link target is written to.
    ///
    /// A page of a journal with exactly one page shares the journal's
    /// filename, since that journal is exported as a single note.
    pub fn note_filename(&self, target: &LinkTarget) -> String {
        match target {
            LinkTarget::Document(doc) => self.document_filename(doc),
            LinkTarget::Page { journal, .. } if journal.pages().len() == 1 => {
                self.document_filename(journal)
            }
            LinkTarget::Page { .. } if self.note_name_uses_id => valid_filename(&target.uuid()),
            LinkTarget::Page { .. } => valid_filename(target.name()),
        }
    }

    /// Filename (without extension) of a whole document's note.
    pub fn document_filename(&self, doc: &Document) -> String {
        if self.note_name_uses_id {
            valid_filename(doc.uuid())
        } else {
            valid_filename(doc.name())
        }
    }

    /// Directory holding the notes of a multi-page journal.
    pub fn journal_dir(&self, journal: &Document) -> String {
        if self.journal_folder_uses_id {
            valid_filename(journal.uuid())
        } else {
            valid_filename(journal.name())
        }
    }

    pub fn folder_segment(folder: &Folder) -> String {
        valid_filename(&folder.name)
    }

    pub fn pack_segment(pack: &PackInfo) -> String {
        valid_filename(&pack.label)
    }

    /// `<ancestry…>/<filename>.md`
    pub fn note_path(ancestry: &[String], filename: &str) -> OutputPath {
        let mut path = String::new();
        for segment in ancestry {
            path.push_str(segment);
            path.push('/');
        }
        path.push_str(filename);
        path.push_str(".md");
        OutputPath(path)
    }

    /// Name of the archive handed to the sink.
    pub fn archive_name(display: &str) -> String {
        format!("{}.zip", valid_filename(display))
    }
}
