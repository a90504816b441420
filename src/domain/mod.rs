//! Core types: Document, JournalPage, Folder, PackInfo, Reference, LinkTarget

mod document;
mod folder;
mod reference;

pub use document::{
    Document, DocumentKind, Grid, JournalData, JournalPage, LinkTarget, MapNote, PAGE_DOCUMENT_NAME,
    PageContent, PageTitle, ParseDocumentError, PlaylistData, PlaylistSound, ResultKind,
    RollTableData, SceneData, TableResult, TocEntry,
};
pub use folder::{Folder, FolderContents, PackContents, PackInfo};
pub use reference::{DOCUMENT_LINK_TYPES, Reference, last_id, reference_pattern};
