//! Folders and compendium packs: the grouping nodes of the content tree.

use std::sync::Arc;

use serde::Deserialize;

use crate::domain::Document;

/// A named grouping node. Folders nest through `parent`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default, alias = "folder")]
    pub parent: Option<String>,
    /// Type of the documents this folder groups (e.g. `JournalEntry`).
    #[serde(default, rename = "type")]
    pub document_type: Option<String>,
    #[serde(default)]
    pub sort: i64,
}

/// A compendium pack: a collection whose contents load lazily.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackInfo {
    /// Collection id, e.g. `world.monsters`.
    pub id: String,
    pub label: String,
    #[serde(default, rename = "type")]
    pub document_type: Option<String>,
    #[serde(default)]
    pub folder: Option<String>,
}

/// Direct children of a folder (or of a directory root).
///
/// Each list is in the host's native order.
#[derive(Debug, Clone, Default)]
pub struct FolderContents {
    pub documents: Vec<Arc<Document>>,
    pub folders: Vec<Folder>,
    pub packs: Vec<PackInfo>,
}

impl FolderContents {
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty() && self.folders.is_empty() && self.packs.is_empty()
    }
}

/// Everything a pack holds once loaded.
#[derive(Debug, Clone, Default)]
pub struct PackContents {
    pub folders: Vec<Folder>,
    pub documents: Vec<Arc<Document>>,
}

impl PackContents {
    /// Folder chain from the pack root down to `folder_id`.
    ///
    /// Unknown ids end the chain; a cycle is cut at the first repeat.
    pub fn ancestry(&self, folder_id: Option<&str>) -> Vec<&Folder> {
        let mut chain = Vec::new();
        let mut current = folder_id;
        while let Some(id) = current {
            let Some(folder) = self.folders.iter().find(|f| f.id == id) else {
                break;
            };
            if chain.iter().any(|f: &&Folder| f.id == folder.id) {
                break;
            }
            chain.push(folder);
            current = folder.parent.as_deref();
        }
        chain.reverse();
        chain
    }
}
