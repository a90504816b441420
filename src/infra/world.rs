//! A world read from a JSON export on disk.
//!
//! # Format
//!
//! ```json
//! {
//!   "name": "Lost Mine",
//!   "folders":   [{"_id": "f1", "name": "Lore", "type": "JournalEntry"}],
//!   "documents": [{"documentName": "JournalEntry", "_id": "j1", "name": "Intro", "folder": "f1"}],
//!   "packs": [
//!     {"id": "world.monsters", "label": "Monsters", "type": "Actor", "path": "packs/monsters.json"},
//!     {"id": "world.items", "label": "Items", "type": "Item", "documents": [], "folders": []}
//!   ]
//! }
//! ```
//!
//! Pack contents are either inline or in a JSON file (`{"folders": [...],
//! "documents": [...]}`) relative to the world file. Either way a pack is
//! only loaded the first time it is asked for, so references into it
//! resolve asynchronously.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

use crate::domain::{Document, Folder, FolderContents, LinkTarget, PackContents, PackInfo};
use crate::export::ports::{DocumentSource, SourceError};

/// Errors loading a world file.
#[derive(Debug, Error)]
pub enum WorldError {
    #[error("failed to read world {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid world file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Deserialize)]
struct WorldFile {
    #[serde(default)]
    name: String,
    #[serde(default)]
    folders: Vec<Folder>,
    #[serde(default, deserialize_with = "skip_invalid")]
    documents: Vec<Document>,
    #[serde(default)]
    packs: Vec<PackFile>,
}

#[derive(Deserialize)]
struct PackFile {
    #[serde(flatten)]
    info: PackInfo,
    #[serde(default)]
    path: Option<PathBuf>,
    #[serde(default)]
    folders: Vec<Folder>,
    #[serde(default, deserialize_with = "skip_invalid")]
    documents: Vec<Document>,
}

#[derive(Deserialize)]
struct PackContentsFile {
    #[serde(default)]
    folders: Vec<Folder>,
    #[serde(default, deserialize_with = "skip_invalid")]
    documents: Vec<Document>,
}

/// Decodes documents one at a time, dropping the ones that do not parse.
fn skip_invalid<'de, D>(deserializer: D) -> Result<Vec<Document>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<Document>(value) {
            Ok(doc) => Some(doc),
            Err(err) => {
                tracing::warn!(error = %err, "skipping document that failed to parse");
                None
            }
        })
        .collect())
}

enum PackSource {
    Inline {
        folders: Vec<Folder>,
        documents: Vec<Document>,
    },
    File(PathBuf),
}

struct Pack {
    info: PackInfo,
    source: PackSource,
}

/// A world loaded from disk, implementing [`DocumentSource`].
pub struct LocalWorld {
    name: String,
    root: PathBuf,
    folders: Vec<Folder>,
    documents: Vec<Arc<Document>>,
    packs: Vec<Pack>,
    loaded: Mutex<HashMap<String, Arc<PackContents>>>,
}

impl LocalWorld {
    /// Reads a world file. Pack files are resolved relative to its directory.
    pub fn load(path: &Path) -> Result<Self, WorldError> {
        let text = std::fs::read_to_string(path).map_err(|source| WorldError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let root = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::from_json(&text, root).map_err(|source| WorldError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parses a world from JSON text.
    pub fn from_json(text: &str, root: PathBuf) -> Result<Self, serde_json::Error> {
        let file: WorldFile = serde_json::from_str(text)?;

        let mut folders = file.folders;
        folders.sort_by_key(|f| f.sort);
        let mut documents: Vec<Arc<Document>> = file.documents.into_iter().map(Arc::new).collect();
        documents.sort_by_key(|d| d.sort());

        let packs = file
            .packs
            .into_iter()
            .map(|pack| {
                let source = match pack.path {
                    Some(path) => PackSource::File(path),
                    None => PackSource::Inline {
                        folders: pack.folders,
                        documents: pack.documents,
                    },
                };
                Pack {
                    info: pack.info,
                    source,
                }
            })
            .collect();

        Ok(Self {
            name: file.name,
            root,
            folders,
            documents,
            packs,
            loaded: Mutex::new(HashMap::new()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn loaded(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<PackContents>>> {
        self.loaded.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pack whose documents' uuids start with this uuid's prefix.
    fn pack_for(&self, uuid: &str) -> Option<&Pack> {
        let rest = uuid.strip_prefix("Compendium.")?;
        self.packs.iter().find(|pack| {
            rest.strip_prefix(pack.info.id.as_str())
                .is_some_and(|tail| tail.starts_with('.'))
        })
    }

    async fn load_pack(&self, pack: &Pack) -> Result<Arc<PackContents>, SourceError> {
        let cached = self.loaded().get(&pack.info.id).cloned();
        if let Some(contents) = cached {
            return Ok(contents);
        }

        let id = pack.info.id.as_str();
        let (folders, documents) = match &pack.source {
            PackSource::Inline { folders, documents } => (folders.clone(), documents.clone()),
            PackSource::File(path) => {
                let path = self.root.join(path);
                tracing::debug!(pack = %id, path = %path.display(), "loading pack");
                let text = tokio::fs::read_to_string(&path).await.map_err(|err| {
                    SourceError::PackLoad {
                        pack: id.to_string(),
                        reason: format!("{}: {}", path.display(), err),
                    }
                })?;
                let file: PackContentsFile =
                    serde_json::from_str(&text).map_err(|err| SourceError::PackLoad {
                        pack: id.to_string(),
                        reason: err.to_string(),
                    })?;
                (file.folders, file.documents)
            }
        };

        let mut documents: Vec<Arc<Document>> = documents
            .into_iter()
            .map(|doc| Arc::new(doc.into_pack(id)))
            .collect();
        documents.sort_by_key(|d| d.sort());
        let mut folders = folders;
        folders.sort_by_key(|f| f.sort);

        let contents = Arc::new(PackContents { folders, documents });
        self.loaded().insert(id.to_string(), Arc::clone(&contents));
        Ok(contents)
    }
}

#[async_trait]
impl DocumentSource for LocalWorld {
    fn document(&self, uuid: &str) -> Option<LinkTarget> {
        if let Some(found) = self.documents.iter().find_map(|doc| LinkTarget::within(doc, uuid)) {
            return Some(found);
        }
        let pack = self.pack_for(uuid)?;
        let contents = self.loaded().get(&pack.info.id).cloned()?;
        contents
            .documents
            .iter()
            .find_map(|doc| LinkTarget::within(doc, uuid))
    }

    fn collection_document(&self, collection: &str, id: &str) -> Option<LinkTarget> {
        if let Some(contents) = self.loaded().get(collection).cloned() {
            return contents
                .documents
                .iter()
                .find(|doc| doc.id() == id)
                .map(|doc| LinkTarget::Document(Arc::clone(doc)));
        }
        self.documents
            .iter()
            .find(|doc| doc.document_name() == collection && doc.id() == id)
            .map(|doc| LinkTarget::Document(Arc::clone(doc)))
    }

    fn is_deferred(&self, uuid: &str) -> bool {
        self.pack_for(uuid)
            .is_some_and(|pack| !self.loaded().contains_key(&pack.info.id))
    }

    async fn fetch(&self, uuid: &str) -> Option<LinkTarget> {
        if let Some(found) = self.document(uuid) {
            return Some(found);
        }
        let pack = self.pack_for(uuid)?;
        match self.load_pack(pack).await {
            Ok(contents) => contents
                .documents
                .iter()
                .find_map(|doc| LinkTarget::within(doc, uuid)),
            Err(err) => {
                tracing::warn!(uuid = %uuid, error = %err, "lookup failed");
                None
            }
        }
    }

    fn folder(&self, id: &str) -> Option<Folder> {
        self.folders.iter().find(|f| f.id == id).cloned()
    }

    fn folder_contents(&self, folder_id: &str) -> FolderContents {
        FolderContents {
            documents: self
                .documents
                .iter()
                .filter(|doc| doc.folder() == Some(folder_id))
                .cloned()
                .collect(),
            folders: self
                .folders
                .iter()
                .filter(|f| f.parent.as_deref() == Some(folder_id))
                .cloned()
                .collect(),
            packs: self
                .packs
                .iter()
                .filter(|p| p.info.folder.as_deref() == Some(folder_id))
                .map(|p| p.info.clone())
                .collect(),
        }
    }

    fn directory_contents(&self, document_type: &str) -> FolderContents {
        let is_known_folder =
            |id: Option<&str>| id.is_some_and(|id| self.folders.iter().any(|f| f.id == id));
        FolderContents {
            documents: self
                .documents
                .iter()
                .filter(|doc| doc.document_name() == document_type && !is_known_folder(doc.folder()))
                .cloned()
                .collect(),
            folders: self
                .folders
                .iter()
                .filter(|f| {
                    f.document_type.as_deref() == Some(document_type)
                        && !is_known_folder(f.parent.as_deref())
                })
                .cloned()
                .collect(),
            packs: self
                .packs
                .iter()
                .filter(|p| {
                    p.info.document_type.as_deref() == Some(document_type)
                        && !is_known_folder(p.info.folder.as_deref())
                })
                .map(|p| p.info.clone())
                .collect(),
        }
    }

    fn pack(&self, id: &str) -> Option<PackInfo> {
        self.packs
            .iter()
            .find(|p| p.info.id == id)
            .map(|p| p.info.clone())
    }

    async fn pack_contents(&self, id: &str) -> Result<PackContents, SourceError> {
        let pack = self
            .packs
            .iter()
            .find(|p| p.info.id == id)
            .ok_or_else(|| SourceError::PackNotFound(id.to_string()))?;
        let contents = self.load_pack(pack).await?;
        Ok(PackContents::clone(&contents))
    }
}
