//! Documents read from the host world: journals, tables, scenes, playlists
//! and everything else as generic structured records.

use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::infra::slugify;

/// Document type tag of journal pages, used when building page uuids.
pub const PAGE_DOCUMENT_NAME: &str = "JournalEntryPage";

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<h([1-6])[^>]*>(.*?)</h[1-6]>").unwrap());

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());

/// Error returned when a raw document cannot be turned into a [`Document`].
#[derive(Debug, Clone)]
pub struct ParseDocumentError {
    uuid: String,
    reason: String,
}

impl fmt::Display for ParseDocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid document {}: {}", self.uuid, self.reason)
    }
}

impl std::error::Error for ParseDocumentError {}

/// A read-only document from the host's content tree.
///
/// The type-specific fields are decoded once into [`DocumentKind`]; the raw
/// structured data is kept alongside for generic dumps and templates.
///
/// # Examples
///
/// ```
/// use lorekeep::domain::{Document, DocumentKind};
///
/// let doc: Document = serde_json::from_str(
///     r#"{"documentName": "Item", "id": "i1", "name": "Rope", "type": "gear"}"#,
/// ).unwrap();
/// assert_eq!(doc.uuid(), "Item.i1");
/// assert!(matches!(doc.kind(), DocumentKind::Generic { subtype: Some(s) } if s == "gear"));
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RawDocument")]
pub struct Document {
    id: String,
    name: String,
    document_name: String,
    uuid: String,
    folder: Option<String>,
    img: Option<String>,
    sort: i64,
    pack: Option<String>,
    data: Map<String, Value>,
    kind: DocumentKind,
}

/// The closed set of document categories the exporter knows how to render.
#[derive(Debug, Clone)]
pub enum DocumentKind {
    Journal(JournalData),
    RollTable(RollTableData),
    Scene(SceneData),
    Playlist(PlaylistData),
    /// Any other document type, rendered from its structured data.
    Generic { subtype: Option<String> },
}

impl Document {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name. Never empty: nameless documents fall back to their id.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type tag such as `JournalEntry` or `Actor`.
    pub fn document_name(&self) -> &str {
        &self.document_name
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    pub fn folder(&self) -> Option<&str> {
        self.folder.as_deref()
    }

    pub fn img(&self) -> Option<&str> {
        self.img.as_deref()
    }

    pub fn sort(&self) -> i64 {
        self.sort
    }

    /// Compendium pack holding this document, if any.
    pub fn pack(&self) -> Option<&str> {
        self.pack.as_deref()
    }

    /// Structured data not consumed by the common fields.
    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    pub fn kind(&self) -> &DocumentKind {
        &self.kind
    }

    /// Subtype of a generic document (e.g. `character` for an actor).
    pub fn subtype(&self) -> Option<&str> {
        self.data.get("type").and_then(Value::as_str)
    }

    /// Collection this document lives in: its pack, or the world collection
    /// named after its type.
    pub fn collection(&self) -> &str {
        self.pack.as_deref().unwrap_or(&self.document_name)
    }

    /// Journal pages, empty for every other kind.
    pub fn pages(&self) -> &[JournalPage] {
        match &self.kind {
            DocumentKind::Journal(journal) => &journal.pages,
            _ => &[],
        }
    }

    /// Moves the document into a compendium pack, rewriting its uuid.
    pub fn into_pack(mut self, pack: &str) -> Self {
        self.uuid = format!("Compendium.{}.{}.{}", pack, self.document_name, self.id);
        self.pack = Some(pack.to_string());
        self
    }

    /// Uuid of one of this journal's pages.
    pub fn page_uuid(&self, page: &JournalPage) -> String {
        format!("{}.{}.{}", self.uuid, PAGE_DOCUMENT_NAME, page.id)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDocument {
    document_name: String,
    #[serde(alias = "_id")]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    uuid: Option<String>,
    #[serde(default)]
    folder: Option<String>,
    #[serde(default)]
    img: Option<String>,
    #[serde(default)]
    sort: i64,
    #[serde(default)]
    pack: Option<String>,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

impl TryFrom<RawDocument> for Document {
    type Error = ParseDocumentError;

    fn try_from(raw: RawDocument) -> Result<Self, Self::Error> {
        let uuid = match (&raw.uuid, &raw.pack) {
            (Some(uuid), _) => uuid.clone(),
            (None, Some(pack)) => format!("Compendium.{}.{}.{}", pack, raw.document_name, raw.id),
            (None, None) => format!("{}.{}", raw.document_name, raw.id),
        };
        let decode = |reason: serde_json::Error| ParseDocumentError {
            uuid: uuid.clone(),
            reason: reason.to_string(),
        };
        let value = Value::Object(raw.rest.clone());

        let kind = match raw.document_name.as_str() {
            "JournalEntry" => {
                DocumentKind::Journal(serde_json::from_value(value).map_err(decode)?)
            }
            "RollTable" => DocumentKind::RollTable(serde_json::from_value(value).map_err(decode)?),
            "Scene" => DocumentKind::Scene(serde_json::from_value(value).map_err(decode)?),
            "Playlist" => DocumentKind::Playlist(serde_json::from_value(value).map_err(decode)?),
            _ => DocumentKind::Generic {
                subtype: raw.rest.get("type").and_then(Value::as_str).map(String::from),
            },
        };

        let name = if raw.name.trim().is_empty() {
            raw.id.clone()
        } else {
            raw.name
        };

        Ok(Self {
            id: raw.id,
            name,
            document_name: raw.document_name,
            uuid,
            folder: raw.folder,
            img: raw.img.filter(|img| !img.is_empty()),
            sort: raw.sort,
            pack: raw.pack,
            data: raw.rest,
            kind,
        })
    }
}

// ===========================================
// Journals
// ===========================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JournalData {
    #[serde(default)]
    pub pages: Vec<JournalPage>,
}

/// One page of a journal entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalPage {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub sort: i64,
    #[serde(default)]
    pub title: PageTitle,
    /// Only visible to the game master.
    #[serde(default)]
    pub gm_only: bool,
    #[serde(flatten)]
    pub content: PageContent,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageTitle {
    #[serde(default)]
    pub show: bool,
    #[serde(default = "default_level")]
    pub level: u8,
}

impl Default for PageTitle {
    fn default() -> Self {
        Self {
            show: false,
            level: default_level(),
        }
    }
}

fn default_level() -> u8 {
    1
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PageContent {
    Text {
        #[serde(default)]
        content: String,
    },
    Image {
        src: Option<String>,
        #[serde(default)]
        caption: Option<String>,
    },
    Pdf {
        src: Option<String>,
    },
    Video {
        src: Option<String>,
    },
    #[serde(other)]
    Unsupported,
}

/// A heading of a text page, addressable by its slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub slug: String,
    pub text: String,
    pub level: u8,
}

impl JournalPage {
    /// Table of contents built from the page's HTML headings.
    ///
    /// Non-text pages have no table of contents.
    pub fn toc(&self) -> Vec<TocEntry> {
        let PageContent::Text { content } = &self.content else {
            return Vec::new();
        };

        HEADING_RE
            .captures_iter(content)
            .filter_map(|caps| {
                let level = caps[1].parse::<u8>().ok()?;
                let text = TAG_RE.replace_all(&caps[2], "").trim().to_string();
                if text.is_empty() {
                    return None;
                }
                Some(TocEntry {
                    slug: slugify(&text),
                    text,
                    level,
                })
            })
            .collect()
    }
}

// ===========================================
// Roll tables
// ===========================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RollTableData {
    #[serde(default)]
    pub formula: String,
    #[serde(default)]
    pub results: Vec<TableResult>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableResult {
    #[serde(default)]
    pub range: [i64; 2],
    #[serde(rename = "type", default)]
    pub kind: ResultKind,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub document_collection: Option<String>,
    #[serde(default)]
    pub document_id: Option<String>,
}

/// What a table result points at.
///
/// Older worlds store the kind as a number: `0` text, `1` document,
/// `2` compendium entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawResultKind")]
pub enum ResultKind {
    #[default]
    Text,
    Document,
    Pack,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawResultKind {
    Code(u64),
    Name(String),
}

impl TryFrom<RawResultKind> for ResultKind {
    type Error = String;

    fn try_from(raw: RawResultKind) -> Result<Self, Self::Error> {
        match raw {
            RawResultKind::Code(0) => Ok(Self::Text),
            RawResultKind::Code(1) => Ok(Self::Document),
            RawResultKind::Code(2) => Ok(Self::Pack),
            RawResultKind::Name(name) => match name.as_str() {
                "text" => Ok(Self::Text),
                "document" => Ok(Self::Document),
                "pack" => Ok(Self::Pack),
                _ => Err(format!("unknown table result type: {}", name)),
            },
            RawResultKind::Code(code) => Err(format!("unknown table result type: {}", code)),
        }
    }
}

// ===========================================
// Scenes
// ===========================================

#[derive(Debug, Clone, Deserialize)]
pub struct SceneData {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub padding: f64,
    pub grid: Grid,
    #[serde(default)]
    pub background: Option<String>,
    #[serde(default)]
    pub foreground: Option<String>,
    #[serde(default)]
    pub notes: Vec<MapNote>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Grid {
    /// Pixels per grid square.
    pub size: f64,
    /// Distance units per grid square.
    pub distance: f64,
    #[serde(default)]
    pub units: String,
}

/// A pin placed on a scene, optionally linked to a journal or page.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapNote {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub entry_id: Option<String>,
    #[serde(default)]
    pub page_id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

// ===========================================
// Playlists
// ===========================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaylistData {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sounds: Vec<PlaylistSound>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistSound {
    pub name: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

// ===========================================
// Link targets
// ===========================================

/// What a uuid resolves to: a whole document or a single journal page.
#[derive(Debug, Clone)]
pub enum LinkTarget {
    Document(Arc<Document>),
    Page { journal: Arc<Document>, index: usize },
}

impl LinkTarget {
    /// The document itself, or the journal owning the page.
    pub fn document(&self) -> &Arc<Document> {
        match self {
            Self::Document(doc) => doc,
            Self::Page { journal, .. } => journal,
        }
    }

    pub fn page(&self) -> Option<&JournalPage> {
        match self {
            Self::Document(_) => None,
            Self::Page { journal, index } => journal.pages().get(*index),
        }
    }

    pub fn name(&self) -> &str {
        match self.page() {
            Some(page) => &page.name,
            None => self.document().name(),
        }
    }

    pub fn uuid(&self) -> String {
        match self.page() {
            Some(page) => self.document().page_uuid(page),
            None => self.document().uuid().to_string(),
        }
    }

    pub fn collection(&self) -> &str {
        self.document().collection()
    }

    /// Headings that can be linked to with a `#section` anchor.
    ///
    /// A single-page journal exposes its only page's headings.
    pub fn toc(&self) -> Vec<TocEntry> {
        match self {
            Self::Page { .. } => self.page().map(JournalPage::toc).unwrap_or_default(),
            Self::Document(doc) => match doc.pages() {
                [only] => only.toc(),
                _ => Vec::new(),
            },
        }
    }

    /// Resolves a uuid inside an already loaded document.
    ///
    /// Handles both `<uuid>` and `<uuid>.JournalEntryPage.<page id>`.
    pub fn within(doc: &Arc<Document>, uuid: &str) -> Option<Self> {
        if uuid == doc.uuid() {
            return Some(Self::Document(Arc::clone(doc)));
        }
        let rest = uuid.strip_prefix(doc.uuid())?;
        let page_id = rest.strip_prefix(&format!(".{}.", PAGE_DOCUMENT_NAME))?;
        let index = doc.pages().iter().position(|p| p.id == page_id)?;
        Some(Self::Page {
            journal: Arc::clone(doc),
            index,
        })
    }
}
