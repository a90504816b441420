//! YAML front-matter written at the top of every exported note.

use serde::Serialize;

/// Metadata header of an exported note.
///
/// # Format
/// ```text
/// ---
/// title: The Old Keep
/// icon: fas fa-book-open
/// aliases:
/// - The Old Keep
/// uuid: JournalEntry.abc123
/// tags:
/// - JournalEntry
/// ---
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrontMatter {
    pub title: String,
    pub icon: String,
    pub aliases: Vec<String>,
    pub uuid: String,
    pub tags: Vec<String>,
}

impl FrontMatter {
    /// Builds the header for a document of type `document_name`.
    pub fn new(title: &str, uuid: &str, document_name: &str) -> Self {
        Self {
            title: title.to_string(),
            icon: icon_for(document_name).to_string(),
            aliases: vec![title.to_string()],
            uuid: uuid.to_string(),
            tags: vec![document_name.to_string()],
        }
    }

    /// Adds an extra tag (e.g. a document subtype).
    pub fn tag(mut self, tag: &str) -> Self {
        if !self.tags.iter().any(|t| t == tag) {
            self.tags.push(tag.to_string());
        }
        self
    }
}

/// Serializes the front-matter and body into a note.
pub fn serialize(front: &FrontMatter, body: &str) -> Result<String, serde_yaml::Error> {
    let yaml = serde_yaml::to_string(front)?;
    Ok(format!("---\n{}---\n{}", yaml, body))
}

/// Icon shown for each document type.
pub fn icon_for(document_name: &str) -> &'static str {
    match document_name {
        "Actor" => "fas fa-user",
        "Adventure" => "fas fa-treasure-chest",
        "Cards" => "fas fa-id-badge",
        "ChatMessage" => "fas fa-comments",
        "Combat" => "fas fa-swords",
        "Item" => "fas fa-suitcase",
        "JournalEntry" => "fas fa-book-open",
        "JournalEntryPage" => "fas fa-file-lines",
        "Macro" => "fas fa-code",
        "Playlist" => "fas fa-music",
        "RollTable" => "fas fa-th-list",
        "Scene" => "fas fa-map",
        _ => "fas fa-file",
    }
}
