//! Embedded reference markup: `@Type[target#section]{label}`.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::domain::{LinkTarget, PAGE_DOCUMENT_NAME};

/// Reference types that point at documents and become note links.
pub const DOCUMENT_LINK_TYPES: &[&str] = &[
    "UUID",
    "Compendium",
    "JournalEntry",
    "JournalEntryPage",
    "Actor",
    "Item",
    "Scene",
    "RollTable",
    "Playlist",
    "PlaylistSound",
    "Cards",
    "Macro",
    "Adventure",
    "ChatMessage",
    "Combat",
];

static REFERENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@(inline)?([A-Za-z]+)\[([^#\]]+)(?:#([^\]]+))?\](?:\{([^}]*)\})?").unwrap()
});

/// Pattern matching every reference occurrence, recognized or not.
pub fn reference_pattern() -> &'static Regex {
    &REFERENCE_RE
}

/// One parsed reference occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference<'a> {
    pub kind: &'a str,
    pub inline: bool,
    pub target: &'a str,
    pub section: Option<&'a str>,
    pub label: Option<&'a str>,
}

impl<'a> Reference<'a> {
    /// Builds a reference from a match of [`reference_pattern`].
    pub fn from_captures(caps: &Captures<'a>) -> Option<Self> {
        Some(Self {
            inline: caps.get(1).is_some(),
            kind: caps.get(2)?.as_str(),
            target: caps.get(3)?.as_str().trim(),
            section: caps.get(4).map(|m| m.as_str().trim()),
            label: caps
                .get(5)
                .map(|m| m.as_str().trim())
                .filter(|label| !label.is_empty()),
        })
    }

    /// Parses the first reference in `text`.
    pub fn parse(text: &'a str) -> Option<Self> {
        reference_pattern()
            .captures(text)
            .and_then(|caps| Self::from_captures(&caps))
    }

    /// Whether the type names a document the exporter can link to.
    pub fn is_document_link(&self) -> bool {
        DOCUMENT_LINK_TYPES.contains(&self.kind)
    }

    /// Fully-qualified uuid of the target.
    ///
    /// Relative targets (`.pageId`) are anchored on the journal of `relative_to`.
    pub fn uuid(&self, relative_to: Option<&LinkTarget>) -> String {
        if let Some(page_id) = self.target.strip_prefix('.') {
            if let Some(context) = relative_to {
                return format!(
                    "{}.{}.{}",
                    context.document().uuid(),
                    PAGE_DOCUMENT_NAME,
                    page_id
                );
            }
        }
        match self.kind {
            "UUID" => self.target.to_string(),
            "Compendium" if self.target.starts_with("Compendium.") => self.target.to_string(),
            "Compendium" => format!("Compendium.{}", self.target),
            kind if self.target.starts_with(&format!("{kind}.")) => self.target.to_string(),
            kind => format!("{}.{}", kind, self.target),
        }
    }
}

/// Last id segment of a uuid, used for collection lookups.
pub fn last_id(uuid: &str) -> &str {
    uuid.rsplit('.').next().unwrap_or(uuid)
}
