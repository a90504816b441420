//! Options read by an export run.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Format of the structured-data block appended to generic notes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum DumpFormat {
    #[default]
    #[serde(rename = "YAML", alias = "yaml")]
    Yaml,
    #[serde(rename = "JSON", alias = "json")]
    Json,
    /// Anything else; the block is skipped with a warning.
    #[serde(other)]
    Unsupported,
}

impl DumpFormat {
    /// Language tag of the fenced code block.
    pub fn fence(&self) -> Option<&'static str> {
        match self {
            Self::Yaml => Some("yaml"),
            Self::Json => Some("json"),
            Self::Unsupported => None,
        }
    }
}

/// Export options.
///
/// Deserialized from the `[export]` table of the config file; missing keys
/// take their defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Format for the data dump of documents with no dedicated renderer.
    pub dump_format: DumpFormat,
    /// Render scenes as interactive-map (leaflet) blocks.
    pub leaflet_scenes: bool,
    /// Name the directory of a multi-page journal after its uuid.
    pub journal_folder_uses_id: bool,
    /// Name each note after its document's uuid instead of its name.
    pub note_name_uses_id: bool,
    /// Include pages and secret sections only the game master can see.
    pub include_gm_only: bool,
    /// Template files keyed by `Type.subtype` or `Type`.
    pub templates: BTreeMap<String, PathBuf>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            dump_format: DumpFormat::Yaml,
            leaflet_scenes: true,
            journal_folder_uses_id: true,
            note_name_uses_id: true,
            include_gm_only: true,
            templates: BTreeMap::new(),
        }
    }
}

impl ExportConfig {
    /// Finds the template for a document, preferring the subtype-specific one.
    ///
    /// Precedence order:
    /// 1. `Type.subtype`
    /// 2. `Type`
    pub fn template_for(&self, document_name: &str, subtype: Option<&str>) -> Option<&Path> {
        subtype
            .and_then(|sub| self.templates.get(&format!("{}.{}", document_name, sub)))
            .or_else(|| self.templates.get(document_name))
            .map(PathBuf::as_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_favour_stable_links() {
        let config = ExportConfig::default();
        assert_eq!(config.dump_format, DumpFormat::Yaml);
        assert!(config.leaflet_scenes);
        assert!(config.note_name_uses_id);
        assert!(config.journal_folder_uses_id);
        assert!(config.include_gm_only);
    }

    #[test]
    fn parses_partial_toml() {
        let config: ExportConfig = toml::from_str(
            r#"
            dump_format = "JSON"
            note_name_uses_id = false

            [templates]
            "Actor.character" = "pc.md"
            Actor = "actor.md"
            "#,
        )
        .unwrap();
        assert_eq!(config.dump_format, DumpFormat::Json);
        assert!(!config.note_name_uses_id);
        assert!(config.leaflet_scenes);
        assert_eq!(config.templates.len(), 2);
    }

    #[test]
    fn unknown_dump_format_is_unsupported() {
        let config: ExportConfig = toml::from_str(r#"dump_format = "XML""#).unwrap();
        assert_eq!(config.dump_format, DumpFormat::Unsupported);
        assert_eq!(config.dump_format.fence(), None);
    }

    #[test]
    fn template_lookup_prefers_subtype() {
        let mut config = ExportConfig::default();
        config.templates.insert("Actor".into(), "actor.md".into());
        config.templates.insert("Actor.character".into(), "pc.md".into());

        assert_eq!(
            config.template_for("Actor", Some("character")),
            Some(Path::new("pc.md"))
        );
        assert_eq!(
            config.template_for("Actor", Some("npc")),
            Some(Path::new("actor.md"))
        );
        assert_eq!(config.template_for("Item", None), None);
    }
}
