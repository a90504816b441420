//! Scenes as interactive-map (leaflet) code blocks.
//!
//! Map coordinates put the origin at the bottom-left corner of the scene
//! rectangle, inside the padding, and measure in grid distance units.

use std::sync::Arc;

use crate::domain::{Document, LinkTarget, MapNote, PAGE_DOCUMENT_NAME, SceneData};
use crate::export::error::Result;
use crate::export::render::{Note, NoteScope, RunContext, document_path, front_matter};

/// Rounds to three decimal places.
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Converts scene pixels to map coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeafletProjection {
    scale: f64,
    left: f64,
    bottom: f64,
    width: f64,
    height: f64,
}

impl LeafletProjection {
    pub fn new(scene: &SceneData) -> Self {
        let size = if scene.grid.size > 0.0 { scene.grid.size } else { 1.0 };
        let pad_x = (scene.width * scene.padding / size).ceil() * size;
        let pad_y = (scene.height * scene.padding / size).ceil() * size;
        Self {
            scale: scene.grid.distance / size,
            left: pad_x,
            bottom: pad_y + scene.height,
            width: scene.width,
            height: scene.height,
        }
    }

    /// `(lat, long)` of a pixel position.
    pub fn project(&self, x: f64, y: f64) -> (f64, f64) {
        (
            round3((self.bottom - y) * self.scale),
            round3((x - self.left) * self.scale),
        )
    }

    /// `(lat, long)` of the far corner of the map.
    pub fn extent(&self) -> (f64, f64) {
        (round3(self.height * self.scale), round3(self.width * self.scale))
    }
}

pub(super) async fn render(
    ctx: &Arc<RunContext>,
    doc: &Arc<Document>,
    scene: &SceneData,
    ancestry: &[String],
) -> Result<Note> {
    let scope = NoteScope::new(ctx, Some(LinkTarget::Document(Arc::clone(doc))));
    let projection = LeafletProjection::new(scene);
    let (max_lat, max_long) = projection.extent();

    let mut block = String::from("```leaflet\n");
    block.push_str(&format!("id: {}\n", doc.uuid()));
    block.push_str("bounds:\n");
    block.push_str("  - [0, 0]\n");
    block.push_str(&format!("  - [{}, {}]\n", max_lat, max_long));
    block.push_str("defaultZoom: 2\n");
    block.push_str(&format!("lat: {}\n", round3(max_lat / 2.0)));
    block.push_str(&format!("long: {}\n", round3(max_long / 2.0)));
    block.push_str("height: 100%\n");
    block.push_str("draw: false\n");
    block.push_str(&format!("unit: {}\n", scene.grid.units));
    block.push_str("showAllMarkers: true\n");
    block.push_str("preserveAspect: true\n");

    let images: Vec<String> = [&scene.background, &scene.foreground]
        .into_iter()
        .flatten()
        .filter(|src| !src.is_empty())
        .map(|src| scope.asset(src, None, false))
        .collect();
    match images.as_slice() {
        [] => {}
        [only] => block.push_str(&format!("image: {}\n", only)),
        many => {
            block.push_str("image:\n");
            for image in many {
                block.push_str(&format!("  - {}\n", image));
            }
        }
    }

    for note in &scene.notes {
        if let Some(link) = marker_link(&scope, note) {
            let (lat, long) = projection.project(note.x, note.y);
            block.push_str(&format!("marker: default, {}, {}, {}\n", lat, long, link));
        }
    }
    block.push_str("```\n");

    scope
        .finish(front_matter(doc), block, document_path(ctx, doc, ancestry))
        .await
}

/// Link to the journal (or page) a map pin points at.
fn marker_link(scope: &NoteScope, note: &MapNote) -> Option<String> {
    let entry = note.entry_id.as_deref()?;
    let target = match note.page_id.as_deref() {
        Some(page) => format!("JournalEntry.{}.{}.{}", entry, PAGE_DOCUMENT_NAME, page),
        None => format!("JournalEntry.{}", entry),
    };
    let reference = match note.text.as_deref().filter(|t| !t.is_empty()) {
        Some(text) => format!("@UUID[{}]{{{}}}", target, text),
        None => format!("@UUID[{}]", target),
    };
    Some(scope.convert_links(&reference))
}
