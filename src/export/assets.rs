//! Binary assets referenced by notes.
//!
//! Each asset is fetched at most once per run and lands in a shared
//! directory at the archive root. Identity is the normalized name, so two
//! different sources that normalize to the same name share one file.

use std::collections::HashSet;
use std::sync::{Arc, LazyLock, Mutex, PoisonError};

use percent_encoding::percent_decode_str;
use regex::{Captures, Regex};

use crate::export::archive::Archive;
use crate::export::ports::AssetFetcher;
use crate::infra::{keep_tail, sanitize};

/// Directory holding every exported asset.
pub const ASSET_DIR: &str = "zz_asset-files";

/// Longest archive path an asset may take, in characters.
pub const MAX_PATH_LEN: usize = 250;

static IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"!\[([^\]]*)\]\(([^)\s]+)(?:\s+"[^"]*")?\)"#).unwrap()
});

/// Normalized asset name for a source path or URL.
///
/// URL-decodes, flattens path separators to `-`, sanitizes, and keeps the
/// tail so that `zz_asset-files/<name>` fits in [`MAX_PATH_LEN`].
///
/// # Examples
///
/// ```
/// use lorekeep::export::asset_name;
///
/// assert_eq!(asset_name("worlds/my%20world/map.png"), "worlds-my world-map.png");
/// ```
pub fn asset_name(source: &str) -> String {
    let decoded = percent_decode_str(source).decode_utf8_lossy();
    let flattened = decoded.replace(['/', '\\'], "-");
    let name = sanitize(&flattened);
    let name = if name.is_empty() { "_" } else { name.as_str() };
    keep_tail(name, MAX_PATH_LEN - ASSET_DIR.len() - 1).to_string()
}

/// Formats an asset link: `![[name|label]]`.
pub fn asset_link(name: &str, label: Option<&str>, inline: bool) -> String {
    let bang = if inline { "!" } else { "" };
    match label {
        Some(label) => format!("{}[[{}|{}]]", bang, name, label),
        None => format!("{}[[{}]]", bang, name),
    }
}

/// Inline `data:` URIs and existing wiki links are never fetched.
fn passes_through(source: &str) -> bool {
    source.starts_with("data:") || source.starts_with("[[")
}

/// Run-scoped store of fetched assets.
pub struct AssetStore {
    fetcher: Arc<dyn AssetFetcher>,
    archive: Arc<Archive>,
    seen: Mutex<HashSet<String>>,
}

impl AssetStore {
    pub fn new(fetcher: Arc<dyn AssetFetcher>, archive: Arc<Archive>) -> Self {
        Self {
            fetcher,
            archive,
            seen: Mutex::new(HashSet::new()),
        }
    }

    /// Returns the link for an asset, starting its fetch on first sighting.
    ///
    /// `data:` URIs and sources that are already links pass through.
    /// Must be called inside a tokio runtime.
    pub fn store(&self, source: &str, label: Option<&str>, inline: bool) -> String {
        if passes_through(source) {
            return source.to_string();
        }

        let name = asset_name(source);
        let first_sighting = self
            .seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.clone());

        if first_sighting {
            let path = format!("{}/{}", ASSET_DIR, name);
            tracing::debug!(asset = %source, path = %path, "fetching asset");

            let fetcher = Arc::clone(&self.fetcher);
            let source = source.to_string();
            let handle = tokio::spawn(async move {
                match fetcher.fetch(&source).await {
                    Ok(bytes) => bytes,
                    Err(err) => {
                        tracing::warn!(asset = %source, error = %err, "asset fetch failed");
                        Vec::new()
                    }
                }
            });
            self.archive.add_asset(path, handle);
        }

        asset_link(&name, label, inline)
    }

    /// Rewrites Markdown image syntax produced by the HTML converter into
    /// embedded asset links.
    pub fn convert_images(&self, markdown: &str) -> String {
        IMAGE_RE
            .replace_all(markdown, |caps: &Captures| {
                if passes_through(&caps[2]) {
                    caps[0].to_string()
                } else {
                    self.store(&caps[2], None, true)
                }
            })
            .into_owned()
    }

    /// Number of distinct assets seen so far.
    pub fn len(&self) -> usize {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
