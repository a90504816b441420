//! Reference resolution for exported notes.
//!
//! Rewrites `@Type[target#section]{label}` markup into wiki links. Targets
//! that are already loaded resolve immediately; targets the host can only
//! load asynchronously get a unique placeholder token and a spawned lookup,
//! and the token is substituted when the note is finalized.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures::future::join_all;
use regex::Captures;
use serde::Serialize;
use tokio::task::JoinHandle;
use ulid::Ulid;

use crate::domain::{LinkTarget, Reference, last_id, reference_pattern};
use crate::export::paths::PathPlanner;
use crate::export::ports::DocumentSource;

/// Link counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LinkCounts {
    /// Links that resolved to a document, immediately or after a lookup.
    pub resolved: usize,
    /// References that needed an asynchronous lookup.
    pub deferred: usize,
    /// References that became dummy links.
    pub broken: usize,
}

#[derive(Debug, Default)]
struct LinkStats {
    resolved: AtomicUsize,
    deferred: AtomicUsize,
    broken: AtomicUsize,
}

/// Formats a wiki link: `[[filename#anchor|label]]`.
///
/// The label is dropped when it repeats the filename.
pub fn format_link(filename: &str, anchor: Option<&str>, label: &str) -> String {
    let mut link = format!("[[{}", filename);
    if let Some(anchor) = anchor {
        link.push('#');
        link.push_str(anchor);
    }
    if label != filename {
        link.push('|');
        link.push_str(label);
    }
    link.push_str("]]");
    link
}

/// Link written for a reference that could not be resolved.
///
/// The dots of the uuid become path separators so the link still reads
/// like a location: `[[JournalEntry/abc|label]]`.
pub fn dummy_link(uuid: &str, label: Option<&str>) -> String {
    let path = uuid.replace('.', "/");
    match label {
        Some(label) => format!("[[{}|{}]]", path, label),
        None => format!("[[{}]]", path),
    }
}

struct Pending {
    token: String,
    fallback: String,
    handle: JoinHandle<String>,
}

/// Deferred link lookups registered while rendering one note.
///
/// Clones share the same list.
#[derive(Clone, Default)]
pub struct PendingLinks {
    inner: Arc<Mutex<Vec<Pending>>>,
}

impl PendingLinks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a lookup and returns the token standing in for its link.
    ///
    /// `fallback` replaces the token if the lookup task itself fails.
    pub fn register(&self, handle: JoinHandle<String>, fallback: String) -> String {
        let token = format!("@@LINK-{}@@", Ulid::new());
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Pending {
                token: token.clone(),
                fallback,
                handle,
            });
        token
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Waits for every registered lookup and substitutes its link.
    ///
    /// Each token is replaced once. The list is drained, so a second call
    /// only sees lookups registered after the first.
    pub async fn finalize(&self, text: String) -> String {
        let pending = std::mem::take(&mut *self.inner.lock().unwrap_or_else(PoisonError::into_inner));
        if pending.is_empty() {
            return text;
        }

        let (slots, handles): (Vec<_>, Vec<_>) = pending
            .into_iter()
            .map(|p| ((p.token, p.fallback), p.handle))
            .unzip();
        let results = join_all(handles).await;

        let mut text = text;
        for ((token, fallback), result) in slots.into_iter().zip(results) {
            let link = match result {
                Ok(link) => link,
                Err(err) => {
                    tracing::warn!(error = %err, "deferred link lookup failed");
                    fallback
                }
            };
            text = text.replacen(&token, &link, 1);
        }
        text
    }
}

/// Resolves references against the host's document source.
pub struct LinkResolver {
    planner: PathPlanner,
    source: Arc<dyn DocumentSource>,
    stats: LinkStats,
}

impl LinkResolver {
    pub fn new(planner: PathPlanner, source: Arc<dyn DocumentSource>) -> Self {
        Self {
            planner,
            source,
            stats: LinkStats::default(),
        }
    }

    pub fn counts(&self) -> LinkCounts {
        LinkCounts {
            resolved: self.stats.resolved.load(Ordering::Relaxed),
            deferred: self.stats.deferred.load(Ordering::Relaxed),
            broken: self.stats.broken.load(Ordering::Relaxed),
        }
    }

    /// Rewrites every document reference in `text`.
    ///
    /// References of unrecognized types are left untouched. Deferred lookups
    /// are spawned on the current runtime and registered in `pending`.
    pub fn convert_links(
        self: &Arc<Self>,
        text: &str,
        relative_to: Option<&LinkTarget>,
        pending: &PendingLinks,
    ) -> String {
        reference_pattern()
            .replace_all(text, |caps: &Captures| {
                match Reference::from_captures(caps) {
                    Some(reference) if reference.is_document_link() => {
                        self.resolve(&reference, relative_to, pending)
                    }
                    _ => caps[0].to_string(),
                }
            })
            .into_owned()
    }

    /// Resolves one reference to a link or a placeholder token.
    pub fn resolve(
        self: &Arc<Self>,
        reference: &Reference<'_>,
        relative_to: Option<&LinkTarget>,
        pending: &PendingLinks,
    ) -> String {
        let uuid = reference.uuid(relative_to);

        if let Some(target) = self.lookup(&uuid, relative_to) {
            self.stats.resolved.fetch_add(1, Ordering::Relaxed);
            return self.link_to(&target, reference.section, reference.label);
        }

        if self.source.is_deferred(&uuid) {
            self.stats.deferred.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(uuid = %uuid, "deferring reference lookup");

            let fallback = dummy_link(&uuid, reference.label);
            let resolver = Arc::clone(self);
            let section = reference.section.map(String::from);
            let label = reference.label.map(String::from);
            let handle = tokio::spawn(async move {
                resolver
                    .resolve_deferred(&uuid, section.as_deref(), label.as_deref())
                    .await
            });
            return pending.register(handle, fallback);
        }

        self.stats.broken.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(uuid = %uuid, "unresolved reference");
        dummy_link(&uuid, reference.label)
    }

    /// Formats a link to an already resolved target.
    ///
    /// The anchor is the heading text of the table-of-contents entry whose
    /// slug matches `section`; unknown sections are dropped. The label falls
    /// back to the heading text, then to the target's name.
    pub fn link_to(&self, target: &LinkTarget, section: Option<&str>, label: Option<&str>) -> String {
        let filename = self.planner.note_filename(target);
        let heading = section.and_then(|slug| target.toc().into_iter().find(|e| e.slug == slug));
        let anchor = heading.as_ref().map(|entry| entry.text.as_str());
        let label = label.or(anchor).unwrap_or_else(|| target.name());
        format_link(&filename, anchor, label)
    }

    fn lookup(&self, uuid: &str, relative_to: Option<&LinkTarget>) -> Option<LinkTarget> {
        self.source.document(uuid).or_else(|| {
            let context = relative_to?;
            self.source
                .collection_document(context.collection(), last_id(uuid))
        })
    }

    async fn resolve_deferred(&self, uuid: &str, section: Option<&str>, label: Option<&str>) -> String {
        match self.source.fetch(uuid).await {
            Some(target) => {
                self.stats.resolved.fetch_add(1, Ordering::Relaxed);
                self.link_to(&target, section, label)
            }
            None => {
                self.stats.broken.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(uuid = %uuid, "deferred reference did not resolve");
                dummy_link(uuid, label)
            }
        }
    }
}
