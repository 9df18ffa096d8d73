//! Corpus-wide metadata, keyed by canonical document path.
//!
//! The [`MetaStore`] outlives every [`Environment`](crate::environment::Environment) of a build. It
//! is the only state shared across documents: each environment publishes its document's entry
//! into it, and resolvers read other documents' published titles and anchors from it.
//!
//! ## Single writer per key
//!
//! Every mutation goes through [`MetaStore::update`] or [`MetaStore::set`], which hold the store's
//! write lock for the duration of one entry's change. Readers get cloned entries and never observe
//! a partially updated entry. The reconciliation pass ([`MetaStore::reconcile`]) takes the lock
//! once per entry rather than once for the whole pass, so parallel publishers interleave at entry
//! granularity.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet},
    fs::{read_to_string, write},
    path::Path,
    sync::Arc,
};

use crate::error::BuildonomyError;

pub mod graph;

pub use graph::DependencyGraph;

/// A dependency edge of a document, keyed by canonical path.
///
/// `Pending` and `Resolved` entries for the same path are distinct values: a pending edge only
/// becomes resolved through an explicit promotion ([`MetaEntry::resolve_dependency`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Dependency {
    /// Edge to a known document
    Resolved(String),
    /// Edge declared before its target was known. Holds the placeholder key.
    Pending(String),
}

impl Dependency {
    pub fn path(&self) -> &str {
        match self {
            Dependency::Resolved(path) | Dependency::Pending(path) => path,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Dependency::Pending(_))
    }
}

impl std::fmt::Display for Dependency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dependency::Resolved(path) => write!(f, "{path}"),
            Dependency::Pending(path) => write!(f, "{path} (pending)"),
        }
    }
}

/// A numbered heading published by a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleEntry {
    pub level: usize,
    pub text: String,
    /// Slug of `text`
    pub anchor: String,
    /// Dot joined numbering, e.g. `1.2`
    pub number: String,
}

/// Published state of one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetaEntry {
    /// Canonical path of the document (the store key)
    pub file: String,
    /// Output url of the document, relative to the output root
    pub url: String,
    /// Text of the document's first title
    pub title: Option<String>,
    /// Titles in document order. Doubles as the table of contents.
    pub titles: Vec<TitleEntry>,
    /// Explicit labels defined in the document
    pub anchors: Vec<String>,
    pub dependencies: Vec<Dependency>,
}

impl MetaEntry {
    pub fn new(file: impl Into<String>, url: impl Into<String>) -> Self {
        MetaEntry {
            file: file.into(),
            url: url.into(),
            ..Default::default()
        }
    }

    /// Drop `dependency` from the entry. Returns whether it was present.
    pub fn remove_dependency(&mut self, dependency: &Dependency) -> bool {
        let before = self.dependencies.len();
        self.dependencies.retain(|dep| dep != dependency);
        before != self.dependencies.len()
    }

    /// Promote `Pending(placeholder)` to `Resolved(real_path)`, keeping its position.
    ///
    /// When `Resolved(real_path)` is already present the pending entry is dropped instead, so the
    /// list keeps set semantics. Returns whether a pending entry was found.
    pub fn resolve_dependency(&mut self, placeholder: &str, real_path: &str) -> bool {
        let pending = Dependency::Pending(placeholder.to_string());
        let resolved = Dependency::Resolved(real_path.to_string());
        let Some(idx) = self.dependencies.iter().position(|dep| dep == &pending) else {
            return false;
        };
        if self.dependencies.contains(&resolved) {
            self.dependencies.remove(idx);
        } else {
            self.dependencies[idx] = resolved;
        }
        true
    }

    pub fn pending_dependencies(&self) -> impl Iterator<Item = &str> {
        self.dependencies
            .iter()
            .filter(|dep| dep.is_pending())
            .map(|dep| dep.path())
    }

    /// Display text for `anchor` if this document defines it, either as a title slug or as an
    /// explicit label.
    pub fn anchor_title(&self, anchor: &str) -> Option<String> {
        if let Some(title) = self.titles.iter().find(|t| t.anchor == anchor) {
            return Some(title.text.clone());
        }
        self.anchors
            .iter()
            .find(|label| label.as_str() == anchor)
            .cloned()
    }
}

/// Outcome of a [`MetaStore::reconcile`] pass. Pairs are `(referencing file, dependency key)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub promoted: Vec<(String, String)>,
    pub still_pending: Vec<(String, String)>,
}

impl ReconcileReport {
    pub fn is_complete(&self) -> bool {
        self.still_pending.is_empty()
    }
}

/// Thread-safe store of [`MetaEntry`]s. Cloning is cheap and shares the underlying table.
#[derive(Debug, Clone, Default)]
pub struct MetaStore(Arc<RwLock<BTreeMap<String, MetaEntry>>>);

impl MetaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<MetaEntry> {
        self.0.read().get(path).cloned()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.0.read().contains_key(path)
    }

    pub fn files(&self) -> Vec<String> {
        self.0.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    /// Insert or replace the entry stored under `entry.file`.
    pub fn set(&self, entry: MetaEntry) {
        let mut writer = self.0.write();
        if writer.contains_key(&entry.file) {
            tracing::debug!("[MetaStore::set] Replacing entry for {}", entry.file);
        }
        writer.insert(entry.file.clone(), entry);
    }

    pub fn remove(&self, path: &str) -> Option<MetaEntry> {
        self.0.write().remove(path)
    }

    /// Mutate the entry for `path` under the write lock. Returns `None` if there is no entry.
    pub fn update<R, F: FnOnce(&mut MetaEntry) -> R>(&self, path: &str, f: F) -> Option<R> {
        let mut writer = self.0.write();
        writer.get_mut(path).map(f)
    }

    pub fn remove_dependency(&self, path: &str, dependency: &Dependency) -> bool {
        self.update(path, |entry| entry.remove_dependency(dependency))
            .unwrap_or(false)
    }

    pub fn resolve_dependency(&self, path: &str, placeholder: &str, real_path: &str) -> bool {
        self.update(path, |entry| entry.resolve_dependency(placeholder, real_path))
            .unwrap_or(false)
    }

    /// First document (in path order) defining `anchor`, with the anchor's display text.
    pub fn find_anchor(&self, anchor: &str) -> Option<(MetaEntry, String)> {
        let reader = self.0.read();
        reader.values().find_map(|entry| {
            entry
                .anchor_title(anchor)
                .map(|title| (entry.clone(), title))
        })
    }

    /// Promote every pending dependency whose key now names a published document.
    ///
    /// Only meaningful once every document has been through one compile pass. Keys that still
    /// name no document stay pending; that is not an error.
    pub fn reconcile(&self) -> ReconcileReport {
        let published: BTreeSet<String> = self.0.read().keys().cloned().collect();
        let mut report = ReconcileReport::default();

        for file in published.iter() {
            self.update(file, |entry| {
                let pending: Vec<String> =
                    entry.pending_dependencies().map(str::to_string).collect();
                for key in pending {
                    if published.contains(&key) {
                        entry.resolve_dependency(&key, &key);
                        tracing::debug!("[MetaStore::reconcile] {file}: promoted {key}");
                        report.promoted.push((file.clone(), key));
                    } else {
                        report.still_pending.push((file.clone(), key));
                    }
                }
            });
        }
        report
    }

    /// Graph of resolved dependency edges, for incremental rebuild queries.
    pub fn dependency_graph(&self) -> DependencyGraph {
        let reader = self.0.read();
        DependencyGraph::from_entries(reader.values())
    }

    /// Every document that must be rebuilt when `path` changes.
    pub fn dependents_of(&self, path: &str) -> Vec<String> {
        self.dependency_graph().dependents_of(path)
    }

    pub fn to_json(&self) -> Result<String, BuildonomyError> {
        let reader = self.0.read();
        Ok(serde_json::to_string_pretty(&*reader)?)
    }

    pub fn from_json(content: &str) -> Result<Self, BuildonomyError> {
        let entries: BTreeMap<String, MetaEntry> = serde_json::from_str(content)?;
        Ok(MetaStore(Arc::new(RwLock::new(entries))))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), BuildonomyError> {
        tracing::debug!("Saving metadata store to {:?}", path.as_ref());
        write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, BuildonomyError> {
        tracing::debug!("Loading metadata store from {:?}", path.as_ref());
        Self::from_json(&read_to_string(path)?)
    }
}
