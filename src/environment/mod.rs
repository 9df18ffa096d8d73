//! Per-document compilation context.
//!
//! An [`Environment`] is created for one compile pass of one document and is driven by the parser
//! in strict document order: titles, link definitions, references and dependency declarations are
//! fed to it as they are discovered. Numbering, anonymous link binding and dependency registration
//! are all order dependent.
//!
//! ## Two-phase resolution
//!
//! 1. **Parse pass**: every document is compiled once. References whose target is already in the
//!    [`MetaStore`] resolve immediately; others are registered as pending dependencies. At the end
//!    of its pass each environment [publishes](Environment::publish) its document's entry.
//! 2. **Reconciliation**: once every document has been published, [`MetaStore::reconcile`] (or a
//!    later successful [`Environment::resolve`]) promotes pending dependencies to resolved ones,
//!    without reparsing the referencing documents.
//!
//! ```rust
//! use noet_xref::{
//!     config::OutputConfig, environment::Environment, metas::MetaStore,
//!     reference::ResolverRegistry,
//! };
//!
//! # fn main() -> Result<(), noet_xref::BuildonomyError> {
//! let metas = MetaStore::new();
//! let resolvers = ResolverRegistry::create();
//!
//! // index references guide/setup before guide/setup has been compiled.
//! let mut index = Environment::new("index", OutputConfig::default(), &metas, &resolvers)?;
//! index.record_title(1, "Welcome")?;
//! index.found("doc", "guide/setup")?;
//! index.publish();
//!
//! let mut setup = Environment::new("guide/setup", OutputConfig::default(), &metas, &resolvers)?;
//! setup.record_title(1, "Setup")?;
//! setup.publish();
//!
//! let report = metas.reconcile();
//! assert_eq!(report.promoted, vec![("index".to_string(), "guide/setup".to_string())]);
//! # Ok(())
//! # }
//! ```

use serde_json::Value;
use std::{
    collections::BTreeMap,
    path::PathBuf,
    sync::Arc,
};

use crate::{
    config::OutputConfig,
    diagnostic::{DiagnosticSink, InvalidLink, ParseDiagnostic, TracingSink},
    error::BuildonomyError,
    metas::{Dependency, MetaEntry, MetaStore, TitleEntry},
    paths::{normalize, slugify, UrlResolver},
    reference::ResolverRegistry,
};

pub mod links;
pub mod numbering;
mod resolution;

pub use links::{is_anonymous, normalize_link_name, LinkTable, ANONYMOUS};
pub use numbering::{Numbering, TitleNumber, TITLE_DEPTHS, TITLE_MARKER};

pub struct Environment {
    config: OutputConfig,
    metas: MetaStore,
    resolvers: ResolverRegistry,
    diagnostics: Arc<dyn DiagnosticSink>,

    /// Canonical name of the document, relative to the corpus root and without extension
    current_file_name: String,
    /// Source directory on disk that the corpus root maps to
    current_directory: PathBuf,
    url: Option<String>,

    numbering: Numbering,
    links: LinkTable,
    titles: Vec<TitleEntry>,
    anchors: Vec<String>,

    /// Keyed by canonical path, so every spelling of a target shares one entry
    dependencies: Vec<Dependency>,
    invalid_links: Vec<InvalidLink>,
    variables: BTreeMap<String, Value>,
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("current_file_name", &self.current_file_name)
            .field("url", &self.url)
            .field("numbering", &self.numbering)
            .field("links", &self.links)
            .field("dependencies", &self.dependencies)
            .field("invalid_links", &self.invalid_links)
            .finish_non_exhaustive()
    }
}

impl Environment {
    /// Create the context for compiling `file_name` (corpus-relative, `/` separated, no extension).
    pub fn new(
        file_name: &str,
        config: OutputConfig,
        metas: &MetaStore,
        resolvers: &ResolverRegistry,
    ) -> Result<Self, BuildonomyError> {
        let current_file_name = normalize(file_name)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| BuildonomyError::CanonicalUrl(file_name.to_string()))?;
        tracing::debug!("[Environment::new] {current_file_name}");
        Ok(Environment {
            config,
            metas: metas.clone(),
            resolvers: resolvers.clone(),
            diagnostics: Arc::new(TracingSink),
            current_file_name,
            current_directory: PathBuf::new(),
            url: None,
            numbering: Numbering::default(),
            links: LinkTable::default(),
            titles: Vec::new(),
            anchors: Vec::new(),
            dependencies: Vec::new(),
            invalid_links: Vec::new(),
            variables: BTreeMap::new(),
        })
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn with_current_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.current_directory = directory.into();
        self
    }

    pub fn config(&self) -> &OutputConfig {
        &self.config
    }

    pub fn metas(&self) -> &MetaStore {
        &self.metas
    }

    pub fn resolvers(&self) -> &ResolverRegistry {
        &self.resolvers
    }

    pub fn file_name(&self) -> &str {
        &self.current_file_name
    }

    pub fn current_directory(&self) -> &std::path::Path {
        &self.current_directory
    }

    pub fn target_directory(&self) -> &str {
        &self.config.target_directory
    }

    /// Pass-through to the diagnostics sink.
    pub fn report(&self, diagnostic: ParseDiagnostic) {
        self.diagnostics.report(diagnostic);
    }

    // --- numbering ---

    /// Reinitialize numbering state, keeping links, dependencies and variables.
    pub fn reset(&mut self) {
        self.numbering.reset();
    }

    pub fn create_title(&mut self, level: usize) -> Result<TitleNumber, BuildonomyError> {
        self.numbering.create_title(level)
    }

    pub fn get_number(&mut self, level: usize) -> Result<usize, BuildonomyError> {
        self.numbering.get_number(level)
    }

    pub fn get_level(&mut self, letter: char) -> Result<usize, BuildonomyError> {
        self.numbering.get_level(letter)
    }

    pub fn current_title_level(&self) -> usize {
        self.numbering.current_level()
    }

    /// Number a title and add it to the document's table of contents.
    pub fn record_title(&mut self, level: usize, text: &str) -> Result<TitleEntry, BuildonomyError> {
        let number = self.create_title(level)?;
        let entry = TitleEntry {
            level,
            text: text.trim().to_string(),
            anchor: slugify(text),
            number: number.numbering(),
        };
        self.titles.push(entry.clone());
        Ok(entry)
    }

    pub fn titles(&self) -> &[TitleEntry] {
        &self.titles
    }

    /// Publish an explicit label. Returns its slug, `None` if nothing of `name` survives slugify.
    pub fn add_anchor(&mut self, name: &str) -> Option<String> {
        let anchor = slugify(name);
        if anchor.is_empty() {
            return None;
        }
        if !self.anchors.contains(&anchor) {
            self.anchors.push(anchor.clone());
        }
        Some(anchor)
    }

    pub fn anchors(&self) -> &[String] {
        &self.anchors
    }

    /// Display text for an anchor defined in this document.
    pub fn local_anchor_title(&self, anchor: &str) -> Option<String> {
        if let Some(title) = self.titles.iter().find(|t| t.anchor == anchor) {
            return Some(title.text.clone());
        }
        self.anchors
            .iter()
            .find(|label| label.as_str() == anchor)
            .cloned()
    }

    // --- links ---

    pub fn set_link(&mut self, name: &str, url: &str) {
        if is_anonymous(name) && self.links.anonymous_pending() == 0 {
            self.report(ParseDiagnostic::warning(format!(
                "{}: anonymous link target '{}' has no anonymous reference to bind to",
                self.current_file_name,
                url.trim()
            )));
        }
        self.links.set_link(name, url);
    }

    pub fn push_anonymous(&mut self, name: &str) {
        self.links.push_anonymous(name);
    }

    pub fn reset_anonymous_stack(&mut self) {
        self.links.reset_anonymous();
    }

    /// Url stored under `name`, or `None` if the link is undefined. With `relative`, rooted urls
    /// are rewritten relative to the current document.
    pub fn get_link(&self, name: &str, relative: bool) -> Option<String> {
        let url = self.links.get(name)?;
        Some(if relative {
            self.urls().relative_url(url)
        } else {
            url.to_string()
        })
    }

    pub fn get_links(&self) -> &BTreeMap<String, String> {
        self.links.links()
    }

    // --- urls ---

    pub fn set_url(&mut self, url: &str) {
        self.url = Some(url.trim().trim_start_matches('/').to_string());
    }

    /// Output url of the document: the override when set, the file name otherwise.
    pub fn url(&self) -> &str {
        self.urls().url()
    }

    pub fn dir_name(&self) -> &str {
        self.urls().dir_name()
    }

    pub fn urls(&self) -> UrlResolver<'_> {
        UrlResolver::new(
            &self.current_file_name,
            &self.config.target_directory,
            self.url.as_deref(),
        )
    }

    pub fn canonical_url(&self, url: &str) -> Option<String> {
        self.urls().canonical_url(url)
    }

    pub fn absolute_url(&self, url: &str) -> String {
        self.urls().absolute_url(url)
    }

    pub fn relative_url(&self, url: &str) -> String {
        self.urls().relative_url(url)
    }

    pub fn generate_url(&self, path: &str) -> Option<String> {
        self.urls().generate_url(path)
    }

    /// Location on disk of a file referenced from the current document.
    pub fn source_path(&self, url: &str) -> Option<PathBuf> {
        let canonical = self.canonical_url(url)?;
        Some(
            canonical
                .split('/')
                .fold(self.current_directory.clone(), |path, part| path.join(part)),
        )
    }

    /// How a published document url (relative to the output root) is written from this document.
    pub fn reference_url(&self, published_url: &str) -> String {
        let rooted = format!("/{}", published_url.trim_start_matches('/'));
        if self.config.use_relative_urls {
            self.urls().relative_url(&rooted)
        } else {
            rooted
        }
    }

    // --- variables ---

    pub fn set_variable(&mut self, name: &str, value: impl Into<Value>) {
        self.variables.insert(name.to_string(), value.into());
    }

    pub fn get_variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn get_variable_or(&self, name: &str, default: Value) -> Value {
        self.variables.get(name).cloned().unwrap_or(default)
    }

    pub fn variables(&self) -> &BTreeMap<String, Value> {
        &self.variables
    }

    // --- results ---

    pub fn get_dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    pub fn dependencies(&self) -> &[Dependency] {
        self.get_dependencies()
    }

    pub fn get_invalid_links(&self) -> &[InvalidLink] {
        &self.invalid_links
    }

    /// The document's entry as it would be published now.
    pub fn meta_entry(&self) -> MetaEntry {
        MetaEntry {
            file: self.current_file_name.clone(),
            url: self.config.document_url(self.url()),
            title: self.titles.first().map(|t| t.text.clone()),
            titles: self.titles.clone(),
            anchors: self.anchors.clone(),
            dependencies: self.dependencies.clone(),
        }
    }

    /// Merge the document's titles, anchors and dependencies into the store, replacing the entry
    /// from any earlier pass.
    pub fn publish(&self) -> MetaEntry {
        let entry = self.meta_entry();
        tracing::debug!(
            "[Environment::publish] {} ({} dependencies, {} titles)",
            entry.file,
            entry.dependencies.len(),
            entry.titles.len()
        );
        self.metas.set(entry.clone());
        entry
    }
}
