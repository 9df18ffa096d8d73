//! Named reference resolvers.
//!
//! Each reference kind ("section") of the source markup, e.g. `:doc:` or `:ref:`, is handled by a
//! [`ReferenceResolver`] registered under that name in a [`ResolverRegistry`]. The registry is
//! shared by every [`Environment`] of a build and passed in at construction.
//!
//! Register custom resolvers via [`ResolverRegistry::register`]:
//!
//! ```rust
//! use noet_xref::{
//!     environment::Environment,
//!     reference::{ReferenceResolver, ResolvedReference, ResolverRegistry},
//! };
//!
//! struct IssueResolver;
//!
//! impl ReferenceResolver for IssueResolver {
//!     fn resolve(&self, _env: &Environment, target: &str) -> Option<ResolvedReference> {
//!         let number: u32 = target.trim_start_matches('#').parse().ok()?;
//!         Some(ResolvedReference {
//!             file: String::new(),
//!             url: format!("https://tracker.example.org/issues/{number}"),
//!             anchor: None,
//!             title: Some(format!("issue #{number}")),
//!         })
//!     }
//! }
//!
//! let registry = ResolverRegistry::create();
//! registry.register("issue", IssueResolver);
//! assert!(registry.get("issue").is_some());
//! ```

use parking_lot::RwLock;
use std::{collections::HashMap, sync::Arc};

use crate::{environment::Environment, error::BuildonomyError};

pub mod anchor;
pub mod doc;

pub use anchor::AnchorResolver;
pub use doc::DocResolver;

/// A successfully resolved reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ResolvedReference {
    /// Canonical path of the destination document. Empty for targets outside the corpus.
    pub file: String,
    /// Url of the destination, as it should be written into the current document's output
    pub url: String,
    /// Fragment inside the destination
    pub anchor: Option<String>,
    /// Display title
    pub title: Option<String>,
}

impl ResolvedReference {
    /// `url` with the anchor appended as a fragment.
    pub fn href(&self) -> String {
        match &self.anchor {
            Some(anchor) if !anchor.is_empty() => format!("{}#{}", self.url, anchor),
            _ => self.url.clone(),
        }
    }
}

/// Resolver for one reference section.
pub trait ReferenceResolver: Send + Sync {
    /// Resolve `target` from the point of view of the document `env` is compiling. `None` means
    /// no match; the caller records the invalid link.
    fn resolve(&self, env: &Environment, target: &str) -> Option<ResolvedReference>;

    /// Note that `target` appeared in the document without producing a link (e.g. to register
    /// dependencies). Default: nothing to do.
    fn found(&self, _env: &mut Environment, _target: &str) -> Result<(), BuildonomyError> {
        Ok(())
    }
}

/// Thread-safe registry mapping section names to resolvers. Clones share one table; registering
/// a section again replaces its resolver.
#[derive(Clone, Default)]
pub struct ResolverRegistry(Arc<RwLock<HashMap<String, Arc<dyn ReferenceResolver>>>>);

impl std::fmt::Debug for ResolverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ResolverRegistry")
            .field(&self.sections())
            .finish()
    }
}

impl ResolverRegistry {
    /// Registry with the built-in `doc` and `ref` resolvers.
    pub fn create() -> Self {
        let registry = ResolverRegistry::default();
        registry.register(DocResolver::SECTION, DocResolver);
        registry.register(AnchorResolver::SECTION, AnchorResolver);
        registry
    }

    /// Install `resolver` under `section`, replacing any earlier resolver of that name.
    pub fn register<R: ReferenceResolver + 'static>(&self, section: impl Into<String>, resolver: R) {
        let section = section.into();
        let mut writer = self.0.write();
        if writer.contains_key(&section) {
            tracing::info!("[ResolverRegistry::register] Overwriting existing resolver: {section}");
        }
        writer.insert(section, Arc::new(resolver));
    }

    pub fn get(&self, section: &str) -> Option<Arc<dyn ReferenceResolver>> {
        self.0.read().get(section).cloned()
    }

    pub fn sections(&self) -> Vec<String> {
        let mut sections: Vec<String> = self.0.read().keys().cloned().collect();
        sections.sort();
        sections
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    struct Fixed(&'static str);

    impl ReferenceResolver for Fixed {
        fn resolve(&self, _env: &Environment, _target: &str) -> Option<ResolvedReference> {
            Some(ResolvedReference {
                url: self.0.to_string(),
                ..Default::default()
            })
        }
    }

    #[test]
    fn test_builtin_sections() {
        let registry = ResolverRegistry::create();
        assert_eq!(registry.sections(), vec!["doc", "ref"]);
        assert!(registry.get("term").is_none());
    }

    #[test]
    fn test_register_overwrites() {
        let registry = ResolverRegistry::default();
        registry.register("x", Fixed("first"));
        registry.register("x", Fixed("second"));
        assert_eq!(registry.sections(), vec!["x"]);

        let env = crate::tests::helpers::test_environment("index", &crate::metas::MetaStore::new());
        let resolved = registry.get("x").unwrap().resolve(&env, "anything").unwrap();
        assert_eq!(resolved.url, "second");
    }

    #[test]
    fn test_clones_share_table() {
        let registry = ResolverRegistry::default();
        let clone = registry.clone();
        clone.register("late", Fixed("x"));
        assert!(registry.get("late").is_some());
    }

    #[test]
    fn test_href() {
        let mut resolved = ResolvedReference {
            url: "setup.html".to_string(),
            ..Default::default()
        };
        assert_eq!(resolved.href(), "setup.html");
        resolved.anchor = Some("install".to_string());
        assert_eq!(resolved.href(), "setup.html#install");
    }
}
