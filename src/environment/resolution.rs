//! Reference resolution and dependency tracking for [`Environment`].

use super::Environment;
use crate::{
    diagnostic::{InvalidLink, ParseDiagnostic},
    error::BuildonomyError,
    metas::Dependency,
    reference::ResolvedReference,
};

impl Environment {
    /// Record that the current document depends on `path`.
    ///
    /// `path` is canonicalized relative to the current document; a path with no canonical form is
    /// malformed input and fails the call. With `requires_resolving` the dependency is stored as
    /// pending under its canonical path, to be promoted once a reference to any spelling of that
    /// path resolves. Re-adding an existing dependency is a no-op; otherwise first insertion order
    /// is kept.
    pub fn add_dependency(
        &mut self,
        path: &str,
        requires_resolving: bool,
    ) -> Result<(), BuildonomyError> {
        let canonical = self
            .canonical_url(path)
            .ok_or_else(|| BuildonomyError::CanonicalUrl(path.to_string()))?;
        let dependency = if requires_resolving {
            Dependency::Pending(canonical)
        } else {
            Dependency::Resolved(canonical)
        };
        if self.dependencies.contains(&dependency) {
            return Ok(());
        }
        tracing::debug!(
            "[Environment::add_dependency] {} -> {dependency}",
            self.current_file_name
        );
        self.dependencies.push(dependency);
        Ok(())
    }

    /// Resolve `target` through the resolver registered for `section`.
    ///
    /// An unregistered `section` is a configuration error and returns
    /// [`BuildonomyError::UnknownSection`]. A target the resolver cannot match returns `Ok(None)`:
    /// the target is recorded as an invalid link and every dependency registered for its
    /// canonical path, pending or resolved, is dropped. A match promotes the pending dependency on
    /// the target's canonical path, if any, to the resolved file.
    pub fn resolve(
        &mut self,
        section: &str,
        target: &str,
    ) -> Result<Option<ResolvedReference>, BuildonomyError> {
        let resolver = self
            .resolvers
            .get(section)
            .ok_or_else(|| BuildonomyError::UnknownSection(section.to_string()))?;
        let target = target.trim();
        let key = self.canonical_url(target);

        let Some(resolved) = resolver.resolve(self, target) else {
            let link = InvalidLink::new(section, target);
            self.report(ParseDiagnostic::InvalidLink {
                file: self.current_file_name.clone(),
                link: link.clone(),
            });
            self.invalid_links.push(link);
            if let Some(key) = key {
                self.drop_dependency(Dependency::Pending(key.clone()));
                self.drop_dependency(Dependency::Resolved(key));
            }
            return Ok(None);
        };

        if let Some(key) = key {
            self.promote_pending(&key, &resolved.file);
        }
        Ok(Some(resolved))
    }

    /// Mark `target` as seen through `section`'s resolver without producing a link. An unknown
    /// section is reported to the diagnostics sink and otherwise ignored.
    pub fn found(&mut self, section: &str, target: &str) -> Result<(), BuildonomyError> {
        let Some(resolver) = self.resolvers.get(section) else {
            self.report(ParseDiagnostic::UnknownSection {
                file: self.current_file_name.clone(),
                section: section.to_string(),
            });
            return Ok(());
        };
        resolver.found(self, target.trim())
    }

    fn drop_dependency(&mut self, dependency: Dependency) {
        let before = self.dependencies.len();
        self.dependencies.retain(|dep| dep != &dependency);
        let in_store = self
            .metas
            .remove_dependency(&self.current_file_name, &dependency);
        if in_store || before != self.dependencies.len() {
            tracing::debug!(
                "[Environment::resolve] {}: dropped broken dependency {dependency}",
                self.current_file_name
            );
        }
    }

    fn promote_pending(&mut self, key: &str, real_path: &str) {
        let pending = Dependency::Pending(key.to_string());
        // Targets outside the corpus have no file to depend on.
        if real_path.is_empty() {
            self.drop_dependency(pending);
            return;
        }
        let resolved = Dependency::Resolved(real_path.to_string());
        let mut promoted = false;
        if let Some(idx) = self.dependencies.iter().position(|dep| dep == &pending) {
            if self.dependencies.contains(&resolved) {
                self.dependencies.remove(idx);
            } else {
                self.dependencies[idx] = resolved;
            }
            promoted = true;
        }
        promoted |= self
            .metas
            .resolve_dependency(&self.current_file_name, key, real_path);
        if promoted {
            tracing::debug!(
                "[Environment::resolve] {}: promoted {key} -> {real_path}",
                self.current_file_name
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        diagnostic::{CollectingSink, ParseDiagnostic},
        error::BuildonomyError,
        metas::{Dependency, MetaEntry, MetaStore},
        reference::{ReferenceResolver, ResolvedReference},
        tests::helpers::test_environment,
        Environment,
    };
    use std::sync::Arc;
    use test_log::test;

    #[test]
    fn test_add_dependency_set_semantics() {
        let metas = MetaStore::new();
        let mut env = test_environment("guide/intro", &metas);
        env.add_dependency("setup", false).unwrap();
        env.add_dependency("/api/types", false).unwrap();
        env.add_dependency("./setup", false).unwrap();
        env.add_dependency("../guide/setup#section", false).unwrap();
        assert_eq!(
            env.get_dependencies(),
            &[
                Dependency::Resolved("guide/setup".to_string()),
                Dependency::Resolved("api/types".to_string()),
            ]
        );
    }

    #[test]
    fn test_pending_and_resolved_coexist() {
        let metas = MetaStore::new();
        let mut env = test_environment("guide/intro", &metas);
        env.add_dependency("setup", true).unwrap();
        env.add_dependency("setup", false).unwrap();
        env.add_dependency("setup", true).unwrap();
        assert_eq!(
            env.get_dependencies(),
            &[
                Dependency::Pending("guide/setup".to_string()),
                Dependency::Resolved("guide/setup".to_string()),
            ]
        );
    }

    #[test]
    fn test_add_dependency_malformed() {
        let metas = MetaStore::new();
        let mut env = test_environment("guide/intro", &metas);
        assert_eq!(
            env.add_dependency("../../../etc/passwd", false),
            Err(BuildonomyError::CanonicalUrl("../../../etc/passwd".to_string()))
        );
        assert!(env.add_dependency("", true).is_err());
        assert!(env.get_dependencies().is_empty());

        // A colon alone does not make a url external.
        env.add_dependency("faq:general", false).unwrap();
        assert_eq!(
            env.get_dependencies(),
            &[Dependency::Resolved("guide/faq:general".to_string())]
        );
    }

    #[test]
    fn test_unknown_section_is_structural() {
        let metas = MetaStore::new();
        let mut env = test_environment("guide/intro", &metas);
        let err = env.resolve("glossary", "term").unwrap_err();
        assert_eq!(err, BuildonomyError::UnknownSection("glossary".to_string()));
        assert!(err.is_structural());
        assert!(env.get_invalid_links().is_empty());
    }

    #[test]
    fn test_failed_resolution_drops_pending() {
        let metas = MetaStore::new();
        let sink = Arc::new(CollectingSink::default());
        let mut env = test_environment("guide/intro", &metas).with_diagnostics(sink.clone());
        env.add_dependency("missing", true).unwrap();
        env.add_dependency("kept", false).unwrap();
        env.publish();

        let resolved = env.resolve("doc", "missing").unwrap();
        assert!(resolved.is_none());
        assert_eq!(env.get_invalid_links().len(), 1);
        assert_eq!(env.get_invalid_links()[0].target, "missing");
        assert_eq!(
            env.get_dependencies(),
            &[Dependency::Resolved("guide/kept".to_string())]
        );
        assert_eq!(
            metas.get("guide/intro").unwrap().dependencies,
            vec![Dependency::Resolved("guide/kept".to_string())]
        );
        assert!(sink.diagnostics()[0].is_invalid_link());

        // Each failure is recorded.
        env.resolve("ref", "nowhere").unwrap();
        assert_eq!(env.get_invalid_links().len(), 2);
    }

    #[test]
    fn test_successful_resolution_promotes_pending() {
        let metas = MetaStore::new();
        let mut env = test_environment("index", &metas);
        env.add_dependency("guide/setup", true).unwrap();
        env.publish();

        // guide/setup is compiled later in the build.
        metas.set(MetaEntry::new("guide/setup", "guide/setup.html"));

        let resolved = env.resolve("doc", "guide/setup").unwrap().unwrap();
        assert_eq!(resolved.file, "guide/setup");
        assert_eq!(
            metas.get("index").unwrap().dependencies,
            vec![Dependency::Resolved("guide/setup".to_string())]
        );
        assert_eq!(
            env.get_dependencies(),
            &[Dependency::Resolved("guide/setup".to_string())]
        );
        assert!(env.get_invalid_links().is_empty());
    }

    #[test]
    fn test_promotion_matches_any_spelling() {
        let metas = MetaStore::new();
        let mut env = test_environment("guide/intro", &metas);
        env.add_dependency("./setup", true).unwrap();
        env.publish();
        metas.set(MetaEntry::new("guide/setup", "guide/setup.html"));

        assert!(env.resolve("doc", "setup").unwrap().is_some());
        assert_eq!(
            env.get_dependencies(),
            &[Dependency::Resolved("guide/setup".to_string())]
        );
        assert_eq!(
            metas.get("guide/intro").unwrap().dependencies,
            vec![Dependency::Resolved("guide/setup".to_string())]
        );
    }

    #[test]
    fn test_failure_drops_any_spelling() {
        let metas = MetaStore::new();
        let mut env = test_environment("guide/intro", &metas);
        env.add_dependency("/guide/missing", true).unwrap();
        env.publish();

        assert!(env.resolve("doc", "../guide/missing#part").unwrap().is_none());
        assert!(env.get_dependencies().is_empty());
        assert!(metas.get("guide/intro").unwrap().dependencies.is_empty());
    }

    #[test]
    fn test_failure_drops_resolved_dependency() {
        let metas = MetaStore::new();
        let mut env = test_environment("guide/intro", &metas);
        env.add_dependency("missing", false).unwrap();
        env.add_dependency("kept", false).unwrap();
        env.publish();

        assert!(env.resolve("doc", "missing").unwrap().is_none());
        assert_eq!(
            env.get_dependencies(),
            &[Dependency::Resolved("guide/kept".to_string())]
        );
        assert_eq!(
            metas.get("guide/intro").unwrap().dependencies,
            vec![Dependency::Resolved("guide/kept".to_string())]
        );
    }

    struct Redirect;

    impl ReferenceResolver for Redirect {
        fn resolve(&self, _env: &Environment, target: &str) -> Option<ResolvedReference> {
            (target == "old-name").then(|| ResolvedReference {
                file: "archive/renamed".to_string(),
                url: "/archive/renamed.html".to_string(),
                ..Default::default()
            })
        }
    }

    #[test]
    fn test_promotion_points_at_real_file() {
        let metas = MetaStore::new();
        let mut env = test_environment("index", &metas);
        env.resolvers().register("redirect", Redirect);
        env.add_dependency("old-name", true).unwrap();
        env.publish();

        env.resolve("redirect", "old-name").unwrap().unwrap();
        let dependencies = metas.get("index").unwrap().dependencies;
        assert_eq!(
            dependencies,
            vec![Dependency::Resolved("archive/renamed".to_string())]
        );
        assert!(!dependencies.contains(&Dependency::Pending("old-name".to_string())));
    }

    #[test]
    fn test_found_unknown_section_continues() {
        let metas = MetaStore::new();
        let sink = Arc::new(CollectingSink::default());
        let mut env = test_environment("index", &metas).with_diagnostics(sink.clone());
        env.found("glossary", "term").unwrap();
        assert!(matches!(
            sink.diagnostics()[0],
            ParseDiagnostic::UnknownSection { .. }
        ));
        // Compilation carries on.
        env.found("doc", "guide/setup").unwrap();
        assert_eq!(env.get_dependencies().len(), 1);
    }
}
