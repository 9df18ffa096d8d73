use super::{ReferenceResolver, ResolvedReference};
use crate::{
    environment::Environment,
    error::BuildonomyError,
    paths::{slugify, split_fragment},
};

/// Resolves `:doc:` references: the target names another document of the corpus, relative to the
/// current document (or rooted with a leading `/`), optionally followed by `#anchor`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocResolver;

impl DocResolver {
    pub const SECTION: &'static str = "doc";
}

impl ReferenceResolver for DocResolver {
    fn resolve(&self, env: &Environment, target: &str) -> Option<ResolvedReference> {
        let (_, fragment) = split_fragment(target);
        let file = env.canonical_url(target)?;
        let entry = env.metas().get(&file)?;
        Some(ResolvedReference {
            url: env.reference_url(&entry.url),
            file: entry.file,
            anchor: fragment.map(slugify).filter(|anchor| !anchor.is_empty()),
            title: entry.title,
        })
    }

    /// The referenced document becomes a dependency, pending until the store knows it.
    fn found(&self, env: &mut Environment, target: &str) -> Result<(), BuildonomyError> {
        let published = env
            .canonical_url(target)
            .is_some_and(|file| env.metas().contains(&file));
        env.add_dependency(target, !published)
    }
}
