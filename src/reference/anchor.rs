use super::{ReferenceResolver, ResolvedReference};
use crate::{environment::Environment, paths::slugify};

/// Resolves `:ref:` references: the target names a title or explicit label, anywhere in the corpus.
///
/// Labels of the current document win over published ones, since the current document's entry in
/// the store may be stale until it is published again.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnchorResolver;

impl AnchorResolver {
    pub const SECTION: &'static str = "ref";
}

impl ReferenceResolver for AnchorResolver {
    fn resolve(&self, env: &Environment, target: &str) -> Option<ResolvedReference> {
        let anchor = slugify(target);
        if anchor.is_empty() {
            return None;
        }
        if let Some(title) = env.local_anchor_title(&anchor) {
            return Some(ResolvedReference {
                file: env.file_name().to_string(),
                url: String::new(),
                anchor: Some(anchor),
                title: Some(title),
            });
        }
        let (entry, title) = env.metas().find_anchor(&anchor)?;
        Some(ResolvedReference {
            url: env.reference_url(&entry.url),
            file: entry.file,
            anchor: Some(anchor),
            title: Some(title),
        })
    }
}
