//! # noet-xref
//!
//! Per-document compilation state and cross-document reference resolution for corpora of
//! interlinked structured-text documents.
//!
//! ## Overview
//!
//! A build compiles every document of a corpus into a numbered, cross-referenced output tree.
//! Tokenizing the markup is someone else's job (the parser drives this crate); the hard part this
//! crate handles is keeping **per-document state** straight and resolving **references that point
//! forward** to documents not parsed yet, while keeping a corpus-wide dependency graph consistent
//! for incremental rebuilds.
//!
//! ## Architecture
//!
//! - **[`paths`]**: pure url canonicalization ([`paths::UrlResolver`]) and the [`paths::slugify`]
//!   anchor function
//! - **[`environment`]**: the per-document [`Environment`]: title numbering, link table and
//!   anonymous binding, dependency tracking, reference resolution
//! - **[`metas`]**: the corpus-wide [`metas::MetaStore`], the only state shared between documents,
//!   and its reconciliation pass and dependency graph
//! - **[`reference`]**: the [`reference::ResolverRegistry`] of named reference resolvers
//! - **[`diagnostic`]**: non-fatal diagnostics and the sinks receiving them
//! - **[`report`]**: end-of-build summary of broken references
//! - **[`config`]**: output layout settings
//!
//! ## Error Policy
//!
//! Broken references are content errors: they are recorded as
//! [`InvalidLink`](diagnostic::InvalidLink)s, reported to the diagnostics sink, and never
//! interrupt a compile pass. Configuration errors (an unregistered reference section) and
//! malformed input (a dependency path with no canonical form) return [`BuildonomyError`]
//! immediately.
//!
//! ## Concurrency
//!
//! Everything here is synchronous. An [`Environment`] belongs to one document and one thread;
//! independent documents may be compiled in parallel, in which case the shared
//! [`metas::MetaStore`] serializes writes per entry.

pub mod config;
pub mod diagnostic;
pub mod environment;
pub mod error;
pub mod metas;
pub mod paths;
pub mod reference;
pub mod report;
#[cfg(test)]
mod tests;

pub use environment::Environment;
pub use error::*;
