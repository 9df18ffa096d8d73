//! Shared test utilities for integration tests.
//!
//! Import from integration test files as:
//! ```ignore
//! mod common;
//! ```

use noet_xref::{
    config::OutputConfig, metas::MetaStore, reference::ResolverRegistry, BuildonomyError,
    Environment,
};

/// Initialize tracing for tests, respecting RUST_LOG env var.
///
/// Safe to call multiple times; subsequent calls are no-ops.
#[allow(dead_code)]
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// What a markup parser reports while walking a document, in document order.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy)]
pub enum ParseEvent {
    /// Heading text with its adornment character
    Title(char, &'static str),
    Label(&'static str),
    LinkDefinition(&'static str, &'static str),
    AnonymousReference(&'static str),
    /// A `:section:`target`` role, seen and rendered in the same pass
    Reference(&'static str, &'static str),
}

/// Run one compile pass over `events` for `file_name` and publish the result.
#[allow(dead_code)]
pub fn compile(
    file_name: &str,
    events: &[ParseEvent],
    metas: &MetaStore,
    resolvers: &ResolverRegistry,
) -> Result<Environment, BuildonomyError> {
    let mut env = Environment::new(file_name, OutputConfig::default(), metas, resolvers)?;
    for event in events.iter().copied() {
        match event {
            ParseEvent::Title(letter, text) => {
                let level = env.get_level(letter)?;
                env.record_title(level, text)?;
            }
            ParseEvent::Label(name) => {
                env.add_anchor(name);
            }
            ParseEvent::LinkDefinition(name, url) => env.set_link(name, url),
            ParseEvent::AnonymousReference(name) => env.push_anonymous(name),
            ParseEvent::Reference(section, target) => {
                env.found(section, target)?;
                env.resolve(section, target)?;
            }
        }
    }
    env.publish();
    Ok(env)
}
