//! Shared test utilities for Environment testing

use crate::{
    config::OutputConfig, environment::Environment, metas::MetaStore, reference::ResolverRegistry,
};

/// Initialize logging for tests
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// Environment for `file_name` bound to `metas`, with default output settings and the built-in
/// resolvers.
pub fn test_environment(file_name: &str, metas: &MetaStore) -> Environment {
    init_logging();
    Environment::new(
        file_name,
        OutputConfig::default(),
        metas,
        &ResolverRegistry::create(),
    )
    .unwrap()
}
