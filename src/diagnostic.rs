//! Diagnostic types for non-fatal issues found while compiling a document.
//!
//! Diagnostics never change the control flow of an [`Environment`](crate::environment::Environment):
//! they are handed to a [`DiagnosticSink`] and compilation continues.

use parking_lot::Mutex;

/// A reference whose target could not be resolved by its section's resolver.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct InvalidLink {
    /// The raw target string, as written in the source document.
    pub target: String,
    /// Section (resolver name) the reference was resolved through.
    pub section: String,
}

impl InvalidLink {
    pub fn new(section: impl Into<String>, target: impl Into<String>) -> Self {
        InvalidLink {
            target: target.into(),
            section: section.into(),
        }
    }
}

impl std::fmt::Display for InvalidLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, ":{}:`{}`", self.section, self.target)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParseDiagnostic {
    /// A reference that no resolver could match. Reported in the build summary.
    InvalidLink {
        /// Canonical name of the document holding the reference
        file: String,
        link: InvalidLink,
    },

    /// A `found` call for a section that has no registered resolver
    UnknownSection { file: String, section: String },

    /// A warning message about the document (e.g. anonymous link without a pending reference)
    Warning(String),

    /// An informational message
    Info(String),
}

impl ParseDiagnostic {
    pub fn warning(message: impl Into<String>) -> Self {
        Self::Warning(message.into())
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::Info(message.into())
    }

    pub fn is_invalid_link(&self) -> bool {
        matches!(self, Self::InvalidLink { .. })
    }
}

impl std::fmt::Display for ParseDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLink { file, link } => write!(f, "Invalid link in {file}: {link}"),
            Self::UnknownSection { file, section } => {
                write!(f, "Unknown reference section '{section}' in {file}")
            }
            Self::Warning(msg) => write!(f, "Warning: {msg}"),
            Self::Info(msg) => write!(f, "Info: {msg}"),
        }
    }
}

/// Receiver of [`ParseDiagnostic`]s. Shared by every environment of a build.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, diagnostic: ParseDiagnostic);
}

/// Default sink: forwards diagnostics to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: ParseDiagnostic) {
        match diagnostic {
            ParseDiagnostic::Info(_) => tracing::info!("{diagnostic}"),
            _ => tracing::warn!("{diagnostic}"),
        }
    }
}

/// Sink that keeps every diagnostic, for build reports and tests.
#[derive(Debug, Default)]
pub struct CollectingSink(Mutex<Vec<ParseDiagnostic>>);

impl CollectingSink {
    pub fn diagnostics(&self) -> Vec<ParseDiagnostic> {
        self.0.lock().clone()
    }

    pub fn take(&self) -> Vec<ParseDiagnostic> {
        std::mem::take(&mut *self.0.lock())
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&self, diagnostic: ParseDiagnostic) {
        tracing::debug!("[CollectingSink] {diagnostic}");
        self.0.lock().push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_diagnostic_display() {
        let diagnostic = ParseDiagnostic::InvalidLink {
            file: "guide/intro".to_string(),
            link: InvalidLink::new("doc", "missing"),
        };
        assert!(diagnostic.is_invalid_link());
        assert_eq!(
            diagnostic.to_string(),
            "Invalid link in guide/intro: :doc:`missing`"
        );
        assert_eq!(ParseDiagnostic::warning("x").to_string(), "Warning: x");
    }

    #[test]
    fn test_collecting_sink() {
        let sink = CollectingSink::default();
        sink.report(ParseDiagnostic::info("one"));
        sink.report(ParseDiagnostic::warning("two"));
        assert_eq!(sink.diagnostics().len(), 2);
        assert_eq!(sink.take().len(), 2);
        assert!(sink.diagnostics().is_empty());
    }
}
