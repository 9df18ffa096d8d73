use std::{collections::BTreeMap, fmt};

use crate::{diagnostic::InvalidLink, environment::Environment, metas::ReconcileReport};

/// End-of-build summary of broken references, grouped by document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    invalid_links: BTreeMap<String, Vec<InvalidLink>>,
    unresolved_dependencies: BTreeMap<String, Vec<String>>,
}

impl BuildReport {
    /// Collect the invalid links of a finished compile pass.
    pub fn record(&mut self, env: &Environment) {
        let links = env.get_invalid_links();
        if links.is_empty() {
            return;
        }
        self.invalid_links
            .entry(env.file_name().to_string())
            .or_default()
            .extend(links.iter().cloned());
    }

    /// Collect dependencies that stayed pending after reconciliation.
    pub fn record_reconcile(&mut self, report: &ReconcileReport) {
        for (file, key) in report.still_pending.iter() {
            self.unresolved_dependencies
                .entry(file.clone())
                .or_default()
                .push(key.clone());
        }
    }

    pub fn invalid_links(&self) -> &BTreeMap<String, Vec<InvalidLink>> {
        &self.invalid_links
    }

    pub fn total_invalid_links(&self) -> usize {
        self.invalid_links.values().map(Vec::len).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.invalid_links.is_empty() && self.unresolved_dependencies.is_empty()
    }
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_clean() {
            return writeln!(f, "All references resolved.");
        }
        if !self.invalid_links.is_empty() {
            writeln!(
                f,
                "{} invalid link(s) in {} document(s):",
                self.total_invalid_links(),
                self.invalid_links.len()
            )?;
            for (file, links) in self.invalid_links.iter() {
                writeln!(f, "  {file}")?;
                for link in links {
                    writeln!(f, "    {link}")?;
                }
            }
        }
        if !self.unresolved_dependencies.is_empty() {
            writeln!(f, "Unresolved dependencies:")?;
            for (file, keys) in self.unresolved_dependencies.iter() {
                writeln!(f, "  {file} -> {}", keys.join(", "))?;
            }
        }
        Ok(())
    }
}
