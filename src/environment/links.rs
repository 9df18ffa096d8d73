use std::collections::{BTreeMap, VecDeque};

/// Link name of an anonymous target definition (`__ url` in the source markup).
pub const ANONYMOUS: &str = "_";

/// Link names compare case and surrounding-whitespace insensitively.
pub fn normalize_link_name(name: &str) -> String {
    name.trim().to_lowercase()
}

pub fn is_anonymous(name: &str) -> bool {
    normalize_link_name(name) == ANONYMOUS
}

/// Named link targets of one document, plus the queue binding anonymous definitions to anonymous
/// references by position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkTable {
    links: BTreeMap<String, String>,
    anonymous: VecDeque<String>,
}

impl LinkTable {
    /// Store `url` under `name`, replacing any earlier value. Returns the name the url was bound
    /// to: for the anonymous sentinel that is the next queued reference name, or the sentinel
    /// itself when the queue is empty.
    pub fn set_link(&mut self, name: &str, url: &str) -> String {
        let mut name = normalize_link_name(name);
        if name == ANONYMOUS {
            if let Some(queued) = self.anonymous.pop_front() {
                name = queued;
            }
        }
        tracing::debug!("[LinkTable::set_link] {name} -> {}", url.trim());
        self.links.insert(name.clone(), url.trim().to_string());
        name
    }

    pub fn push_anonymous(&mut self, name: &str) {
        self.anonymous.push_back(normalize_link_name(name));
    }

    pub fn reset_anonymous(&mut self) {
        self.anonymous.clear();
    }

    pub fn anonymous_pending(&self) -> usize {
        self.anonymous.len()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.links.get(&normalize_link_name(name)).map(String::as_str)
    }

    pub fn links(&self) -> &BTreeMap<String, String> {
        &self.links
    }
}
