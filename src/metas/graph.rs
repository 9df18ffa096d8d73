use petgraph::{
    graph::{DiGraph, NodeIndex},
    visit::{depth_first_search, Control, DfsEvent, Reversed},
};
use std::collections::BTreeMap;

use super::{Dependency, MetaEntry};

/// Directed graph of resolved dependencies. Edges point from a document to what it depends on.
///
/// Pending edges are left out: until promoted they name no known document.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    graph: DiGraph<String, ()>,
    index: BTreeMap<String, NodeIndex>,
}

impl DependencyGraph {
    pub fn from_entries<'a, I: IntoIterator<Item = &'a MetaEntry>>(entries: I) -> Self {
        let mut dep_graph = DependencyGraph::default();
        for entry in entries {
            let source = dep_graph.node(&entry.file);
            for dep in entry.dependencies.iter() {
                if let Dependency::Resolved(path) = dep {
                    let sink = dep_graph.node(path);
                    dep_graph.graph.update_edge(source, sink, ());
                }
            }
        }
        dep_graph
    }

    fn node(&mut self, path: &str) -> NodeIndex {
        if let Some(idx) = self.index.get(path) {
            return *idx;
        }
        let idx = self.graph.add_node(path.to_string());
        self.index.insert(path.to_string(), idx);
        idx
    }

    pub fn as_graph(&self) -> &DiGraph<String, ()> {
        &self.graph
    }

    pub fn contains(&self, path: &str) -> bool {
        self.index.contains_key(path)
    }

    /// Documents depending directly on `path`.
    pub fn direct_dependents(&self, path: &str) -> Vec<String> {
        let Some(idx) = self.index.get(path) else {
            return Vec::new();
        };
        let mut dependents: Vec<String> = self
            .graph
            .neighbors_directed(*idx, petgraph::Direction::Incoming)
            .map(|source| self.graph[source].clone())
            .collect();
        dependents.sort();
        dependents
    }

    /// Documents depending on `path` directly or through other documents, sorted, without `path`.
    pub fn dependents_of(&self, path: &str) -> Vec<String> {
        let Some(start) = self.index.get(path) else {
            return Vec::new();
        };
        let mut dependents = Vec::new();
        depth_first_search(Reversed(&self.graph), Some(*start), |event| {
            if let DfsEvent::Discover(idx, _) = event {
                if idx != *start {
                    dependents.push(self.graph[idx].clone());
                }
            }
            Control::<()>::Continue
        });
        dependents.sort();
        dependents
    }
}
