//! Inversion of the dependency graph into per-symbol dependents

use std::collections::{BTreeMap, BTreeSet};

use super::expansion::DependencyGraph;
use crate::symbol::Symbol;

/// Each symbol name mapped to the symbols that depend on it.
///
/// Every declared symbol has an entry, even when nothing depends on it, so
/// that persisting the index overwrites stale dependents. Undeclared names
/// that something depends on get an entry too.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependentsIndex {
    entries: BTreeMap<String, BTreeSet<Symbol>>,
}

impl DependentsIndex {
    /// Invert a dependency graph. See [`generate`].
    pub fn generate(graph: &DependencyGraph) -> Self {
        generate(graph)
    }

    pub fn dependents(&self, name: &str) -> Option<&BTreeSet<Symbol>> {
        self.entries.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<Symbol>)> {
        self.entries.iter().map(|(name, deps)| (name.as_str(), deps))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for DependentsIndex {
    type Item = (String, BTreeSet<Symbol>);
    type IntoIter = std::collections::btree_map::IntoIter<String, BTreeSet<Symbol>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// For every `(symbol, dependency)` pair of the graph, record `symbol` as a
/// dependent of `dependency`.
pub fn generate(graph: &DependencyGraph) -> DependentsIndex {
    let mut entries: BTreeMap<String, BTreeSet<Symbol>> = BTreeMap::new();

    for (name, dependencies) in graph.iter() {
        entries.entry(name.to_string()).or_default();

        let Some(symbol) = graph.symbol(name) else {
            continue;
        };

        for dependency in dependencies {
            entries
                .entry(dependency.clone())
                .or_default()
                .insert(symbol.clone());
        }
    }

    DependentsIndex { entries }
}
