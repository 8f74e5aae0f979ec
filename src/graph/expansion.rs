//! Transitive expansion of declared relations

use std::collections::{BTreeMap, BTreeSet};

use crate::symbol::Symbol;

/// Every declared symbol mapped to the full set of names it depends on.
///
/// Built once by [`expand`] and read-only afterwards. The declarations the
/// graph was built from are kept alongside so the inversion can hand out
/// the dependent symbols themselves.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    closure: BTreeMap<String, BTreeSet<String>>,
    symbols: BTreeMap<String, Symbol>,
}

impl DependencyGraph {
    /// Expand a set of declarations. See [`expand`].
    pub fn expand(symbols: &BTreeMap<String, Symbol>) -> Self {
        expand(symbols)
    }

    /// The transitive dependencies of a declared symbol
    pub fn dependencies(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.closure.get(name)
    }

    /// The declaration a graph entry was built from
    pub fn symbol(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.closure.contains_key(name)
    }

    /// Iterate `(name, dependencies)` in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.closure.iter().map(|(name, deps)| (name.as_str(), deps))
    }

    pub fn len(&self) -> usize {
        self.closure.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closure.is_empty()
    }

    /// Total number of `(symbol, dependency)` pairs
    pub fn edge_count(&self) -> usize {
        self.closure.values().map(BTreeSet::len).sum()
    }
}

/// Compute the transitive closure of every symbol's relations.
///
/// Names that are referenced but not declared are leaves: they appear as
/// dependencies but are not expanded further. Each walk tracks the names
/// it has visited, so cycles terminate and a symbol never lists itself.
pub fn expand(symbols: &BTreeMap<String, Symbol>) -> DependencyGraph {
    let closure = symbols
        .iter()
        .map(|(name, symbol)| (name.clone(), walk(name, symbol, symbols)))
        .collect();

    DependencyGraph {
        closure,
        symbols: symbols.clone(),
    }
}

fn walk(origin: &str, symbol: &Symbol, symbols: &BTreeMap<String, Symbol>) -> BTreeSet<String> {
    let mut visited = BTreeSet::new();
    let mut stack: Vec<&str> = symbol.relations().collect();

    while let Some(current) = stack.pop() {
        if current == origin || !visited.insert(current.to_string()) {
            continue;
        }

        if let Some(next) = symbols.get(current) {
            stack.extend(next.relations());
        }
    }

    visited
}

#[cfg(test)]
mod tests {
    use super::*;

    fn declare(symbols: Vec<Symbol>) -> BTreeMap<String, Symbol> {
        symbols
            .into_iter()
            .map(|s| (s.name().to_string(), s))
            .collect()
    }

    fn names(set: &BTreeSet<String>) -> Vec<&str> {
        set.iter().map(String::as_str).collect()
    }

    #[test]
    fn test_no_relations_maps_to_empty_sets() {
        let graph = expand(&declare(vec![
            Symbol::class("A").unwrap(),
            Symbol::interface("I").unwrap(),
        ]));

        assert_eq!(graph.len(), 2);
        assert!(graph.dependencies("A").unwrap().is_empty());
        assert!(graph.dependencies("I").unwrap().is_empty());
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_follows_parents_interfaces_and_traits() {
        // C extends B, B implements I, I extends J, C uses T, T uses U
        let graph = expand(&declare(vec![
            Symbol::class("C")
                .unwrap()
                .with_classes(["B"])
                .with_traits(["T"]),
            Symbol::class("B").unwrap().with_interfaces(["I"]),
            Symbol::interface("I").unwrap().with_interfaces(["J"]),
            Symbol::interface("J").unwrap(),
            Symbol::trait_named("T").unwrap().with_traits(["U"]),
            Symbol::trait_named("U").unwrap(),
        ]));

        assert_eq!(
            names(graph.dependencies("C").unwrap()),
            vec!["B", "I", "J", "T", "U"]
        );
        assert_eq!(names(graph.dependencies("B").unwrap()), vec!["I", "J"]);
        assert_eq!(names(graph.dependencies("T").unwrap()), vec!["U"]);
    }

    #[test]
    fn test_undeclared_names_are_leaves() {
        let graph = expand(&declare(vec![Symbol::class("A")
            .unwrap()
            .with_interfaces(["Vendor\\Countable"])]));

        assert_eq!(
            names(graph.dependencies("A").unwrap()),
            vec!["Vendor\\Countable"]
        );
        assert!(!graph.contains("Vendor\\Countable"));
    }

    #[test]
    fn test_cycles_terminate() {
        let graph = expand(&declare(vec![
            Symbol::class("A").unwrap().with_interfaces(["I"]),
            Symbol::interface("I").unwrap().with_interfaces(["J"]),
            Symbol::interface("J").unwrap().with_interfaces(["I", "A"]),
        ]));

        assert_eq!(names(graph.dependencies("A").unwrap()), vec!["I", "J"]);
        assert_eq!(names(graph.dependencies("I").unwrap()), vec!["A", "J"]);
        assert_eq!(names(graph.dependencies("J").unwrap()), vec!["A", "I"]);
    }

    #[test]
    fn test_keeps_declarations() {
        let symbols = declare(vec![Symbol::class("A").unwrap().with_abstract(true)]);
        let graph = DependencyGraph::expand(&symbols);
        assert_eq!(graph.symbol("A"), symbols.get("A"));
    }
}
