//! Dependents cache - the `clear` / `set` / `get` front-end
//!
//! `set` expands the declared symbols, inverts the result and stores one
//! artifact per symbol. `get` reads a single artifact back through the
//! symbol factory. Storage problems never abort a run: unwritable entries
//! are skipped and reported, unknown entries read as empty.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use serde::Serialize;

use crate::artifact;
use crate::factory::{StandardSymbolFactory, SymbolFactory};
use crate::graph::{expand, generate};
use crate::storage::{FsStore, KeyValueStore};
use crate::symbol::Symbol;
use crate::{Error, Result};

/// Where the cache lives when no root is configured: `source/` next to the
/// crate manifest.
pub fn default_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("source")
}

/// A symbol `set` could not persist
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedSymbol {
    pub name: String,
    pub reason: String,
}

/// Outcome of [`DependentsCache::set`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SetReport {
    /// Symbols whose artifact was written
    pub written: Vec<String>,
    /// Symbols that were skipped, with the reason
    pub skipped: Vec<SkippedSymbol>,
}

impl SetReport {
    /// True when nothing was skipped
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }

    pub fn skipped_names(&self) -> Vec<&str> {
        self.skipped.iter().map(|s| s.name.as_str()).collect()
    }
}

/// Per-symbol reverse dependency cache over a [`KeyValueStore`].
pub struct DependentsCache<S: KeyValueStore = FsStore> {
    store: S,
    factory: OnceLock<Arc<dyn SymbolFactory>>,
}

impl DependentsCache<FsStore> {
    /// Open a filesystem cache. An empty `root` means [`default_root`].
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let root = if root.as_os_str().is_empty() {
            default_root()
        } else {
            root
        };
        Ok(Self::with_store(FsStore::open(root)?))
    }
}

impl<S: KeyValueStore> DependentsCache<S> {
    pub fn with_store(store: S) -> Self {
        Self {
            store,
            factory: OnceLock::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Remove every artifact. Never fails; returns `self` for chaining.
    pub fn clear(&self) -> &Self {
        let removed = self.store.delete_all();
        tracing::debug!("Cleared {} cached artifacts", removed);
        self
    }

    /// Compute dependents for `symbols` and store one artifact per symbol,
    /// overwriting existing ones. Symbols nothing depends on get an empty
    /// artifact.
    pub fn set(&self, symbols: &BTreeMap<String, Symbol>) -> SetReport {
        let graph = expand(symbols);
        let index = generate(&graph);
        tracing::debug!(
            "Expanded {} symbols into {} dependency edges",
            graph.len(),
            graph.edge_count()
        );

        let mut report = SetReport::default();
        for (name, dependents) in index.iter() {
            match self.write(name, dependents) {
                Ok(()) => report.written.push(name.to_string()),
                Err(e) => {
                    match &e {
                        Error::UnresolvablePath(_) => {
                            tracing::debug!("Skipping {}: {}", name, e)
                        }
                        _ => tracing::warn!("Failed to cache dependents of {}: {}", name, e),
                    }
                    report.skipped.push(SkippedSymbol {
                        name: name.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            "Cached dependents for {} symbols ({} skipped)",
            report.written.len(),
            report.skipped.len()
        );
        report
    }

    /// The symbols that depend on `name`.
    ///
    /// Empty when nothing was recorded or the name cannot be mapped to an
    /// artifact. Fails only when an artifact exists but cannot be read or is
    /// not a JSON array.
    pub fn get(&self, name: &str) -> Result<Vec<Symbol>> {
        let Some(bytes) = self.store.get(name)? else {
            return Ok(Vec::new());
        };
        let factory = self.source_factory();
        artifact::decode(&bytes, factory.as_ref())
    }

    /// The factory used to rebuild symbols; a [`StandardSymbolFactory`]
    /// is created on first use when none was set.
    pub fn source_factory(&self) -> Arc<dyn SymbolFactory> {
        Arc::clone(
            self.factory
                .get_or_init(|| Arc::new(StandardSymbolFactory::new())),
        )
    }

    pub fn set_source_factory(&mut self, factory: Arc<dyn SymbolFactory>) -> &mut Self {
        self.factory = OnceLock::from(factory);
        self
    }

    fn write(&self, name: &str, dependents: &BTreeSet<Symbol>) -> Result<()> {
        let bytes = artifact::encode(dependents)?;
        self.store.put(name, &bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::symbol::SymbolKind;
    use std::fs;
    use tempfile::TempDir;

    fn declare(symbols: Vec<Symbol>) -> BTreeMap<String, Symbol> {
        symbols
            .into_iter()
            .map(|s| (s.name().to_string(), s))
            .collect()
    }

    #[test]
    fn test_abstract_class_and_interface() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let cache = DependentsCache::open(root).unwrap();

        let a = Symbol::class("A\\A\\A")
            .unwrap()
            .with_abstract(true)
            .with_interfaces(["A\\A\\I"]);
        let i = Symbol::interface("A\\A\\I").unwrap();
        let report = cache.set(&declare(vec![a.clone(), i]));

        assert!(report.is_complete());
        assert_eq!(report.written, vec!["A\\A\\A", "A\\A\\I"]);
        assert!(root.join("A/A/I.json").is_file());
        assert!(root.join("A/A/A.json").is_file());

        assert_eq!(cache.get("A\\A\\I").unwrap(), vec![a]);
        assert!(cache.get("A\\A\\A").unwrap().is_empty());
    }

    #[test]
    fn test_clear_empties_root() {
        let dir = TempDir::new().unwrap();
        let cache = DependentsCache::open(dir.path()).unwrap();

        cache.set(&declare(vec![
            Symbol::class("A\\A\\A").unwrap().with_interfaces(["A\\B\\I"]),
            Symbol::interface("A\\B\\I").unwrap(),
        ]));
        assert!(dir.path().join("A").exists());

        cache.clear();
        assert!(dir.path().is_dir());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
        assert!(cache.get("A\\B\\I").unwrap().is_empty());
    }

    #[test]
    fn test_clear_chains_into_set() {
        let cache = DependentsCache::with_store(MemoryStore::new());
        cache.set(&declare(vec![Symbol::class("Old\\Thing").unwrap()]));

        let report = cache
            .clear()
            .set(&declare(vec![Symbol::class("New\\Thing").unwrap()]));

        assert_eq!(report.written, vec!["New\\Thing"]);
        assert_eq!(cache.store().keys(), vec!["New/Thing".to_string()]);
    }

    #[test]
    fn test_get_unknown_symbol() {
        let dir = TempDir::new().unwrap();
        let cache = DependentsCache::open(dir.path()).unwrap();
        assert!(cache.get("Never\\Written").unwrap().is_empty());
        assert!(cache.get("%\\Broken").unwrap().is_empty());
    }

    #[test]
    fn test_file_in_the_way_is_skipped() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("B"), "Source File").unwrap();
        let cache = DependentsCache::open(dir.path()).unwrap();

        let report = cache.set(&declare(vec![
            Symbol::class("B\\B").unwrap().with_interfaces(["B\\I"]),
            Symbol::interface("B\\I").unwrap(),
            Symbol::class("C\\C").unwrap().with_interfaces(["B\\I"]),
        ]));

        assert_eq!(report.skipped_names(), vec!["B\\B", "B\\I"]);
        assert_eq!(report.written, vec!["C\\C"]);
        assert!(!dir.path().join("B").is_dir());
        assert!(dir.path().join("C/C.json").is_file());
        assert!(cache.get("B\\I").unwrap().is_empty());
    }

    #[test]
    fn test_empty_leaf_is_stored_and_cleared() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let cache = DependentsCache::open(root).unwrap();

        let odd = Symbol::class("A\\%").unwrap().with_interfaces(["A\\I"]);
        let report = cache.set(&declare(vec![
            odd.clone(),
            Symbol::interface("A\\I").unwrap(),
        ]));

        assert!(report.is_complete());
        assert_eq!(report.written, vec!["A\\%", "A\\I"]);
        assert!(root.join("A").join(".json").is_file());
        assert_eq!(cache.get("A\\I").unwrap(), vec![odd]);

        cache.clear();
        assert_eq!(fs::read_dir(root).unwrap().count(), 0);
    }

    #[test]
    fn test_failed_write_is_skipped_and_siblings_written() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("A").join("X.json")).unwrap();
        let cache = DependentsCache::open(root).unwrap();

        let report = cache.set(&declare(vec![
            Symbol::class("A\\X").unwrap().with_interfaces(["A\\I"]),
            Symbol::interface("A\\I").unwrap(),
        ]));

        assert_eq!(report.skipped_names(), vec!["A\\X"]);
        assert_eq!(report.written, vec!["A\\I"]);
        assert!(root.join("A/X.json").is_dir());
        assert!(!root.join("A/X.json.tmp").exists());
        assert_eq!(cache.get("A\\I").unwrap().len(), 1);
    }

    #[test]
    fn test_special_character_namespace_is_skipped() {
        let dir = TempDir::new().unwrap();
        let cache = DependentsCache::open(dir.path()).unwrap();

        let report = cache.set(&declare(vec![
            Symbol::class("%\\B").unwrap().with_interfaces(["%\\I"]),
            Symbol::interface("%\\I").unwrap(),
            Symbol::class("Ok\\B").unwrap().with_interfaces(["Ok\\I"]),
            Symbol::interface("Ok\\I").unwrap(),
        ]));

        assert_eq!(report.skipped_names(), vec!["%\\B", "%\\I"]);
        assert!(!dir.path().join("%").exists());
        assert!(dir.path().join("Ok/I.json").is_file());
        assert!(dir.path().join("Ok/B.json").is_file());
        assert_eq!(cache.get("Ok\\I").unwrap().len(), 1);
    }

    #[test]
    fn test_overlapping_namespace_prefixes() {
        let dir = TempDir::new().unwrap();
        let cache = DependentsCache::open(dir.path()).unwrap();

        let prefixed = Symbol::class("Prefix\\For\\A\\A\\A")
            .unwrap()
            .with_interfaces(["Prefix\\For\\A\\B\\A"]);
        let plain = Symbol::class("A\\A\\A")
            .unwrap()
            .with_interfaces(["A\\B\\A"]);
        cache.set(&declare(vec![
            prefixed.clone(),
            Symbol::interface("Prefix\\For\\A\\B\\A").unwrap(),
            plain.clone(),
            Symbol::interface("A\\B\\A").unwrap(),
        ]));

        assert!(dir.path().join("Prefix/For/A/B/A.json").is_file());
        assert!(dir.path().join("A/B/A.json").is_file());
        assert_eq!(cache.get("Prefix\\For\\A\\B\\A").unwrap(), vec![prefixed]);
        assert_eq!(cache.get("A\\B\\A").unwrap(), vec![plain]);
    }

    #[test]
    fn test_round_trip_matches_generated_index() {
        let symbols = declare(vec![
            Symbol::class("App\\Mailer")
                .unwrap()
                .with_classes(["App\\Base"])
                .with_traits(["App\\Logs"]),
            Symbol::class("App\\Base")
                .unwrap()
                .with_abstract(true)
                .with_interfaces(["App\\Contract"]),
            Symbol::interface("App\\Contract").unwrap(),
            Symbol::trait_named("App\\Logs").unwrap().with_traits(["App\\Format"]),
            Symbol::trait_named("App\\Format").unwrap(),
        ]);

        let dir = TempDir::new().unwrap();
        let cache = DependentsCache::open(dir.path()).unwrap();
        cache.set(&symbols);

        let index = generate(&expand(&symbols));
        for (name, dependents) in index.iter() {
            let expected: Vec<Symbol> = dependents.iter().cloned().collect();
            assert_eq!(cache.get(name).unwrap(), expected, "dependents of {name}");
        }
    }

    #[test]
    fn test_set_overwrites_previous_artifacts() {
        let cache = DependentsCache::with_store(MemoryStore::new());
        cache.set(&declare(vec![
            Symbol::class("A").unwrap().with_interfaces(["I"]),
            Symbol::interface("I").unwrap(),
        ]));
        assert_eq!(cache.get("I").unwrap().len(), 1);

        cache.set(&declare(vec![Symbol::interface("I").unwrap()]));
        assert!(cache.get("I").unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_artifact_is_an_error() {
        let dir = TempDir::new().unwrap();
        let cache = DependentsCache::open(dir.path()).unwrap();
        fs::write(dir.path().join("Broken.json"), "not json").unwrap();

        assert!(cache.get("Broken").is_err());
    }

    struct NoTraitsFactory;

    impl SymbolFactory for NoTraitsFactory {
        fn create(&self, kind: &str, name: &str) -> Result<Symbol> {
            match kind.parse::<SymbolKind>()? {
                SymbolKind::Trait => Err(Error::UnknownKind(kind.to_string())),
                kind => Symbol::new(kind, name),
            }
        }
    }

    #[test]
    fn test_source_factory_lazy_default_and_override() {
        let mut cache = DependentsCache::with_store(MemoryStore::new());

        let first = cache.source_factory();
        assert!(Arc::ptr_eq(&first, &cache.source_factory()));

        let custom: Arc<dyn SymbolFactory> = Arc::new(NoTraitsFactory);
        assert!(!Arc::ptr_eq(&custom, &cache.source_factory()));
        cache.set_source_factory(Arc::clone(&custom));
        assert!(Arc::ptr_eq(&custom, &cache.source_factory()));

        cache.set(&declare(vec![
            Symbol::class("App\\User").unwrap().with_traits(["App\\Logs"]),
            Symbol::trait_named("App\\Audit").unwrap().with_traits(["App\\Logs"]),
            Symbol::trait_named("App\\Logs").unwrap(),
        ]));

        let dependents = cache.get("App\\Logs").unwrap();
        assert_eq!(dependents.len(), 1);
        assert_eq!(dependents[0].name(), "App\\User");
    }

    #[test]
    fn test_empty_root_uses_default() {
        assert!(default_root().ends_with("source"));
    }
}
