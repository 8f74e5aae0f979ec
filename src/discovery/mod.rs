//! Class discovery
//!
//! Collects the symbols declared by a set of packages and, once every
//! package has been seen, rebuilds the dependents cache from scratch.

pub mod manifest;
pub mod scanner;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub use manifest::{autoload_roots, AutoloadRoot, AutoloadStandard, MANIFEST_FILE};
pub use scanner::{scan_source, DeclarationScanner, SourceDiscovery};

use crate::cache::{DependentsCache, SetReport};
use crate::{Result, Symbol};

/// A package to discover symbols in: a directory holding a manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub name: String,
    pub path: PathBuf,
}

impl Package {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// A package named after its directory
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { name, path }
    }
}

pub struct ClassDiscovery {
    cache_root: PathBuf,
    scanner: Box<dyn SourceDiscovery>,
    symbols: BTreeMap<String, Symbol>,
}

impl ClassDiscovery {
    pub fn new(cache_root: impl Into<PathBuf>) -> Self {
        Self::with_scanner(cache_root, Box::new(DeclarationScanner::new()))
    }

    pub fn with_scanner(cache_root: impl Into<PathBuf>, scanner: Box<dyn SourceDiscovery>) -> Self {
        Self {
            cache_root: cache_root.into(),
            scanner,
            symbols: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        "Class discovery"
    }

    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    /// Symbols collected so far
    pub fn symbols(&self) -> &BTreeMap<String, Symbol> {
        &self.symbols
    }

    /// Collect the symbols declared by `package`.
    ///
    /// The first declaration of a name wins, across packages as well as
    /// within one. A package whose manifest cannot be read, or a directory
    /// that cannot be scanned, is logged and contributes nothing. Returns
    /// the number of new symbols.
    pub fn discover(&mut self, package: &Package) -> usize {
        let roots = match autoload_roots(&package.path) {
            Ok(roots) => roots,
            Err(e) => {
                tracing::warn!("Skipping package {}: {}", package.name, e);
                return 0;
            }
        };

        let mut added = 0;
        for root in roots {
            let found = match self.scanner.discover(&root.namespace, &root.directory) {
                Ok(found) => found,
                Err(e) => {
                    tracing::warn!(
                        "Skipping {} in package {}: {}",
                        root.directory.display(),
                        package.name,
                        e
                    );
                    continue;
                }
            };

            for (name, symbol) in found {
                if self.symbols.contains_key(&name) {
                    tracing::debug!("{} already declared, ignoring copy in {}", name, package.name);
                    continue;
                }
                self.symbols.insert(name, symbol);
                added += 1;
            }
        }

        tracing::debug!("Discovered {} symbols in package {}", added, package.name);
        added
    }

    /// Replace the cache contents with the dependents of everything
    /// discovered.
    pub fn complete(&self) -> Result<SetReport> {
        let cache = DependentsCache::open(&self.cache_root)?;
        Ok(cache.clear().set(&self.symbols))
    }
}
