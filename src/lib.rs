//! # revdeps - Reverse dependency cache
//!
//! Keeps an on-disk record of "who depends on me" for every class,
//! interface and trait discovered in a set of source packages, so that
//! tooling can answer "what breaks if X changes?" without re-scanning.
//!
//! revdeps provides:
//! - A symbol model for class / interface / trait declarations
//! - Transitive expansion of declared relations and its inversion
//! - A key-value storage layer with a filesystem and an in-memory backend
//! - A cache front-end (`clear` / `set` / `get`) with a pluggable symbol factory
//! - A package discovery lifecycle that feeds the cache

pub mod symbol;
pub mod factory;
pub mod graph;
pub mod artifact;
pub mod storage;
pub mod cache;
pub mod discovery;
pub mod config;
pub mod ignore;
pub mod output;
pub mod ui;

// Re-exports for convenient access
pub use symbol::{Symbol, SymbolKind};
pub use factory::{StandardSymbolFactory, SymbolFactory};
pub use graph::{DependencyGraph, DependentsIndex};
pub use storage::{FsStore, KeyValueStore, MemoryStore};
pub use cache::{DependentsCache, SetReport};
pub use discovery::{ClassDiscovery, Package};

/// Result type alias for revdeps operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for revdeps operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unresolvable path for symbol: {0}")]
    UnresolvablePath(String),

    #[error("Unknown symbol kind: {0}")]
    UnknownKind(String),

    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
