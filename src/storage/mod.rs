//! Storage Layer - key-value persistence for cache artifacts
//!
//! Keys are fully-qualified symbol names, values are encoded artifacts.
//! Two backends:
//! - `FsStore`: one file per key under `<root>/<namespace>/.../<Name>.json`
//! - `MemoryStore`: in-process map, for tests and dry runs
//!
//! Both normalize keys the same way (see [`path`]): a key whose namespace
//! normalizes to an empty segment is rejected by either. `FsStore` can
//! additionally fail when something on disk is in the way.

pub mod fs;
pub mod memory;
pub mod path;

pub use fs::FsStore;
pub use memory::MemoryStore;
pub use path::{normalize_segment, PathResolver, NAMESPACE_SEPARATOR};

use crate::Result;

/// Minimal key-value contract the dependents cache is written against.
pub trait KeyValueStore {
    /// Store `value` under `key`, replacing any previous value.
    ///
    /// Fails with [`crate::Error::UnresolvablePath`] when the key cannot be
    /// mapped to a storage location.
    fn put(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Fetch the value for `key`. Unknown and unresolvable keys are `None`.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Remove every stored value, best-effort. Returns how many entries
    /// were removed.
    fn delete_all(&self) -> usize;
}
