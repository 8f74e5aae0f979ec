//! Filesystem-backed store

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::path::PathResolver;
use super::KeyValueStore;
use crate::artifact::ARTIFACT_EXTENSION;
use crate::{Error, Result};

/// One artifact file per key below a root directory.
///
/// The store owns everything below its root; nothing else should write
/// there. There is no locking: concurrent writers must be serialized by the
/// caller.
#[derive(Debug, Clone)]
pub struct FsStore {
    resolver: PathResolver,
}

impl FsStore {
    /// Open a store rooted at `root`, creating the root if needed
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self {
            resolver: PathResolver::new(root),
        })
    }

    /// Use a different namespace separator for keys
    pub fn with_separator(mut self, separator: char) -> Self {
        self.resolver = self.resolver.with_separator(separator);
        self
    }

    pub fn root(&self) -> &Path {
        self.resolver.root()
    }
}

impl KeyValueStore for FsStore {
    /// Writes to a sibling temp file first and renames it into place, so a
    /// failed write never leaves a truncated artifact behind.
    fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        let path = self.resolver.resolve(key)?;
        let tmp = temp_path(&path);

        if let Err(e) = fs::write(&tmp, value).and_then(|()| fs::rename(&tmp, &path)) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }

        tracing::debug!("Wrote {} ({} bytes)", path.display(), value.len());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = match self.resolver.locate(key) {
            Ok(path) => path,
            Err(Error::UnresolvablePath(_)) => return Ok(None),
            Err(e) => return Err(e),
        };

        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory) => {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Depth-first: children go before their parents. Artifact files and
    /// directories are removed, symlinks are unlinked rather than followed,
    /// anything else is left in place (and with it its directory). Failures
    /// are logged and skipped.
    fn delete_all(&self) -> usize {
        let mut removed = 0;

        let walker = WalkDir::new(self.root())
            .min_depth(1)
            .follow_links(false)
            .contents_first(true);

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::debug!("Skipping unreadable cache entry: {}", e);
                    continue;
                }
            };
            let path = entry.path();

            let outcome = if entry.path_is_symlink() {
                if !path.is_dir() && !is_artifact(path) {
                    continue;
                }
                fs::remove_file(path)
            } else if entry.file_type().is_dir() {
                fs::remove_dir(path)
            } else if is_artifact(path) {
                fs::remove_file(path).map(|()| removed += 1)
            } else {
                continue;
            };

            if let Err(e) = outcome {
                tracing::debug!("Could not remove {}: {}", path.display(), e);
            }
        }

        removed
    }
}

const TEMP_SUFFIX: &str = ".tmp";

fn temp_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(TEMP_SUFFIX);
    PathBuf::from(os)
}

/// Artifacts, and temp files a crashed write may have left behind
fn is_artifact(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
        return false;
    };
    let name = name.strip_suffix(TEMP_SUFFIX).unwrap_or(name);
    // `.json` itself counts: it is what a name with an empty leaf maps to
    name.strip_suffix(ARTIFACT_EXTENSION)
        .is_some_and(|stem| stem.ends_with('.'))
}
