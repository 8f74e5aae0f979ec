//! Symbol name to artifact path resolution
//!
//! `Vendor\Package\Service` under root `/cache` resolves to
//! `/cache/Vendor/Package/Service.json`. Every segment is stripped of
//! characters outside `[A-Za-z0-9_]`. A directory segment that ends up
//! empty makes the name unresolvable; an empty file name is let through.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::artifact::ARTIFACT_EXTENSION;
use crate::{Error, Result};

/// Default namespace separator
pub const NAMESPACE_SEPARATOR: char = '\\';

/// Strip every character that is not an ASCII letter, digit or underscore.
pub fn normalize_segment(segment: &str) -> String {
    segment
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

/// Split a symbol name into normalized directory segments and the
/// normalized file stem.
pub fn split_key(name: &str, separator: char) -> Result<(Vec<String>, String)> {
    let mut parts: Vec<&str> = name.trim_matches(separator).split(separator).collect();
    let leaf = normalize_segment(parts.pop().unwrap_or_default());

    let mut directories = Vec::with_capacity(parts.len());
    for part in parts {
        let segment = normalize_segment(part);
        if segment.is_empty() {
            return Err(Error::UnresolvablePath(name.to_string()));
        }
        directories.push(segment);
    }

    Ok((directories, leaf))
}

/// Maps symbol names to artifact paths below a root directory.
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
    separator: char,
}

impl PathResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            separator: NAMESPACE_SEPARATOR,
        }
    }

    /// Use a different namespace separator, e.g. `.` for dotted names
    pub fn with_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    /// Resolve the artifact path for `name`, creating missing namespace
    /// directories on the way.
    ///
    /// Fails when a directory segment normalizes to nothing, when a path on
    /// the way exists but is not a directory, or when a directory cannot be
    /// created. Resolving the same name again yields the same path.
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        let (directories, leaf) = split_key(name, self.separator)?;

        let mut target = self.root.clone();
        for segment in directories {
            target.push(segment);
            if let Err(e) = ensure_directory(&target) {
                tracing::debug!("Cannot use {} for {}: {}", target.display(), name, e);
                return Err(Error::UnresolvablePath(name.to_string()));
            }
        }

        Ok(artifact_path(target, &leaf))
    }

    /// Like [`PathResolver::resolve`] but without touching the filesystem.
    pub fn locate(&self, name: &str) -> Result<PathBuf> {
        let (directories, leaf) = split_key(name, self.separator)?;
        let target = directories
            .iter()
            .fold(self.root.clone(), |path, segment| path.join(segment));
        Ok(artifact_path(target, &leaf))
    }
}

fn artifact_path(directory: PathBuf, leaf: &str) -> PathBuf {
    directory.join(format!("{leaf}.{ARTIFACT_EXTENSION}"))
}

fn ensure_directory(path: &Path) -> io::Result<()> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(io::Error::other("exists and is not a directory")),
        Err(e) if e.kind() == io::ErrorKind::NotFound => create_directory(path),
        Err(e) => Err(e),
    }
}

fn create_directory(path: &Path) -> io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o755);
    }

    match builder.create(path) {
        Ok(()) => Ok(()),
        // Another process got there first
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
        Err(e) => Err(e),
    }
}
