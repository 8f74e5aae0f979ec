//! Package manifest reading
//!
//! Only the `autoload` section of `composer.json` matters here: `psr-0` and
//! `psr-4` map a namespace prefix to one or more source directories.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{Error, Result};

/// Manifest file looked up at the root of every package
pub const MANIFEST_FILE: &str = "composer.json";

/// Autoloading standard a source directory was declared under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoloadStandard {
    /// Directory layout spells the full namespace
    Psr0,
    /// Directory maps onto the declared namespace prefix
    Psr4,
}

impl AutoloadStandard {
    pub fn as_str(&self) -> &'static str {
        match self {
            AutoloadStandard::Psr0 => "psr-0",
            AutoloadStandard::Psr4 => "psr-4",
        }
    }
}

/// A source directory to scan, and the namespace its symbols must live in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoloadRoot {
    pub standard: AutoloadStandard,
    /// Empty for PSR-0, the trimmed prefix for PSR-4
    pub namespace: String,
    pub directory: PathBuf,
}

#[derive(Debug, Deserialize)]
struct Manifest {
    autoload: Option<Autoload>,
}

#[derive(Debug, Default, Deserialize)]
struct Autoload {
    #[serde(rename = "psr-0", default)]
    psr0: BTreeMap<String, Directories>,
    #[serde(rename = "psr-4", default)]
    psr4: BTreeMap<String, Directories>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Directories {
    One(String),
    Many(Vec<String>),
}

impl Directories {
    fn into_vec(self) -> Vec<String> {
        match self {
            Directories::One(dir) => vec![dir],
            Directories::Many(dirs) => dirs,
        }
    }
}

/// Read the autoload roots of the package at `package_root`.
///
/// A package without a manifest, or whose manifest has no `autoload`
/// section, has no roots. Declared directories that do not exist are
/// dropped. A manifest that is not valid JSON is an error.
pub fn autoload_roots(package_root: &Path) -> Result<Vec<AutoloadRoot>> {
    let manifest_path = package_root.join(MANIFEST_FILE);
    if !manifest_path.is_file() {
        return Ok(Vec::new());
    }

    let contents = fs::read_to_string(&manifest_path)?;
    let manifest: Manifest = serde_json::from_str(&contents)
        .map_err(|e| Error::Manifest(format!("{}: {}", manifest_path.display(), e)))?;

    let Some(autoload) = manifest.autoload else {
        return Ok(Vec::new());
    };

    let mut roots = Vec::new();
    let standards = [
        (AutoloadStandard::Psr0, autoload.psr0),
        (AutoloadStandard::Psr4, autoload.psr4),
    ];

    for (standard, entries) in standards {
        for (prefix, directories) in entries {
            let namespace = match standard {
                AutoloadStandard::Psr0 => String::new(),
                AutoloadStandard::Psr4 => prefix.trim_matches('\\').to_string(),
            };

            for dir in directories.into_vec() {
                let directory = package_root.join(&dir);
                if !directory.exists() {
                    tracing::debug!(
                        "Skipping missing {} directory {}",
                        standard.as_str(),
                        directory.display()
                    );
                    continue;
                }

                roots.push(AutoloadRoot {
                    standard,
                    namespace: namespace.clone(),
                    directory,
                });
            }
        }
    }

    Ok(roots)
}
