use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::storage::NAMESPACE_SEPARATOR;

/// Project settings read from `revdeps.toml`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RevdepsConfig {
    /// Directory holding the cached artifacts
    pub cache_root: Option<String>,
    /// Namespace separator used to map names onto paths
    pub separator: Option<char>,
    /// Extra gitignore-style patterns skipped during discovery
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
}

impl RevdepsConfig {
    pub fn separator(&self) -> char {
        self.separator.unwrap_or(NAMESPACE_SEPARATOR)
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("revdeps.toml")
}

pub fn default_cache_root_in(base: &Path) -> PathBuf {
    base.join(".revdeps").join("cache")
}

/// Directory a config file's relative paths are resolved against
pub fn config_base_dir(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf()
}

/// The cache root a config names, resolved against `base`; the default
/// cache location under `base` when it names none.
pub fn resolve_cache_root(config: &RevdepsConfig, base: &Path) -> PathBuf {
    match &config.cache_root {
        Some(root) => base.join(root),
        None => default_cache_root_in(base),
    }
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<RevdepsConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: RevdepsConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &RevdepsConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_cache_root(cache_root: &Path) -> anyhow::Result<()> {
    if !cache_root.as_os_str().is_empty() && !cache_root.exists() {
        std::fs::create_dir_all(cache_root)?;
    }
    Ok(())
}

pub fn ensure_gitignore(project_root: &Path) -> anyhow::Result<()> {
    let gitignore_path = project_root.join(".gitignore");
    let entry = ".revdeps/";

    let mut content = String::new();
    if gitignore_path.exists() {
        content = std::fs::read_to_string(&gitignore_path)?;
        if content.lines().any(|line| line.trim() == entry) {
            return Ok(());
        }
        if !content.is_empty() && !content.ends_with('\n') {
            content.push('\n');
        }
    }
    content.push_str(entry);
    content.push('\n');
    std::fs::write(&gitignore_path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_config() {
        let dir = TempDir::new().unwrap();
        assert!(load_config(Some(&dir.path().join("revdeps.toml"))).unwrap().is_none());
    }

    #[test]
    fn test_write_and_load_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("revdeps.toml");
        let config = RevdepsConfig {
            cache_root: Some("var/revdeps".to_string()),
            separator: Some('.'),
            exclude: vec!["tests/".to_string()],
        };

        write_config(&path, &config, false).unwrap();
        assert!(write_config(&path, &config, false).is_err());
        write_config(&path, &config, true).unwrap();

        let loaded = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(loaded.cache_root.as_deref(), Some("var/revdeps"));
        assert_eq!(loaded.separator(), '.');
        assert_eq!(loaded.exclude, vec!["tests/".to_string()]);
    }

    #[test]
    fn test_default_separator() {
        let config: RevdepsConfig = toml::from_str("").unwrap();
        assert_eq!(config.separator(), '\\');
        assert!(config.exclude.is_empty());
    }

    #[test]
    fn test_ensure_gitignore_is_idempotent() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".gitignore"), "target/").unwrap();

        ensure_gitignore(dir.path()).unwrap();
        ensure_gitignore(dir.path()).unwrap();

        let contents = std::fs::read_to_string(dir.path().join(".gitignore")).unwrap();
        assert_eq!(contents, "target/\n.revdeps/\n");
    }

    #[test]
    fn test_cache_root_is_relative_to_config_dir() {
        let config_path = Path::new("sub").join("revdeps.toml");
        let base = config_base_dir(&config_path);
        assert_eq!(base, Path::new("sub"));
        assert_eq!(config_base_dir(Path::new("revdeps.toml")), Path::new("."));

        let config = RevdepsConfig {
            cache_root: Some(".revdeps/cache".to_string()),
            ..Default::default()
        };
        assert_eq!(
            resolve_cache_root(&config, &base),
            Path::new("sub").join(".revdeps/cache")
        );
        assert_eq!(
            resolve_cache_root(&RevdepsConfig::default(), &base),
            default_cache_root_in(Path::new("sub"))
        );

        let absolute = std::env::temp_dir().join("revdeps-cache");
        let config = RevdepsConfig {
            cache_root: Some(absolute.display().to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_cache_root(&config, &base), absolute);
    }

    #[test]
    fn test_ensure_cache_root() {
        let dir = TempDir::new().unwrap();
        let root = default_cache_root_in(dir.path());
        ensure_cache_root(&root).unwrap();
        assert!(root.is_dir());
    }
}
