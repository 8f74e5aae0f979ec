use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::Path;

/// Exclusion rules applied while scanning a package's source directories.
pub struct IgnoreFilter {
    inner: Gitignore,
}

impl IgnoreFilter {
    pub fn new(root: &Path, extra_excludes: &[String]) -> Self {
        let mut builder = GitignoreBuilder::new(root);

        // 1. Load from .gitignore and .ignore
        builder.add(root.join(".gitignore"));
        builder.add(root.join(".ignore"));

        // 2. Add defaults (global)
        let defaults = [
            // Dependency and tool directories
            "vendor/", "node_modules/", ".git/", ".revdeps/", ".idea/", ".vscode/",

            // Build output
            "build/", "dist/",

            // Templates that share the source extension
            "*.phtml", "*.blade.php", "*.twig.php",
        ];

        for pattern in defaults {
            // We ignore errors here as these correspond to static valid patterns
            builder.add_line(None, pattern).ok();
        }

        // 3. Add user config excludes
        for pattern in extra_excludes {
            if let Err(e) = builder.add_line(None, pattern) {
                tracing::warn!("Ignoring invalid exclude pattern {}: {}", pattern, e);
            }
        }

        Self {
            inner: builder.build().unwrap_or_else(|_| Gitignore::empty()),
        }
    }

    pub fn is_ignored(&self, path: &Path, is_dir: bool) -> bool {
        self.inner.matched(path, is_dir).is_ignore()
    }
}
