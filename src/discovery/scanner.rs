//! Declaration scanning
//!
//! Pulls class, interface and trait declarations out of PHP sources with a
//! handful of regular expressions. This is not a parser: it reads the header
//! of each declaration (`extends`, `implements`) and the `use` statements at
//! the top of its body, which is all the dependents cache needs.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use ignore::WalkBuilder;
use regex::Regex;

use crate::ignore::IgnoreFilter;
use crate::storage::path::NAMESPACE_SEPARATOR;
use crate::{Result, Symbol, SymbolKind};

/// Extension of the source files scanned
pub const SOURCE_EXTENSION: &str = "php";

/// Finds the symbols declared in a source directory.
pub trait SourceDiscovery {
    /// Symbols declared under `directory` whose names fall inside
    /// `namespace`. An empty namespace accepts every name.
    fn discover(&self, namespace: &str, directory: &Path) -> Result<BTreeMap<String, Symbol>>;
}

/// Default [`SourceDiscovery`]: walks the directory and scans every source
/// file that is not excluded.
#[derive(Debug, Clone)]
pub struct DeclarationScanner {
    excludes: Vec<String>,
}

impl DeclarationScanner {
    pub fn new() -> Self {
        Self {
            excludes: Vec::new(),
        }
    }

    /// Extra gitignore-style patterns to skip while walking
    pub fn with_excludes(mut self, excludes: Vec<String>) -> Self {
        self.excludes = excludes;
        self
    }
}

impl Default for DeclarationScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceDiscovery for DeclarationScanner {
    fn discover(&self, namespace: &str, directory: &Path) -> Result<BTreeMap<String, Symbol>> {
        let filter = IgnoreFilter::new(directory, &self.excludes);
        let walker = WalkBuilder::new(directory)
            .standard_filters(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| {
                let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
                !filter.is_ignored(entry.path(), is_dir)
            })
            .build();

        let mut symbols = BTreeMap::new();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            let path = entry.path();
            if !entry.file_type().is_some_and(|t| t.is_file())
                || path.extension().and_then(|ext| ext.to_str()) != Some(SOURCE_EXTENSION)
            {
                continue;
            }

            let source = match fs::read_to_string(path) {
                Ok(source) => source,
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", path.display(), e);
                    continue;
                }
            };

            for symbol in scan_source(&source) {
                if !in_namespace(symbol.name(), namespace) {
                    tracing::debug!(
                        "{} declares {} outside {}",
                        path.display(),
                        symbol.name(),
                        namespace
                    );
                    continue;
                }
                symbols.entry(symbol.name().to_string()).or_insert(symbol);
            }
        }

        tracing::debug!(
            "Found {} symbols in {}",
            symbols.len(),
            directory.display()
        );
        Ok(symbols)
    }
}

static BLOCK_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("valid block comment regex"));

static LINE_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*(?://|#).*$").expect("valid line comment regex"));

static NAMESPACE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*namespace\s+([A-Za-z0-9_\\]+)\s*[;{]").expect("valid namespace regex")
});

static IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*use\s+(?:function\s+|const\s+)?([A-Za-z0-9_\\,\s]+?)\s*;")
        .expect("valid import regex")
});

static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^[ \t]*(?P<mods>(?:(?:abstract|final|readonly)\s+)*)(?P<kind>class|interface|trait)\s+(?P<name>[A-Za-z_][A-Za-z0-9_]*)(?:\s+extends\s+(?P<extends>[A-Za-z0-9_\\,\s]+?))?(?:\s+implements\s+(?P<implements>[A-Za-z0-9_\\,\s]+?))?\s*\{",
    )
    .expect("valid declaration regex")
});

static TRAIT_USE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*use\s+([A-Za-z0-9_\\,\s]+?)\s*[;{]").expect("valid trait use regex")
});

/// Byte offset and text of a file-level `use` import
struct Import {
    offset: usize,
    alias: String,
    target: String,
}

/// Symbols declared in one source file, in declaration order
pub fn scan_source(source: &str) -> Vec<Symbol> {
    let source = strip_comments(source);

    let namespaces: Vec<(usize, String)> = NAMESPACE
        .captures_iter(&source)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some((whole.start(), caps[1].trim_matches(NAMESPACE_SEPARATOR).to_string()))
        })
        .collect();

    let headers: Vec<_> = HEADER.captures_iter(&source).collect();

    // A declaration's body runs up to the next declaration
    let bodies: Vec<(usize, usize)> = headers
        .iter()
        .enumerate()
        .filter_map(|(i, caps)| {
            let start = caps.get(0)?.end();
            let end = headers
                .get(i + 1)
                .and_then(|next| next.get(0))
                .map_or(source.len(), |m| m.start());
            Some((start, end))
        })
        .collect();

    let imports: Vec<Import> = IMPORT
        .captures_iter(&source)
        .filter_map(|caps| {
            let offset = caps.get(0)?.start();
            let in_body = bodies.iter().any(|&(start, end)| offset >= start && offset < end);
            (!in_body).then(|| parse_imports(offset, &caps[1]))
        })
        .flatten()
        .collect();

    let mut symbols = Vec::new();

    for (caps, &(body_start, body_end)) in headers.iter().zip(&bodies) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let header_start = whole.start();

        let (namespace_start, namespace) = namespaces
            .iter()
            .rev()
            .find(|(offset, _)| *offset < header_start)
            .map_or((0, ""), |(offset, name)| (*offset, name.as_str()));

        let aliases: BTreeMap<&str, &str> = imports
            .iter()
            .filter(|import| import.offset >= namespace_start && import.offset < header_start)
            .map(|import| (import.alias.as_str(), import.target.as_str()))
            .collect();

        let resolve = |raw: &str| resolve_name(raw, namespace, &aliases);
        let names = |group: &str| -> Vec<String> {
            caps.name(group)
                .map(|m| split_names(m.as_str()).map(&resolve).collect())
                .unwrap_or_default()
        };

        let Ok(kind) = caps["kind"].parse::<SymbolKind>() else {
            continue;
        };
        let name = qualify(namespace, &caps["name"]);
        let Ok(mut symbol) = Symbol::new(kind, name) else {
            continue;
        };

        let body = &source[body_start..body_end];
        let traits: Vec<String> = TRAIT_USE
            .captures_iter(body)
            .flat_map(|tc| split_names(&tc[1]).map(&resolve).collect::<Vec<_>>())
            .collect();

        match kind {
            SymbolKind::Class => {
                symbol
                    .set_classes(names("extends"))
                    .set_interfaces(names("implements"))
                    .set_traits(traits)
                    .set_abstract(caps["mods"].contains("abstract"));
            }
            SymbolKind::Interface => {
                symbol.set_interfaces(names("extends"));
            }
            SymbolKind::Trait => {
                symbol.set_traits(traits);
            }
        }

        symbols.push(symbol);
    }

    symbols
}

fn strip_comments(source: &str) -> String {
    let without_blocks = BLOCK_COMMENT.replace_all(source, "");
    LINE_COMMENT.replace_all(&without_blocks, "").into_owned()
}

fn split_names(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|name| !name.is_empty())
}

fn parse_imports(offset: usize, list: &str) -> Vec<Import> {
    split_names(list)
        .filter_map(|clause| {
            let mut parts = clause.split_whitespace();
            let target = parts.next()?.trim_start_matches(NAMESPACE_SEPARATOR);
            let alias = match (parts.next(), parts.next()) {
                (Some(keyword), Some(alias)) if keyword.eq_ignore_ascii_case("as") => alias,
                _ => target.rsplit(NAMESPACE_SEPARATOR).next()?,
            };
            Some(Import {
                offset,
                alias: alias.to_string(),
                target: target.to_string(),
            })
        })
        .collect()
}

/// Fully qualify a name as written inside `namespace`
fn resolve_name(raw: &str, namespace: &str, aliases: &BTreeMap<&str, &str>) -> String {
    if let Some(absolute) = raw.strip_prefix(NAMESPACE_SEPARATOR) {
        return absolute.to_string();
    }

    let (head, rest) = match raw.split_once(NAMESPACE_SEPARATOR) {
        Some((head, rest)) => (head, Some(rest)),
        None => (raw, None),
    };

    match (aliases.get(head), rest) {
        (Some(target), Some(rest)) => format!("{target}{NAMESPACE_SEPARATOR}{rest}"),
        (Some(target), None) => (*target).to_string(),
        (None, _) => qualify(namespace, raw),
    }
}

fn qualify(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{namespace}{NAMESPACE_SEPARATOR}{name}")
    }
}

fn in_namespace(name: &str, namespace: &str) -> bool {
    namespace.is_empty()
        || name == namespace
        || name
            .strip_prefix(namespace)
            .is_some_and(|rest| rest.starts_with(NAMESPACE_SEPARATOR))
}
