//! Symbol types - class, interface and trait declarations
//!
//! A symbol is identified by its kind and fully-qualified name. Three
//! relation sets describe what it depends on:
//! - `classes`: parent classes (`extends` on a class)
//! - `interfaces`: implemented interfaces, or extended ones for an interface
//! - `traits`: traits mixed in with `use`

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

/// The three kinds of declaration tracked by the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Class,
    Interface,
    Trait,
}

impl SymbolKind {
    /// Get the string representation of the symbol kind
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Class => "class",
            SymbolKind::Interface => "interface",
            SymbolKind::Trait => "trait",
        }
    }

    /// Get all symbol kinds
    pub fn all() -> &'static [SymbolKind] {
        &[SymbolKind::Class, SymbolKind::Interface, SymbolKind::Trait]
    }

    /// Whether symbols of this kind may implement or extend interfaces
    pub fn has_interfaces(&self) -> bool {
        !matches!(self, SymbolKind::Trait)
    }
}

impl FromStr for SymbolKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "class" => Ok(SymbolKind::Class),
            "interface" => Ok(SymbolKind::Interface),
            "trait" => Ok(SymbolKind::Trait),
            _ => Err(Error::UnknownKind(s.to_string())),
        }
    }
}

impl std::fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A discovered declaration.
///
/// `kind` and `name` are fixed at construction. The relation sets and the
/// abstract flag can be changed afterwards, subject to the kind:
/// traits never carry interfaces and only classes can be abstract.
/// Equality is structural over every field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol {
    name: String,
    kind: SymbolKind,
    classes: BTreeSet<String>,
    interfaces: BTreeSet<String>,
    traits: BTreeSet<String>,
    is_abstract: bool,
}

impl Symbol {
    /// Create a symbol with no relations. Fails on an empty name.
    pub fn new(kind: SymbolKind, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::InvalidSymbol(format!("{kind} with an empty name")));
        }

        Ok(Self {
            name,
            kind,
            classes: BTreeSet::new(),
            interfaces: BTreeSet::new(),
            traits: BTreeSet::new(),
            is_abstract: false,
        })
    }

    pub fn class(name: impl Into<String>) -> Result<Self> {
        Self::new(SymbolKind::Class, name)
    }

    pub fn interface(name: impl Into<String>) -> Result<Self> {
        Self::new(SymbolKind::Interface, name)
    }

    pub fn trait_named(name: impl Into<String>) -> Result<Self> {
        Self::new(SymbolKind::Trait, name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> SymbolKind {
        self.kind
    }

    pub fn classes(&self) -> &BTreeSet<String> {
        &self.classes
    }

    pub fn interfaces(&self) -> &BTreeSet<String> {
        &self.interfaces
    }

    pub fn traits(&self) -> &BTreeSet<String> {
        &self.traits
    }

    /// Only ever true for classes.
    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    /// Replace the parent classes
    pub fn set_classes<I, S>(&mut self, classes: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.classes = collect_names(classes);
        self
    }

    /// Replace the interfaces. Ignored for traits.
    pub fn set_interfaces<I, S>(&mut self, interfaces: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if self.kind.has_interfaces() {
            self.interfaces = collect_names(interfaces);
        }
        self
    }

    /// Replace the used traits
    pub fn set_traits<I, S>(&mut self, traits: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.traits = collect_names(traits);
        self
    }

    /// Mark the symbol abstract. Ignored for anything but classes.
    pub fn set_abstract(&mut self, is_abstract: bool) -> &mut Self {
        if self.kind == SymbolKind::Class {
            self.is_abstract = is_abstract;
        }
        self
    }

    /// Builder form of [`Symbol::set_classes`]
    pub fn with_classes<I, S>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_classes(classes);
        self
    }

    /// Builder form of [`Symbol::set_interfaces`]
    pub fn with_interfaces<I, S>(mut self, interfaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_interfaces(interfaces);
        self
    }

    /// Builder form of [`Symbol::set_traits`]
    pub fn with_traits<I, S>(mut self, traits: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_traits(traits);
        self
    }

    /// Builder form of [`Symbol::set_abstract`]
    pub fn with_abstract(mut self, is_abstract: bool) -> Self {
        self.set_abstract(is_abstract);
        self
    }

    /// Every directly referenced name: parents, interfaces and traits.
    pub fn relations(&self) -> impl Iterator<Item = &str> {
        self.classes
            .iter()
            .chain(self.interfaces.iter())
            .chain(self.traits.iter())
            .map(String::as_str)
    }

    /// Get a short description for display
    pub fn short_description(&self) -> String {
        if self.is_abstract {
            format!("abstract {} {}", self.kind, self.name)
        } else {
            format!("{} {}", self.kind, self.name)
        }
    }
}

fn collect_names<I, S>(names: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    names
        .into_iter()
        .map(Into::into)
        .filter(|name| !name.is_empty())
        .collect()
}
