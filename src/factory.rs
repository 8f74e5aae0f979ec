//! Symbol factory - turns raw `(kind, name)` pairs into symbols
//!
//! The cache decodes artifacts through a factory so that callers can
//! substitute their own construction rules.

use crate::symbol::{Symbol, SymbolKind};
use crate::Result;

/// Creates symbols from the kind string and name stored in an artifact.
pub trait SymbolFactory: Send + Sync {
    fn create(&self, kind: &str, name: &str) -> Result<Symbol>;
}

/// Accepts `class`, `interface` and `trait`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardSymbolFactory;

impl StandardSymbolFactory {
    pub fn new() -> Self {
        Self
    }
}

impl SymbolFactory for StandardSymbolFactory {
    fn create(&self, kind: &str, name: &str) -> Result<Symbol> {
        let kind: SymbolKind = kind.parse()?;
        Symbol::new(kind, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_standard_factory_creates_each_kind() {
        let factory = StandardSymbolFactory::new();
        for kind in SymbolKind::all() {
            let symbol = factory.create(kind.as_str(), "Foo\\Bar").unwrap();
            assert_eq!(symbol.kind(), *kind);
            assert_eq!(symbol.name(), "Foo\\Bar");
        }
    }

    #[test]
    fn test_standard_factory_rejects_unknown_kind() {
        let factory = StandardSymbolFactory::new();
        assert!(matches!(
            factory.create("enum", "Foo"),
            Err(Error::UnknownKind(_))
        ));
    }
}
