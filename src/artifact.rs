//! Cache artifact encoding
//!
//! An artifact is a JSON array of dependent records:
//!
//! ```json
//! [
//!   {
//!     "type": "class",
//!     "name": "App\\Service\\Mailer",
//!     "classes": ["App\\Service\\Base"],
//!     "interfaces": ["App\\Contract\\Sender"],
//!     "traits": [],
//!     "abstract": false
//!   }
//! ]
//! ```
//!
//! `abstract` is written for class records only.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::factory::SymbolFactory;
use crate::symbol::{Symbol, SymbolKind};
use crate::{Error, Result};

/// File extension used for artifacts on disk
pub const ARTIFACT_EXTENSION: &str = "json";

/// Serialized shape of one symbol.
///
/// Also the input boundary shape: a discovery run can be handed over as a
/// JSON object mapping names to records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub traits: Vec<String>,
    #[serde(rename = "abstract", default, skip_serializing_if = "Option::is_none")]
    pub is_abstract: Option<bool>,
}

impl From<&Symbol> for SymbolRecord {
    fn from(symbol: &Symbol) -> Self {
        Self {
            kind: symbol.kind().as_str().to_string(),
            name: symbol.name().to_string(),
            classes: symbol.classes().iter().cloned().collect(),
            interfaces: symbol.interfaces().iter().cloned().collect(),
            traits: symbol.traits().iter().cloned().collect(),
            is_abstract: (symbol.kind() == SymbolKind::Class).then(|| symbol.is_abstract()),
        }
    }
}

impl SymbolRecord {
    /// Build a symbol through `factory`, then apply the stored relations.
    /// The abstract flag is only applied when the factory produced a class.
    pub fn into_symbol(self, factory: &dyn SymbolFactory) -> Result<Symbol> {
        let mut symbol = factory.create(&self.kind, &self.name)?;
        symbol
            .set_classes(self.classes)
            .set_interfaces(self.interfaces)
            .set_traits(self.traits);

        if let Some(is_abstract) = self.is_abstract
            && symbol.kind() == SymbolKind::Class
        {
            symbol.set_abstract(is_abstract);
        }

        Ok(symbol)
    }
}

/// Encode dependents as an artifact
pub fn encode<'a, I>(dependents: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = &'a Symbol>,
{
    let records: Vec<SymbolRecord> = dependents.into_iter().map(SymbolRecord::from).collect();
    let mut bytes = serde_json::to_vec_pretty(&records)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Decode an artifact.
///
/// The artifact itself must be a JSON array. Individual records that are
/// malformed or rejected by the factory are dropped with a warning; their
/// siblings are still returned.
pub fn decode(bytes: &[u8], factory: &dyn SymbolFactory) -> Result<Vec<Symbol>> {
    let values: Vec<serde_json::Value> = serde_json::from_slice(bytes)?;
    let mut symbols = Vec::with_capacity(values.len());

    for (position, value) in values.into_iter().enumerate() {
        let record = match serde_json::from_value::<SymbolRecord>(value) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Skipping malformed record #{}: {}", position, e);
                continue;
            }
        };

        let name = record.name.clone();
        match record.into_symbol(factory) {
            Ok(symbol) => symbols.push(symbol),
            Err(e) => tracing::warn!("Skipping record {}: {}", name, e),
        }
    }

    Ok(symbols)
}

/// Decode a declaration map: a JSON object from symbol name to record.
///
/// Entries are keyed by the record's own name. Records that are malformed
/// or rejected by the factory are dropped with a warning.
pub fn decode_declarations(
    bytes: &[u8],
    factory: &dyn SymbolFactory,
) -> Result<BTreeMap<String, Symbol>> {
    let entries: BTreeMap<String, serde_json::Value> = serde_json::from_slice(bytes)?;
    let mut symbols = BTreeMap::new();

    for (key, value) in entries {
        let symbol = serde_json::from_value::<SymbolRecord>(value)
            .map_err(Error::from)
            .and_then(|record| record.into_symbol(factory));

        match symbol {
            Ok(symbol) => {
                if symbol.name() != key {
                    tracing::debug!("Declaration {} is keyed as {}", symbol.name(), key);
                }
                symbols.insert(symbol.name().to_string(), symbol);
            }
            Err(e) => tracing::warn!("Skipping declaration {}: {}", key, e),
        }
    }

    Ok(symbols)
}
