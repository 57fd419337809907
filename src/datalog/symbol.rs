//! Layered string and public key interning
//!
//! A table is either standalone or a *view* over a shared, read-only base.
//! A view captures the base's offsets when it is created and appends new
//! entries to its own local layer; the base is never written through a view,
//! so independent views over one base never see each other's entries.
//!
//! Ids are absolute across layers: a non-default string at cumulative
//! position `p` has id `OFFSET + p`, a public key at position `p` has index `p`.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Serialize, Deserialize};
use tracing::trace;

use crate::constants::{DEFAULT_SYMBOLS, OFFSET};
use crate::datalog::SymbolIndex;
use crate::error::Error;
use crate::keys::PublicKey;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "LocalLayer", into = "LocalLayer")]
pub struct SymbolTable {
    base: Option<Arc<SymbolTable>>,
    /// Non-default strings visible through `base`
    base_offset: usize,
    /// Public keys visible through `base`
    base_key_offset: usize,
    symbols: Vec<String>,
    public_keys: Vec<PublicKey>,
    /// string -> absolute id, local layer only
    index: HashMap<String, SymbolIndex>,
}

/// Serialized form: the local layer only.
#[derive(Serialize, Deserialize)]
struct LocalLayer {
    symbols: Vec<String>,
    public_keys: Vec<PublicKey>,
}

impl From<LocalLayer> for SymbolTable {
    fn from(layer: LocalLayer) -> Self {
        SymbolTable::from_local(layer.symbols, layer.public_keys)
    }
}

impl From<SymbolTable> for LocalLayer {
    fn from(table: SymbolTable) -> Self {
        let (symbols, public_keys) = table.into_local();
        Self { symbols, public_keys }
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Standalone table whose entries get ids from zero (strings from `OFFSET`).
    /// Repeated entries collapse onto their first occurrence.
    pub fn from_local(symbols: Vec<String>, public_keys: Vec<PublicKey>) -> Self {
        let mut table = SymbolTable::new();
        for s in &symbols {
            table.insert(s);
        }
        for key in &public_keys {
            table.insert_public_key(key);
        }
        table
    }

    /// Opens a new layer over `base`, inheriting everything it holds now.
    pub fn view(base: &Arc<SymbolTable>) -> Self {
        Self {
            base: Some(Arc::clone(base)),
            base_offset: base.current_offset(),
            base_key_offset: base.current_public_key_offset(),
            symbols: Vec::new(),
            public_keys: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Returns the id of `s`, appending it to the local layer when unknown.
    pub fn insert(&mut self, s: &str) -> SymbolIndex {
        if let Some(id) = self.symbol_id(s) {
            return id;
        }

        let id = OFFSET + self.current_offset() as u64;
        self.symbols.push(s.to_string());
        self.index.insert(s.to_string(), id);
        trace!(symbol = s, id, "interned new symbol");
        id
    }

    /// Returns the index of `key`, appending it to the local layer when unknown.
    pub fn insert_public_key(&mut self, key: &PublicKey) -> u64 {
        if let Some(index) = self.public_key_index(key) {
            return index;
        }

        let index = self.current_public_key_offset() as u64;
        self.public_keys.push(key.clone());
        trace!(key = %key, index, "interned new public key");
        index
    }

    /// Number of non-default strings visible through this table.
    pub fn current_offset(&self) -> usize {
        self.base_offset + self.symbols.len()
    }

    /// Number of public keys visible through this table.
    pub fn current_public_key_offset(&self) -> usize {
        self.base_key_offset + self.public_keys.len()
    }

    pub fn symbol_id(&self, s: &str) -> Option<SymbolIndex> {
        if let Some(pos) = DEFAULT_SYMBOLS.iter().position(|d| *d == s) {
            return Some(pos as u64);
        }
        self.layers().find_map(|layer| layer.index.get(s).copied())
    }

    pub fn public_key_index(&self, key: &PublicKey) -> Option<u64> {
        self.layers().find_map(|layer| {
            layer
                .public_keys
                .iter()
                .position(|k| k == key)
                .map(|pos| (layer.base_key_offset + pos) as u64)
        })
    }

    pub fn get_symbol(&self, id: SymbolIndex) -> Option<&str> {
        if id < OFFSET {
            return DEFAULT_SYMBOLS.get(id as usize).copied();
        }
        let pos = usize::try_from(id - OFFSET).ok()?;
        let layer = self.layers().find(|layer| pos >= layer.base_offset)?;
        layer.symbols.get(pos - layer.base_offset).map(String::as_str)
    }

    pub fn get_public_key(&self, index: u64) -> Option<&PublicKey> {
        let pos = usize::try_from(index).ok()?;
        let layer = self.layers().find(|layer| pos >= layer.base_key_offset)?;
        layer.public_keys.get(pos - layer.base_key_offset)
    }

    /// Strings appended to this layer, in insertion order.
    pub fn local_symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Public keys appended to this layer, in insertion order.
    pub fn local_public_keys(&self) -> &[PublicKey] {
        &self.public_keys
    }

    /// Drops the base and hands back the local layer.
    pub fn into_local(self) -> (Vec<String>, Vec<PublicKey>) {
        (self.symbols, self.public_keys)
    }

    /// Re-applies a standalone block table on top of this one.
    ///
    /// Every string of `other` must be new here; anything else means the
    /// block was built against a different base.
    pub fn extend(&mut self, other: &SymbolTable) -> Result<(), Error> {
        if let Some(dup) = other.symbols.iter().find(|s| self.symbol_id(s).is_some()) {
            return Err(Error::DuplicateSymbol(dup.clone()));
        }
        for s in &other.symbols {
            self.insert(s);
        }
        self.extend_public_keys(&other.public_keys)
    }

    pub fn extend_public_keys(&mut self, keys: &[PublicKey]) -> Result<(), Error> {
        if let Some(dup) = keys.iter().find(|k| self.public_key_index(k).is_some()) {
            return Err(Error::DuplicatePublicKey(dup.to_hex()));
        }
        for key in keys {
            self.insert_public_key(key);
        }
        Ok(())
    }

    /// This table, then its base, then the base's base.
    fn layers(&self) -> impl Iterator<Item = &SymbolTable> {
        std::iter::successors(Some(self), |t| t.base.as_deref())
    }
}
