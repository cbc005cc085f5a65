use crate::lower::Storage;
use crate::{CompileError, SemanticErrorKind};
use std::collections::HashMap;

/// Flat identifier → storage mapping for one compilation unit.
///
/// Blocks do not open scopes, so a name declared anywhere in the unit is
/// visible from that point to the end of the unit.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: HashMap<String, Storage>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the binding for `storage.identifier`, returning
    /// the previous binding if there was one.
    pub fn put(&mut self, storage: Storage) -> Option<Storage> {
        self.symbols.insert(storage.identifier.clone(), storage)
    }

    pub fn get(&self, identifier: &str) -> Option<&Storage> {
        self.symbols.get(identifier)
    }

    /// Like [`SymbolTable::get`], but an absent name is an `UnboundIdentifier` error.
    pub fn resolve(&self, identifier: &str) -> Result<&Storage, CompileError> {
        self.get(identifier).ok_or_else(|| {
            CompileError::semantic(
                SemanticErrorKind::UnboundIdentifier,
                identifier,
                format!("Identifier '{}' is not declared", identifier),
            )
        })
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.symbols.contains_key(identifier)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
