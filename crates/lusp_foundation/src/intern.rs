//! Symbol interning.
//!
//! Every distinct name is stored once and identified by a [`SymbolId`], so
//! symbol equality is an integer comparison.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Interned symbol identifier.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub(crate) u32);

impl SymbolId {
    /// Returns the raw index of this symbol.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymbolId({})", self.0)
    }
}

/// An interned symbol: its identity plus the shared name text.
///
/// Equality and hashing use the identity only.
#[derive(Clone)]
pub struct Symbol {
    id: SymbolId,
    name: Arc<str>,
}

impl Symbol {
    /// Returns the symbol's identity.
    #[must_use]
    pub fn id(&self) -> SymbolId {
        self.id
    }

    /// Returns the symbol's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({}, {:?})", self.id.0, self.name)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Interner mapping names to symbols and back.
///
/// Owned by one language instance; not thread-safe.
#[derive(Clone, Debug, Default)]
pub struct Interner {
    /// Symbols in interning order, indexed by `SymbolId`.
    symbols: Vec<Symbol>,
    /// Map from name to `SymbolId`.
    symbol_map: HashMap<Arc<str>, SymbolId>,
}

impl Interner {
    /// Creates an empty interner.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns a name, returning its [`Symbol`].
    ///
    /// # Panics
    ///
    /// Panics if the number of interned symbols exceeds `u32::MAX`.
    pub fn intern(&mut self, name: &str) -> Symbol {
        if let Some(&id) = self.symbol_map.get(name) {
            return self.symbols[id.0 as usize].clone();
        }

        let id = SymbolId(u32::try_from(self.symbols.len()).expect("too many interned symbols"));
        let name: Arc<str> = name.into();
        let symbol = Symbol {
            id,
            name: name.clone(),
        };
        self.symbols.push(symbol.clone());
        self.symbol_map.insert(name, id);
        symbol
    }

    /// Looks up an already interned name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Symbol> {
        self.symbol_map
            .get(name)
            .map(|id| self.symbols[id.0 as usize].clone())
    }

    /// Resolves a `SymbolId` back to its symbol.
    #[must_use]
    pub fn resolve(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id.0 as usize)
    }

    /// Returns the number of interned symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Returns true if nothing has been interned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
