//! Symbol interning.

use crate::{types::Map, util::display_fn};
use bit_set::BitSet;
use std::{fmt, ops::Index};

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct SymbolID {
    raw: u16,
}

impl SymbolID {
    /// Reserved terminal symbol that marks the end of input.
    pub const ZERO: Self = Self::new(0);

    /// Reserved terminal symbol that denotes the empty sequence.
    pub const EPSILON: Self = Self::new(1);

    pub const IDENTIFIER: Self = Self::new(2);
    pub const NUMBER: Self = Self::new(3);
    pub const STRING: Self = Self::new(4);

    /// Placeholder lookahead used while computing LALR(1) propagation.
    pub const UNKNOWN: Self = Self::new(5);

    /// The augmenting start nonterminal.
    pub const START: Self = Self::new(6);

    const OFFSET: u16 = 7;

    #[inline]
    const fn new(raw: u16) -> Self {
        Self { raw }
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.raw as usize
    }

    #[inline]
    pub const fn is_builtin(self) -> bool {
        self.raw < Self::OFFSET
    }
}

impl fmt::Debug for SymbolID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Y#{:03}", self.raw)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Terminal,
    Nonterminal,
}

#[derive(Debug)]
pub struct Symbol {
    id: SymbolID,
    name: String,
    kind: SymbolKind,
}

impl Symbol {
    pub fn id(&self) -> SymbolID {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> SymbolKind {
        self.kind
    }

    pub fn is_terminal(&self) -> bool {
        self.kind == SymbolKind::Terminal
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Classify a symbol name: capitalized names are nonterminals, everything
/// else (keywords, operators) is a terminal.
pub fn is_terminal_name(name: &str) -> bool {
    !name.chars().next().map_or(false, char::is_uppercase)
}

/// The interned symbols of a grammar, in creation order.
#[derive(Debug)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    names: Map<String, SymbolID>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        let mut table = Self {
            symbols: vec![],
            names: Map::default(),
        };
        for (name, kind) in [
            ("zero", SymbolKind::Terminal),
            ("epsilon", SymbolKind::Terminal),
            ("identifier", SymbolKind::Terminal),
            ("number", SymbolKind::Terminal),
            ("string", SymbolKind::Terminal),
            ("$unknown", SymbolKind::Terminal),
            ("$start", SymbolKind::Nonterminal),
        ] {
            table.insert(name, kind);
        }
        debug_assert_eq!(table.symbols.len(), SymbolID::OFFSET as usize);
        table
    }

    /// Return the canonical handle for `name`, creating it on first use.
    ///
    /// Returns `None` once every `SymbolID` is taken.
    pub fn intern(&mut self, name: &str) -> Option<SymbolID> {
        if let Some(id) = self.names.get(name) {
            return Some(*id);
        }
        let kind = if is_terminal_name(name) {
            SymbolKind::Terminal
        } else {
            SymbolKind::Nonterminal
        };
        self.insert(name, kind)
    }

    fn insert(&mut self, name: &str, kind: SymbolKind) -> Option<SymbolID> {
        let id = SymbolID::new(u16::try_from(self.symbols.len()).ok()?);
        self.symbols.push(Symbol {
            id,
            name: name.to_owned(),
            kind,
        });
        self.names.insert(name.to_owned(), id);
        Some(id)
    }

    pub fn get(&self, name: &str) -> Option<SymbolID> {
        self.names.get(name).copied()
    }

    pub fn name(&self, id: SymbolID) -> &str {
        &self[id].name
    }

    pub fn kind(&self, id: SymbolID) -> SymbolKind {
        self[id].kind
    }

    pub fn is_terminal(&self, id: SymbolID) -> bool {
        self[id].is_terminal()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> + '_ {
        self.symbols.iter()
    }

    pub fn terminals(&self) -> impl Iterator<Item = SymbolID> + '_ {
        self.symbols
            .iter()
            .filter(|s| s.is_terminal())
            .map(|s| s.id)
    }

    pub fn nonterminals(&self) -> impl Iterator<Item = SymbolID> + '_ {
        self.symbols
            .iter()
            .filter(|s| !s.is_terminal())
            .map(|s| s.id)
    }

    /// `{a, b, c}`
    pub fn display_set<'a>(&'a self, set: &'a SymbolSet) -> impl fmt::Display + 'a {
        display_fn(move |f| {
            f.write_str("{")?;
            for (i, symbol) in set.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                f.write_str(self.name(symbol))?;
            }
            f.write_str("}")
        })
    }
}

impl Index<SymbolID> for SymbolTable {
    type Output = Symbol;

    fn index(&self, id: SymbolID) -> &Symbol {
        &self.symbols[id.index()]
    }
}

/// A set of symbols, used for FIRST sets and lookaheads.
#[derive(Clone, Default)]
pub struct SymbolSet {
    inner: BitSet,
}

impl SymbolSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: SymbolID) -> bool {
        self.inner.insert(symbol.index())
    }

    pub fn remove(&mut self, symbol: SymbolID) -> bool {
        self.inner.remove(symbol.index())
    }

    pub fn contains(&self, symbol: SymbolID) -> bool {
        self.inner.contains(symbol.index())
    }

    /// Add all elements of `other`, returning whether this set has grown.
    pub fn union_with(&mut self, other: &Self) -> bool {
        let before = self.inner.len();
        self.inner.union_with(&other.inner);
        self.inner.len() != before
    }

    pub fn difference(&self, other: &Self) -> Self {
        Self {
            inner: self.inner.difference(&other.inner).collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = SymbolID> + '_ {
        self.inner.iter().map(|raw| SymbolID::new(raw as u16))
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

// Compare by elements; the underlying bit vectors may differ in capacity.
impl PartialEq for SymbolSet {
    fn eq(&self, other: &Self) -> bool {
        self.inner.iter().eq(other.inner.iter())
    }
}

impl Eq for SymbolSet {}

impl fmt::Debug for SymbolSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<SymbolID> for SymbolSet {
    fn from_iter<I: IntoIterator<Item = SymbolID>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().map(SymbolID::index).collect(),
        }
    }
}
