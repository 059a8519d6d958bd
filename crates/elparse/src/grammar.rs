//! Grammar types.

use crate::{
    symbol::{SymbolID, SymbolKind, SymbolTable},
    table::Conflict,
    types::Map,
    util::display_symbols,
};
use elparse_runtime::action::{ActionError, SemanticAction};
use std::{fmt, io};

/// The packed `(grammar index, alternative index)` pair addressing a production.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ProductionID {
    raw: u32,
}

impl ProductionID {
    /// The augmenting production `$start : S`.
    pub const ACCEPT: Self = Self::new(0, 0);

    #[inline]
    pub const fn new(grammar: u16, alternative: u16) -> Self {
        Self {
            raw: (grammar as u32) << 16 | alternative as u32,
        }
    }

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self { raw }
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.raw
    }

    #[inline]
    pub const fn grammar(self) -> usize {
        (self.raw >> 16) as usize
    }

    #[inline]
    pub const fn alternative(self) -> usize {
        (self.raw & 0xffff) as usize
    }
}

impl fmt::Debug for ProductionID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P({}, {})", self.grammar(), self.alternative())
    }
}

/// A production alternative: the right-hand side plus an optional action.
#[derive(Debug, Clone, PartialEq)]
pub struct Condinate {
    symbols: Vec<SymbolID>,
    action: Option<SemanticAction>,
}

impl Condinate {
    /// Right-hand side symbols. Empty for epsilon alternatives.
    pub fn symbols(&self) -> &[SymbolID] {
        &self.symbols[..]
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_epsilon(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn action(&self) -> Option<&SemanticAction> {
        self.action.as_ref()
    }
}

/// All alternatives of one left-hand side nonterminal.
#[derive(Debug, Clone)]
pub struct Grammar {
    lhs: SymbolID,
    condinates: Vec<Condinate>,
}

impl Grammar {
    pub fn new(lhs: SymbolID) -> Self {
        Self {
            lhs,
            condinates: vec![],
        }
    }

    pub fn lhs(&self) -> SymbolID {
        self.lhs
    }

    pub fn condinates(&self) -> &[Condinate] {
        &self.condinates[..]
    }

    /// Parse `action_text` and add an alternative.
    ///
    /// An alternative beginning with the left-hand side itself is moved to
    /// the front of the list instead of being appended.
    pub fn add_alternative(
        &mut self,
        symbols: &SymbolTable,
        action_text: &str,
        rhs: Vec<SymbolID>,
    ) -> Result<(), GrammarError> {
        let condinate = self.make_condinate(symbols, action_text, rhs)?;
        if condinate.symbols.first() == Some(&self.lhs) {
            self.condinates.insert(0, condinate);
        } else {
            self.condinates.push(condinate);
        }
        Ok(())
    }

    /// Append an alternative as-is, keeping a previously normalized order.
    pub(crate) fn restore_alternative(
        &mut self,
        symbols: &SymbolTable,
        action_text: &str,
        rhs: Vec<SymbolID>,
    ) -> Result<(), GrammarError> {
        let condinate = self.make_condinate(symbols, action_text, rhs)?;
        self.condinates.push(condinate);
        Ok(())
    }

    fn make_condinate(
        &self,
        symbols: &SymbolTable,
        action_text: &str,
        mut rhs: Vec<SymbolID>,
    ) -> Result<Condinate, GrammarError> {
        let lhs = symbols.name(self.lhs);

        if rhs.contains(&SymbolID::EPSILON) {
            if rhs.len() > 1 {
                return Err(GrammarError::MisplacedEpsilon { lhs: lhs.into() });
            }
            rhs.clear();
        }
        if let Some(reserved) = rhs.iter().find(|s| {
            matches!(**s, SymbolID::ZERO | SymbolID::UNKNOWN | SymbolID::START)
        }) {
            return Err(GrammarError::ReservedSymbol {
                name: symbols.name(*reserved).into(),
            });
        }

        let action =
            SemanticAction::parse(action_text).map_err(|source| GrammarError::Action {
                lhs: lhs.into(),
                text: action_text.trim().into(),
                source,
            })?;
        if let Some(action) = &action {
            if action.max_index() > rhs.len() {
                return Err(GrammarError::ActionOutOfRange {
                    lhs: lhs.into(),
                    action: action.to_string(),
                    index: action.max_index(),
                    len: rhs.len(),
                });
            }
        }

        Ok(Condinate {
            symbols: rhs,
            action,
        })
    }
}

/// The whole grammar: interned symbols and the grammars addressed by
/// production index. Grammar 0 is always the augmenting `$start` grammar.
#[derive(Debug)]
pub struct Environment {
    symbols: SymbolTable,
    grammars: Vec<Grammar>,
    index: Map<SymbolID, usize>,
}

impl Environment {
    /// Define an environment using the specified function.
    pub fn define<F>(f: F) -> Result<Self, GrammarError>
    where
        F: FnOnce(&mut EnvironmentDef) -> Result<(), GrammarError>,
    {
        let mut def = EnvironmentDef {
            symbols: SymbolTable::new(),
            grammars: vec![],
            index: Map::default(),
        };
        f(&mut def)?;
        def.end()
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn grammars(&self) -> &[Grammar] {
        &self.grammars[..]
    }

    /// The user-visible start symbol, i.e. the left-hand side of the first rule.
    pub fn start_symbol(&self) -> SymbolID {
        self.grammars[0].condinates[0].symbols[0]
    }

    pub fn grammar(&self, lhs: SymbolID) -> Option<&Grammar> {
        self.index.get(&lhs).map(|&i| &self.grammars[i])
    }

    pub fn grammar_index(&self, lhs: SymbolID) -> Option<usize> {
        self.index.get(&lhs).copied()
    }

    /// Resolve a production index.
    ///
    /// # Panics
    /// Panics if `id` was not issued by this environment.
    pub fn production(&self, id: ProductionID) -> (&Grammar, &Condinate) {
        match self.get_production(id) {
            Some(found) => found,
            None => panic!("production {:?} does not exist", id),
        }
    }

    pub fn get_production(&self, id: ProductionID) -> Option<(&Grammar, &Condinate)> {
        let grammar = self.grammars.get(id.grammar())?;
        let condinate = grammar.condinates.get(id.alternative())?;
        Some((grammar, condinate))
    }

    /// The productions of `lhs`, in alternative order.
    pub fn alternatives_of(&self, lhs: SymbolID) -> impl Iterator<Item = ProductionID> + '_ {
        let (index, count) = match self.index.get(&lhs) {
            Some(&index) => (index, self.grammars[index].condinates.len()),
            None => (0, 0),
        };
        (0..count).map(move |alt| ProductionID::new(index as u16, alt as u16))
    }

    /// All productions in grammar order.
    pub fn productions(&self) -> impl Iterator<Item = (ProductionID, &Grammar, &Condinate)> + '_ {
        self.grammars.iter().enumerate().flat_map(|(i, grammar)| {
            grammar
                .condinates
                .iter()
                .enumerate()
                .map(move |(j, c)| (ProductionID::new(i as u16, j as u16), grammar, c))
        })
    }

    /// `"Lhs : a B c"`
    pub fn display_production(&self, id: ProductionID) -> impl fmt::Display + '_ {
        let (grammar, condinate) = self.production(id);
        crate::util::display_fn(move |f| {
            write!(
                f,
                "{} : {}",
                self.symbols.name(grammar.lhs),
                display_symbols(&self.symbols, condinate.symbols())
            )
        })
    }
}

/// Renders the environment in the grammar source format, omitting the
/// augmenting grammar.
impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, grammar) in self.grammars.iter().skip(1).enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "{}", self.symbols.name(grammar.lhs))?;
            for (j, condinate) in grammar.condinates.iter().enumerate() {
                let marker = if j == 0 { ':' } else { '|' };
                write!(
                    f,
                    "\t{} {}\t",
                    marker,
                    display_symbols(&self.symbols, condinate.symbols())
                )?;
                if let Some(action) = &condinate.action {
                    write!(f, "{}", action)?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

/// The contextual values for building an `Environment`.
#[derive(Debug)]
pub struct EnvironmentDef {
    symbols: SymbolTable,
    grammars: Vec<Grammar>,
    index: Map<SymbolID, usize>,
}

impl EnvironmentDef {
    /// Intern a symbol. Its kind follows from the spelling of `name`.
    pub fn symbol(&mut self, name: &str) -> Result<SymbolID, GrammarError> {
        self.symbols
            .intern(name)
            .ok_or_else(|| GrammarError::TooManySymbols { name: name.into() })
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Add an alternative `lhs : rhs` with the given action text.
    pub fn alternative<I>(&mut self, lhs: SymbolID, action: &str, rhs: I) -> Result<(), GrammarError>
    where
        I: IntoIterator<Item = SymbolID>,
    {
        let index = self.grammar_index(lhs)?;
        let rhs = rhs.into_iter().collect();
        self.grammars[index].add_alternative(&self.symbols, action, rhs)
    }

    pub(crate) fn restore_alternative<I>(
        &mut self,
        lhs: SymbolID,
        action: &str,
        rhs: I,
    ) -> Result<(), GrammarError>
    where
        I: IntoIterator<Item = SymbolID>,
    {
        let index = self.grammar_index(lhs)?;
        let rhs = rhs.into_iter().collect();
        self.grammars[index].restore_alternative(&self.symbols, action, rhs)
    }

    /// Find or create the grammar of `lhs`.
    fn grammar_index(&mut self, lhs: SymbolID) -> Result<usize, GrammarError> {
        if self.symbols.kind(lhs) != SymbolKind::Nonterminal || lhs.is_builtin() {
            return Err(GrammarError::InvalidLhs {
                name: self.symbols.name(lhs).into(),
            });
        }
        let index = match self.index.get(&lhs) {
            Some(&index) => index,
            None => {
                self.grammars.push(Grammar::new(lhs));
                self.index.insert(lhs, self.grammars.len() - 1);
                self.grammars.len() - 1
            }
        };
        Ok(index)
    }

    fn end(self) -> Result<Environment, GrammarError> {
        let Self {
            symbols,
            grammars: user_grammars,
            ..
        } = self;

        let first = user_grammars.first().ok_or(GrammarError::EmptyGrammar)?;

        if user_grammars.len() >= u16::MAX as usize
            || user_grammars
                .iter()
                .any(|g| g.condinates.len() >= u16::MAX as usize)
        {
            return Err("too many productions".into());
        }

        let mut grammars = Vec::with_capacity(user_grammars.len() + 1);
        grammars.push(Grammar {
            lhs: SymbolID::START,
            condinates: vec![Condinate {
                symbols: vec![first.lhs],
                action: Some(SemanticAction::Identity(1)),
            }],
        });
        grammars.extend(user_grammars);

        let index: Map<SymbolID, usize> = grammars
            .iter()
            .enumerate()
            .map(|(i, g)| (g.lhs, i))
            .collect();

        for grammar in &grammars {
            for condinate in &grammar.condinates {
                for symbol in &condinate.symbols {
                    if !symbols.is_terminal(*symbol) && !index.contains_key(symbol) {
                        return Err(GrammarError::UnknownNonterminal {
                            name: symbols.name(*symbol).into(),
                            lhs: symbols.name(grammar.lhs).into(),
                        });
                    }
                }
            }
        }

        Ok(Environment {
            symbols,
            grammars,
            index,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("line {line}: missing tab between the production and its action")]
    MissingSeparator { line: usize },

    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("line {line}: {source}")]
    AtLine {
        line: usize,
        #[source]
        source: Box<GrammarError>,
    },

    #[error("invalid action `{text}` in `{lhs}`: {source}")]
    Action {
        lhs: String,
        text: String,
        #[source]
        source: ActionError,
    },

    #[error("action `{action}` of `{lhs}` refers to ${index}, but the alternative has {len} symbol(s)")]
    ActionOutOfRange {
        lhs: String,
        action: String,
        index: usize,
        len: usize,
    },

    #[error("nonterminal `{name}` referenced by `{lhs}` has no production")]
    UnknownNonterminal { name: String, lhs: String },

    #[error("`{name}` cannot have productions: it is not a nonterminal")]
    InvalidLhs { name: String },

    #[error("`{name}` is reserved and cannot appear in a production")]
    ReservedSymbol { name: String },

    #[error("`epsilon` must be the only symbol of an alternative of `{lhs}`")]
    MisplacedEpsilon { lhs: String },

    #[error("the grammar has no production")]
    EmptyGrammar,

    #[error("too many symbols: cannot add `{name}`")]
    TooManySymbols { name: String },

    #[error("the action table has {} conflict(s)", .conflicts.len())]
    Conflicts { conflicts: Vec<Conflict> },

    #[error("{msg}")]
    Other { msg: String },
}

impl From<&str> for GrammarError {
    fn from(msg: &str) -> Self {
        Self::Other { msg: msg.into() }
    }
}

impl From<String> for GrammarError {
    fn from(msg: String) -> Self {
        Self::Other { msg }
    }
}
