//! The shift-reduce driver.

use crate::{
    action::ActionError,
    definition::{ParseAction, ParseTable, Production, TokenClass},
    token::{Position, ScanError, Token, TokenKind, TokenSource},
    tree::{SyntaxTree, Value},
};
use std::{fmt, hash::BuildHasherDefault, rc::Rc};

type BuildHasher = BuildHasherDefault<rustc_hash::FxHasher>;
type Map<K, V> = indexmap::IndexMap<K, V, BuildHasher>;
type Set<T> = indexmap::IndexSet<T, BuildHasher>;

#[derive(Debug, thiserror::Error)]
pub enum SyntaxError {
    #[error("{position}: unexpected symbol `{symbol}`")]
    Unexpected {
        symbol: String,
        text: String,
        position: Position,
    },

    #[error("{position}: unknown token `{text}`")]
    UnknownToken { text: String, position: Position },

    #[error("{position}: invalid constant `{text}`")]
    InvalidConstant { text: String, position: Position },

    #[error("{position}: {source}")]
    Action {
        #[source]
        source: ActionError,
        position: Position,
    },

    #[error("{source}")]
    Scan {
        #[source]
        source: ScanError,
        position: Position,
    },
}

impl SyntaxError {
    /// Return the position of the offending token.
    pub fn position(&self) -> Position {
        match self {
            Self::Unexpected { position, .. }
            | Self::UnknownToken { position, .. }
            | Self::InvalidConstant { position, .. }
            | Self::Action { position, .. }
            | Self::Scan { position, .. } => *position,
        }
    }
}

/// The three parallel stacks of the driver.
///
/// Values own their subtrees, so dropping the stack releases every partially
/// built tree.
#[derive(Debug)]
struct ParseStack<S, Y> {
    states: Vec<S>,
    symbols: Vec<Y>,
    values: Vec<Value>,
}

impl<S: Copy, Y> ParseStack<S, Y> {
    fn new(state: S, symbol: Y) -> Self {
        Self {
            states: vec![state],
            symbols: vec![symbol],
            values: vec![Value::Empty],
        }
    }

    fn len(&self) -> usize {
        self.states.len()
    }

    fn top_state(&self) -> S {
        match self.states.last() {
            Some(state) => *state,
            None => unreachable!("the parse stack lost its bottom entry"),
        }
    }

    fn push(&mut self, state: S, symbol: Y, value: Value) {
        self.states.push(state);
        self.symbols.push(symbol);
        self.values.push(value);
    }

    fn pop(&mut self, count: usize) {
        assert!(
            count < self.len(),
            "cannot pop {} entries from a parse stack of depth {}",
            count,
            self.len()
        );
        let len = self.len() - count;
        self.states.truncate(len);
        self.symbols.truncate(len);
        self.values.truncate(len);
        debug_assert!(self.symbols.len() == len && self.values.len() == len);
    }
}

struct Lookahead<'s, Y> {
    symbol: Y,
    value: Value,
    token: Token<'s>,
}

/// The driver that runs a compiled parse table over a token stream.
pub struct Syntaxer<T> {
    table: T,
    symbols: Set<Rc<str>>,
    literals: Set<Rc<str>>,
    constants: Map<Rc<str>, i64>,
}

impl<T> fmt::Debug for Syntaxer<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Syntaxer")
            .field("table", &self.table)
            .field("symbols", &self.symbols)
            .field("literals", &self.literals)
            .field("constants", &self.constants)
            .finish()
    }
}

impl<T> Syntaxer<T>
where
    T: ParseTable,
{
    pub fn new(table: T) -> Self {
        Self {
            table,
            symbols: Set::default(),
            literals: Set::default(),
            constants: Map::default(),
        }
    }

    pub fn table(&self) -> &T {
        &self.table
    }

    /// The identifiers seen so far.
    pub fn symbols(&self) -> impl Iterator<Item = &str> + '_ {
        self.symbols.iter().map(|s| &**s)
    }

    /// The string literals seen so far.
    pub fn literals(&self) -> impl Iterator<Item = &str> + '_ {
        self.literals.iter().map(|s| &**s)
    }

    /// The numeric constants seen so far, keyed by their text.
    pub fn constants(&self) -> impl Iterator<Item = (&str, i64)> + '_ {
        self.constants.iter().map(|(text, value)| (&**text, *value))
    }

    /// Parse the whole token stream, stopping at the first error.
    pub fn parse<'s, S>(&mut self, mut source: S) -> Result<SyntaxTree, SyntaxError>
    where
        S: TokenSource<'s>,
    {
        let _span = tracing::trace_span!("parse").entered();

        let mut stack = ParseStack::new(
            self.table.initial_state(),
            self.table.token_class(TokenClass::EndOfFile),
        );
        let mut lookahead = None;

        loop {
            let next = match lookahead.take() {
                Some(next) => next,
                None => self.next_symbol(&mut source)?,
            };

            let current = stack.top_state();
            match self.table.action(current, next.symbol) {
                ParseAction::Shift(state) => {
                    tracing::trace!(
                        "[S] `{}`, goto {:?}",
                        self.table.symbol_name(next.symbol),
                        state
                    );
                    stack.push(state, next.symbol, next.value);
                }

                ParseAction::Reduce(production) => {
                    self.reduce(&mut stack, production, next.token.position)?;
                    lookahead = Some(next);
                }

                ParseAction::Accept => {
                    tracing::trace!("[A] accepted");
                    let root = stack.values.pop().unwrap_or_default();
                    return Ok(SyntaxTree::new(root.into_node()));
                }

                ParseAction::Error => {
                    tracing::debug!(
                        "unexpected `{}` in state {:?}, dropping {} stack entries",
                        next.token,
                        current,
                        stack.len()
                    );
                    return Err(SyntaxError::Unexpected {
                        symbol: self.table.symbol_name(next.symbol).to_owned(),
                        text: next.token.to_string(),
                        position: next.token.position,
                    });
                }
            }
        }
    }

    fn reduce(
        &self,
        stack: &mut ParseStack<T::State, T::Symbol>,
        production: T::Production,
        position: Position,
    ) -> Result<(), SyntaxError> {
        let Production { lhs, len, action } = self.table.production(production);

        let value = match action {
            Some(action) => action
                .invoke(&mut stack.values)
                .map_err(|source| SyntaxError::Action { source, position })?,
            None => Value::Empty,
        };
        stack.pop(len);

        let top = stack.top_state();
        let next = self.table.goto(top, lhs).unwrap_or_else(|| {
            panic!(
                "missing goto entry for ({:?}, {}) while reducing {:?}",
                top,
                self.table.symbol_name(lhs),
                production
            )
        });
        tracing::trace!(
            "[R] {} symbol(s) to `{}`, goto {:?}",
            len,
            self.table.symbol_name(lhs),
            next
        );

        stack.push(next, lhs, value);
        Ok(())
    }

    fn next_symbol<'s, S>(&mut self, source: &mut S) -> Result<Lookahead<'s, T::Symbol>, SyntaxError>
    where
        S: TokenSource<'s>,
    {
        let token = source.next_token().map_err(|source| SyntaxError::Scan {
            position: source.position(),
            source,
        })?;

        let (symbol, value) = match token.kind {
            TokenKind::EndOfFile => (self.table.token_class(TokenClass::EndOfFile), Value::Empty),

            TokenKind::Number => {
                let value = self.constant(&token)?;
                (
                    self.table.token_class(TokenClass::Number),
                    Value::Constant(value),
                )
            }

            TokenKind::String => (
                self.table.token_class(TokenClass::String),
                Value::Literal(intern(&mut self.literals, token.text)),
            ),

            TokenKind::Identifier => match self.table.terminal(token.text) {
                Some(keyword) => (keyword, Value::Empty),
                None => (
                    self.table.token_class(TokenClass::Identifier),
                    Value::Symbol(intern(&mut self.symbols, token.text)),
                ),
            },

            TokenKind::Sign => match self.table.terminal(token.text) {
                Some(sign) => (sign, Value::Empty),
                None => {
                    return Err(SyntaxError::UnknownToken {
                        text: token.text.to_owned(),
                        position: token.position,
                    })
                }
            },
        };

        Ok(Lookahead {
            symbol,
            value,
            token,
        })
    }

    fn constant(&mut self, token: &Token<'_>) -> Result<i64, SyntaxError> {
        if let Some(value) = self.constants.get(token.text) {
            return Ok(*value);
        }
        let value = token
            .text
            .parse::<i64>()
            .map_err(|_| SyntaxError::InvalidConstant {
                text: token.text.to_owned(),
                position: token.position,
            })?;
        self.constants.insert(token.text.into(), value);
        Ok(value)
    }
}

fn intern(set: &mut Set<Rc<str>>, text: &str) -> Rc<str> {
    match set.get(text) {
        Some(interned) => interned.clone(),
        None => {
            let interned: Rc<str> = text.into();
            set.insert(interned.clone());
            interned
        }
    }
}
