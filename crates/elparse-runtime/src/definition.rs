//! Parser definition.

use crate::action::SemanticAction;
use std::{rc::Rc, sync::Arc};

/// The token classes that map onto built-in terminal symbols.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TokenClass {
    EndOfFile,
    Identifier,
    Number,
    String,
}

/// An entry of the action table.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ParseAction<TState, TProduction> {
    Shift(TState),
    Reduce(TProduction),
    Accept,
    Error,
}

/// The information about a production needed to perform a reduction.
#[derive(Debug, Copy, Clone)]
pub struct Production<'t, TSymbol> {
    pub lhs: TSymbol,
    /// The number of right-hand side symbols, zero for epsilon alternatives.
    pub len: usize,
    pub action: Option<&'t SemanticAction>,
}

/// The trait for abstracting the compiled LALR(1) parse table.
pub trait ParseTable {
    /// The number to identify the state of the LR automaton.
    type State: Copy + std::fmt::Debug;

    /// The number to identify the terminal/nonterminal symbols.
    type Symbol: Copy + Eq + std::fmt::Debug;

    /// The number to identify a production.
    type Production: Copy + std::fmt::Debug;

    /// Return the initial state number.
    fn initial_state(&self) -> Self::State;

    /// Return the built-in terminal symbol for a token class.
    fn token_class(&self, class: TokenClass) -> Self::Symbol;

    /// Look up a keyword or operator terminal by its text.
    fn terminal(&self, text: &str) -> Option<Self::Symbol>;

    /// Return the action corresponding to the specified state number and
    /// lookahead symbol.
    fn action(
        &self,
        current: Self::State,
        lookahead: Self::Symbol,
    ) -> ParseAction<Self::State, Self::Production>;

    /// Return the state to transition to after reducing to `symbol`.
    fn goto(&self, current: Self::State, symbol: Self::Symbol) -> Option<Self::State>;

    fn production(&self, production: Self::Production) -> Production<'_, Self::Symbol>;

    fn symbol_name(&self, symbol: Self::Symbol) -> &str;
}

macro_rules! impl_parse_table_for_pointer {
    ($($ptr:ty),*) => {$(
        impl<T: ?Sized> ParseTable for $ptr
        where
            T: ParseTable,
        {
            type State = T::State;
            type Symbol = T::Symbol;
            type Production = T::Production;

            fn initial_state(&self) -> Self::State {
                (**self).initial_state()
            }

            fn token_class(&self, class: TokenClass) -> Self::Symbol {
                (**self).token_class(class)
            }

            fn terminal(&self, text: &str) -> Option<Self::Symbol> {
                (**self).terminal(text)
            }

            fn action(
                &self,
                current: Self::State,
                lookahead: Self::Symbol,
            ) -> ParseAction<Self::State, Self::Production> {
                (**self).action(current, lookahead)
            }

            fn goto(&self, current: Self::State, symbol: Self::Symbol) -> Option<Self::State> {
                (**self).goto(current, symbol)
            }

            fn production(&self, production: Self::Production) -> Production<'_, Self::Symbol> {
                (**self).production(production)
            }

            fn symbol_name(&self, symbol: Self::Symbol) -> &str {
                (**self).symbol_name(symbol)
            }
        }
    )*};
}

impl_parse_table_for_pointer!(&T, Rc<T>, Arc<T>);
