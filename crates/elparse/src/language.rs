//! The compiled language: a grammar together with its LALR(1) table.

use crate::{
    first_sets::FirstSets,
    grammar::{Environment, GrammarError, ProductionID},
    lalr::Lookaheads,
    lr0::{LR0Automaton, StateID},
    symbol::SymbolID,
    table::{Action, Conflict, LRTable},
};
use elparse_runtime::{
    definition::{ParseAction, ParseTable, Production, TokenClass},
    scanner::Scanner,
    syntaxer::{SyntaxError, Syntaxer},
    tree::SyntaxTree,
};
use std::{fmt, str::FromStr};

/// Options of the table construction.
#[derive(Debug, Clone, Default)]
pub struct Config {
    deny_conflicts: bool,
}

impl Config {
    pub const fn new() -> Self {
        Self {
            deny_conflicts: false,
        }
    }

    /// Treat any conflict in the action table as an error instead of
    /// keeping the first action written.
    pub fn deny_conflicts(&mut self, enabled: bool) -> &mut Self {
        self.deny_conflicts = enabled;
        self
    }

    /// Run the whole pipeline: FIRST sets, LR(0) automaton, LALR(1)
    /// look-aheads and finally the action/goto tables.
    pub fn build(&self, env: Environment) -> Result<Language, GrammarError> {
        let _span = tracing::trace_span!("build").entered();

        let first = FirstSets::new(&env);
        let lr0 = LR0Automaton::new(&env);
        let lookaheads = Lookaheads::new(&env, &first, &lr0);
        let table = LRTable::generate(&env, &lr0, &lookaheads);
        tracing::debug!(
            "built {} state(s) with {} conflict(s)",
            table.len(),
            table.conflicts().len()
        );

        if self.deny_conflicts && !table.conflicts().is_empty() {
            return Err(GrammarError::Conflicts {
                conflicts: table.conflicts().to_vec(),
            });
        }

        Ok(Language { env, table })
    }
}

#[derive(Debug)]
pub struct Language {
    env: Environment,
    table: LRTable,
}

impl Language {
    /// Build with the default configuration.
    pub fn build(env: Environment) -> Result<Self, GrammarError> {
        Config::new().build(env)
    }

    pub(crate) fn from_parts(env: Environment, table: LRTable) -> Self {
        Self { env, table }
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn table(&self) -> &LRTable {
        &self.table
    }

    pub fn conflicts(&self) -> &[Conflict] {
        self.table.conflicts()
    }

    pub fn syntaxer(&self) -> Syntaxer<&Self> {
        Syntaxer::new(self)
    }

    /// Scan and parse `input` with the default scanner.
    pub fn parse_str(&self, input: &str) -> Result<SyntaxTree, SyntaxError> {
        self.syntaxer().parse(Scanner::new(input))
    }
}

/// The grammar followed by the parse table.
impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.env)?;
        write!(f, "{}", self.table.display(&self.env))
    }
}

impl FromStr for Language {
    type Err = GrammarError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        Self::build(source.parse()?)
    }
}

impl ParseTable for Language {
    type State = StateID;
    type Symbol = SymbolID;
    type Production = ProductionID;

    fn initial_state(&self) -> Self::State {
        StateID::INITIAL
    }

    fn token_class(&self, class: TokenClass) -> Self::Symbol {
        match class {
            TokenClass::EndOfFile => SymbolID::ZERO,
            TokenClass::Identifier => SymbolID::IDENTIFIER,
            TokenClass::Number => SymbolID::NUMBER,
            TokenClass::String => SymbolID::STRING,
        }
    }

    fn terminal(&self, text: &str) -> Option<Self::Symbol> {
        let symbols = self.env.symbols();
        symbols
            .get(text)
            .filter(|id| !id.is_builtin() && symbols.is_terminal(*id))
    }

    fn action(
        &self,
        current: Self::State,
        lookahead: Self::Symbol,
    ) -> ParseAction<Self::State, Self::Production> {
        match self.table.action(current, lookahead) {
            Some(Action::Shift(next)) => ParseAction::Shift(next),
            Some(Action::Reduce(production)) => ParseAction::Reduce(production),
            Some(Action::Accept) => ParseAction::Accept,
            None => ParseAction::Error,
        }
    }

    fn goto(&self, current: Self::State, symbol: Self::Symbol) -> Option<Self::State> {
        self.table.goto(current, symbol)
    }

    fn production(&self, production: Self::Production) -> Production<'_, Self::Symbol> {
        let (grammar, condinate) = self.env.production(production);
        Production {
            lhs: grammar.lhs(),
            len: condinate.len(),
            action: condinate.action(),
        }
    }

    fn symbol_name(&self, symbol: Self::Symbol) -> &str {
        self.env.symbols().name(symbol)
    }
}
