//! Action/goto table synthesis.

use crate::{
    grammar::{Environment, ProductionID},
    lalr::Lookaheads,
    lr0::{LR0Automaton, StateID},
    symbol::SymbolID,
    types::Map,
    util::display_fn,
};
use std::fmt;

/// The action that the LR automaton in a state performs on a particular
/// lookahead symbol.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Action {
    /// Read a lookahead symbol and transition to the specified state.
    Shift(StateID),

    /// Reduce to the specified production.
    Reduce(ProductionID),

    Accept,
}

impl Action {
    pub fn display<'e>(&'e self, env: &'e Environment) -> impl fmt::Display + 'e {
        display_fn(move |f| match self {
            Self::Shift(state) => write!(f, "shift({:?})", state),
            Self::Reduce(production) => write!(f, "reduce({})", env.display_production(*production)),
            Self::Accept => f.write_str("accept"),
        })
    }
}

/// Two actions claiming the same table cell. The first one written is kept.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub state: StateID,
    pub symbol: SymbolID,
    pub kept: Action,
    pub rejected: Action,
}

impl Conflict {
    pub fn display<'e>(&'e self, env: &'e Environment) -> impl fmt::Display + 'e {
        display_fn(move |f| {
            write!(
                f,
                "{:?} on `{}`: kept {}, rejected {}",
                self.state,
                env.symbols().name(self.symbol),
                self.kept.display(env),
                self.rejected.display(env)
            )
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct TableRow {
    pub actions: Map<SymbolID, Action>,
    pub gotos: Map<SymbolID, StateID>,
}

#[derive(Debug, Clone)]
pub struct LRTable {
    rows: Vec<TableRow>,
    conflicts: Vec<Conflict>,
}

impl LRTable {
    /// Create an empty table with `states` rows.
    pub fn new(states: usize) -> Self {
        Self {
            rows: vec![TableRow::default(); states],
            conflicts: vec![],
        }
    }

    /// Emit the tables from the LR(0) automaton and its look-aheads.
    ///
    /// States are visited in order and items in ascending order, so the
    /// first item to claim a cell wins any conflict.
    pub fn generate(env: &Environment, lr0: &LR0Automaton, lookaheads: &Lookaheads) -> Self {
        let _span = tracing::trace_span!("table").entered();

        let mut table = Self::new(lr0.len());
        for state in lr0.states() {
            let id = state.id();
            for item in state.items() {
                let conflict = match item.next_symbol(env) {
                    None if item.production == ProductionID::ACCEPT => {
                        table.insert_action(id, SymbolID::ZERO, Action::Accept)
                    }
                    None => {
                        let mut conflict = None;
                        for symbol in lookaheads.lookaheads(id, *item).iter() {
                            conflict = conflict.or(table.insert_action(
                                id,
                                symbol,
                                Action::Reduce(item.production),
                            ));
                        }
                        conflict
                    }
                    Some(symbol) if env.symbols().is_terminal(symbol) => {
                        match lr0.edge(id, symbol) {
                            Some(target) => table.insert_action(id, symbol, Action::Shift(target)),
                            None => None,
                        }
                    }
                    Some(_) => None,
                };
                if conflict.is_some() {
                    tracing::trace!("conflict while emitting `{}`", item.display(env));
                }
            }
        }

        for (from, symbol, to) in lr0.edges() {
            if !env.symbols().is_terminal(symbol) {
                table.insert_goto(from, symbol, to);
            }
        }

        for conflict in &table.conflicts {
            tracing::warn!("conflict at {}", conflict.display(env));
        }

        table
    }

    /// Write `action` into the cell `(state, symbol)` unless it is already
    /// taken. A different occupant is recorded and returned as a conflict.
    pub fn insert_action(&mut self, state: StateID, symbol: SymbolID, action: Action) -> Option<Conflict> {
        let row = &mut self.rows[state.index()];
        match row.actions.get(&symbol) {
            None => {
                row.actions.insert(symbol, action);
                None
            }
            Some(kept) if *kept == action => None,
            Some(kept) => {
                let conflict = Conflict {
                    state,
                    symbol,
                    kept: *kept,
                    rejected: action,
                };
                self.conflicts.push(conflict);
                Some(conflict)
            }
        }
    }

    pub fn insert_goto(&mut self, state: StateID, symbol: SymbolID, target: StateID) {
        self.rows[state.index()].gotos.insert(symbol, target);
    }

    pub fn action(&self, state: StateID, symbol: SymbolID) -> Option<Action> {
        self.rows
            .get(state.index())
            .and_then(|row| row.actions.get(&symbol).copied())
    }

    pub fn goto(&self, state: StateID, symbol: SymbolID) -> Option<StateID> {
        self.rows
            .get(state.index())
            .and_then(|row| row.gotos.get(&symbol).copied())
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows[..]
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts[..]
    }

    pub fn display<'e>(&'e self, env: &'e Environment) -> impl fmt::Display + 'e {
        display_fn(move |f| {
            let symbols = env.symbols();
            for (i, row) in self.rows.iter().enumerate() {
                if i > 0 {
                    writeln!(f)?;
                }
                writeln!(f, "#### State {:?}", StateID::from_raw(i as u32))?;
                writeln!(f, "## actions")?;
                for (symbol, action) in &row.actions {
                    writeln!(f, "- {} => {}", symbols.name(*symbol), action.display(env))?;
                }
                if !row.gotos.is_empty() {
                    writeln!(f, "## gotos")?;
                    for (symbol, target) in &row.gotos {
                        writeln!(f, "- {} => goto({:?})", symbols.name(*symbol), target)?;
                    }
                }
            }
            if !self.conflicts.is_empty() {
                writeln!(f)?;
                writeln!(f, "#### Conflicts")?;
                for conflict in &self.conflicts {
                    writeln!(f, "- {}", conflict.display(env))?;
                }
            }
            Ok(())
        })
    }
}
