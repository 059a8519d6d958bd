//! LALR(1) look-ahead sets computation.
//!
//! Look-aheads are found by the classical spontaneous generation and
//! propagation method over the LR(0) automaton: each item is closed with the
//! placeholder look-ahead `$unknown`, terminals that show up in the closure
//! are generated spontaneously, and the placeholder marks where look-aheads
//! flow in from the seed item instead. The propagation graph is then solved
//! with the digraph algorithm of DeRemer and Pennello.

use crate::{
    digraph::digraph,
    first_sets::FirstSets,
    grammar::Environment,
    lr0::{LR0Automaton, LR0Item, StateID},
    symbol::{SymbolID, SymbolSet},
    types::{Map, Set},
    util::display_fn,
};
use std::fmt;

/// The look-ahead set of an item, split by origin.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Forwards {
    spontaneous: SymbolSet,
    propagated: SymbolSet,
}

impl Forwards {
    pub fn spontaneous(&self) -> &SymbolSet {
        &self.spontaneous
    }

    /// The symbols that flowed in from other items and were not already
    /// generated spontaneously.
    pub fn propagated(&self) -> &SymbolSet {
        &self.propagated
    }

    pub fn all(&self) -> SymbolSet {
        let mut all = self.spontaneous.clone();
        all.union_with(&self.propagated);
        all
    }
}

#[derive(Debug)]
pub struct Lookaheads {
    forwards: Map<(StateID, LR0Item), Forwards>,
}

impl Lookaheads {
    pub fn new(env: &Environment, first: &FirstSets, lr0: &LR0Automaton) -> Self {
        let _span = tracing::trace_span!("lalr").entered();

        let mut spontaneous: Map<(StateID, LR0Item), SymbolSet> = Map::default();
        for state in lr0.states() {
            for item in state.items() {
                spontaneous.insert((state.id(), *item), SymbolSet::new());
            }
        }
        let position = |state: StateID, item: LR0Item| {
            spontaneous
                .get_index_of(&(state, item))
                .unwrap_or_else(|| panic!("item `{}` not found in {:?}", item.display(env), state))
        };

        let start = position(StateID::INITIAL, LR0Item::START);
        let mut generated: Vec<(usize, SymbolID)> = vec![(start, SymbolID::ZERO)];
        let mut sources: Vec<Set<usize>> = vec![Set::default(); spontaneous.len()];

        for state in lr0.states() {
            for seed in state.items() {
                let from = position(state.id(), *seed);

                for (item, lookahead) in closure(env, first, *seed) {
                    let to = position(state.id(), item);
                    for symbol in lookahead.iter() {
                        if symbol != SymbolID::UNKNOWN {
                            generated.push((to, symbol));
                        } else if to != from {
                            sources[to].insert(from);
                        }
                    }
                }

                if let Some(symbol) = seed.next_symbol(env) {
                    let target = lr0.edge(state.id(), symbol).unwrap_or_else(|| {
                        panic!(
                            "missing edge ({:?}, {}) for item `{}`",
                            state.id(),
                            env.symbols().name(symbol),
                            seed.display(env)
                        )
                    });
                    sources[position(target, seed.advance())].insert(from);
                }
            }
        }

        for (index, symbol) in generated {
            spontaneous[index].insert(symbol);
        }

        let mut result = spontaneous.clone();
        digraph(&mut result, |x| sources[x].iter().copied());

        let forwards = spontaneous
            .into_iter()
            .zip(result.into_values())
            .map(|((key, spontaneous), all)| {
                let propagated = all.difference(&spontaneous);
                (
                    key,
                    Forwards {
                        spontaneous,
                        propagated,
                    },
                )
            })
            .collect();

        Self { forwards }
    }

    pub fn get(&self, state: StateID, item: LR0Item) -> Option<&Forwards> {
        self.forwards.get(&(state, item))
    }

    /// The full look-ahead set of `item` in `state`.
    ///
    /// # Panics
    /// Panics if `state` does not contain `item`.
    pub fn lookaheads(&self, state: StateID, item: LR0Item) -> SymbolSet {
        match self.get(state, item) {
            Some(forwards) => forwards.all(),
            None => panic!("no look-ahead entry for {:?} in {:?}", item, state),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (StateID, LR0Item, &Forwards)> + '_ {
        self.forwards
            .iter()
            .map(|(&(state, item), forwards)| (state, item, forwards))
    }

    pub fn display<'e>(&'e self, env: &'e Environment) -> impl fmt::Display + 'e {
        display_fn(move |f| {
            let symbols = env.symbols();
            let mut current = None;
            for (&(state, item), forwards) in &self.forwards {
                if current != Some(state) {
                    writeln!(f, "#### State {:?}", state)?;
                    current = Some(state);
                }
                write!(
                    f,
                    "- {}  {}",
                    item.display(env),
                    symbols.display_set(&forwards.spontaneous)
                )?;
                if !forwards.propagated.is_empty() {
                    write!(f, " + {}", symbols.display_set(&forwards.propagated))?;
                }
                writeln!(f)?;
            }
            Ok(())
        })
    }
}

/// Close `{ [seed, $unknown] }`, threading look-aheads through the predicted items.
fn closure(env: &Environment, first: &FirstSets, seed: LR0Item) -> Map<LR0Item, SymbolSet> {
    let mut items: Map<LR0Item, SymbolSet> = Map::default();
    items.insert(seed, Some(SymbolID::UNKNOWN).into_iter().collect());

    let mut changed = true;
    while changed {
        changed = false;
        let mut cursor = 0;
        while let Some((&item, lookahead)) = items.get_index(cursor) {
            cursor += 1;
            let Some(symbol) = item.next_symbol(env) else {
                continue;
            };
            if env.symbols().is_terminal(symbol) {
                continue;
            }

            let mut follow = first.first_of_sequence(item.rest(env));
            if follow.remove(SymbolID::EPSILON) {
                follow.union_with(lookahead);
            }
            for production in env.alternatives_of(symbol) {
                changed |= items
                    .entry(LR0Item::new(production, 0))
                    .or_default()
                    .union_with(&follow);
            }
        }
    }

    items
}
