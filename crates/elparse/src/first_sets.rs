//! Calculation of first set function.

use crate::{
    grammar::Environment,
    symbol::{SymbolID, SymbolSet},
};

#[derive(Debug)]
pub struct FirstSets {
    sets: Vec<SymbolSet>,
}

impl FirstSets {
    pub fn new(env: &Environment) -> Self {
        let symbols = env.symbols();

        // First(t) = {t} for terminals, {} for nonterminals.
        let mut sets: Vec<SymbolSet> = symbols
            .iter()
            .map(|symbol| {
                if symbol.is_terminal() {
                    Some(symbol.id()).into_iter().collect()
                } else {
                    SymbolSet::new()
                }
            })
            .collect();

        let mut changed = true;
        let mut passes = 0;
        while changed {
            changed = false;
            passes += 1;
            for (_, grammar, condinate) in env.productions() {
                let added = first_of_sequence(&sets, condinate.symbols());
                changed |= sets[grammar.lhs().index()].union_with(&added);
            }
        }
        tracing::trace!("first sets converged after {} pass(es)", passes);

        Self { sets }
    }

    /// `First(X)`
    pub fn first_of(&self, symbol: SymbolID) -> &SymbolSet {
        &self.sets[symbol.index()]
    }

    /// `First(X1 X2 ... Xn)`, containing `epsilon` iff every `Xi` is nullable.
    pub fn first_of_sequence(&self, seq: &[SymbolID]) -> SymbolSet {
        first_of_sequence(&self.sets, seq)
    }

    pub fn is_nullable(&self, symbol: SymbolID) -> bool {
        self.first_of(symbol).contains(SymbolID::EPSILON)
    }
}

fn first_of_sequence(sets: &[SymbolSet], seq: &[SymbolID]) -> SymbolSet {
    let mut result = SymbolSet::new();
    for symbol in seq {
        if *symbol == SymbolID::EPSILON {
            continue;
        }
        let first = &sets[symbol.index()];
        result.union_with(first);
        result.remove(SymbolID::EPSILON);
        if !first.contains(SymbolID::EPSILON) {
            return result;
        }
    }
    result.insert(SymbolID::EPSILON);
    result
}
