//! LR(0) automaton construction.

use crate::{
    grammar::{Environment, ProductionID},
    symbol::SymbolID,
    types::{Map, Set},
    util::display_fn,
};
use std::fmt;

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateID(u32);

impl StateID {
    pub const INITIAL: Self = Self(0);

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for StateID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S#{:03}", self.0)
    }
}

impl fmt::Display for StateID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// The LR(0) item, a.k.a. LR item core.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LR0Item {
    pub production: ProductionID,
    pub index: u16,
}

impl LR0Item {
    /// `$start : . S`
    pub const START: Self = Self {
        production: ProductionID::ACCEPT,
        index: 0,
    };

    pub fn new(production: ProductionID, index: u16) -> Self {
        Self { production, index }
    }

    /// The symbol right after the dot, or `None` if the item is complete.
    pub fn next_symbol(&self, env: &Environment) -> Option<SymbolID> {
        let (_, condinate) = env.production(self.production);
        condinate.symbols().get(self.index as usize).copied()
    }

    /// The symbols after the one right after the dot.
    pub fn rest<'e>(&self, env: &'e Environment) -> &'e [SymbolID] {
        let (_, condinate) = env.production(self.production);
        condinate
            .symbols()
            .get(self.index as usize + 1..)
            .unwrap_or(&[])
    }

    pub fn is_complete(&self, env: &Environment) -> bool {
        self.next_symbol(env).is_none()
    }

    pub fn advance(self) -> Self {
        Self {
            index: self.index + 1,
            ..self
        }
    }

    pub fn display<'e>(&'e self, env: &'e Environment) -> impl fmt::Display + 'e {
        display_fn(move |f| {
            let (grammar, condinate) = env.production(self.production);
            debug_assert!(
                self.index as usize <= condinate.len(),
                "the dot of {:?} is past the end of its alternative",
                self
            );
            let symbols = env.symbols();
            write!(f, "{} :", symbols.name(grammar.lhs()))?;
            for (i, symbol) in condinate.symbols().iter().enumerate() {
                if i == self.index as usize {
                    f.write_str(" .")?;
                }
                write!(f, " {}", symbols.name(*symbol))?;
            }
            if condinate.len() == self.index as usize {
                f.write_str(" .")?;
            }
            Ok(())
        })
    }
}

/// A closed set of LR(0) items, i.e. a state of the automaton.
#[derive(Debug, Clone)]
pub struct Itemset {
    id: StateID,
    items: Vec<LR0Item>,
}

impl Itemset {
    pub fn id(&self) -> StateID {
        self.id
    }

    /// The items in ascending order.
    pub fn items(&self) -> &[LR0Item] {
        &self.items[..]
    }

    /// The items whose dot is not at the start, plus the initial item.
    pub fn kernels(&self) -> impl Iterator<Item = LR0Item> + '_ {
        self.items
            .iter()
            .copied()
            .filter(|item| item.index > 0 || *item == LR0Item::START)
    }

    pub fn contains(&self, item: &LR0Item) -> bool {
        self.items.binary_search(item).is_ok()
    }
}

#[derive(Debug)]
pub struct LR0Automaton {
    states: Vec<Itemset>,
    edges: Map<(StateID, SymbolID), StateID>,
}

impl LR0Automaton {
    /// Build the canonical collection of LR(0) itemsets.
    pub fn new(env: &Environment) -> Self {
        let mut builder = Builder {
            env,
            states: vec![],
            index: Map::default(),
            memo: Map::default(),
        };
        builder.build();

        let edges = builder
            .memo
            .into_iter()
            .filter_map(|(key, target)| Some((key, target?)))
            .collect();

        Self {
            states: builder.states,
            edges,
        }
    }

    pub fn states(&self) -> &[Itemset] {
        &self.states[..]
    }

    pub fn state(&self, id: StateID) -> &Itemset {
        &self.states[id.index()]
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn edge(&self, from: StateID, symbol: SymbolID) -> Option<StateID> {
        self.edges.get(&(from, symbol)).copied()
    }

    /// All defined edges, in discovery order.
    pub fn edges(&self) -> impl Iterator<Item = (StateID, SymbolID, StateID)> + '_ {
        self.edges
            .iter()
            .map(|(&(from, symbol), &to)| (from, symbol, to))
    }

    pub fn display<'e>(&'e self, env: &'e Environment) -> impl fmt::Display + 'e {
        display_fn(move |f| {
            for state in &self.states {
                writeln!(f, "#### State {:?}", state.id)?;
                for item in &state.items {
                    writeln!(f, "- {}", item.display(env))?;
                }
                for (&(from, symbol), to) in &self.edges {
                    if from == state.id {
                        writeln!(f, "  {} => {:?}", env.symbols().name(symbol), to)?;
                    }
                }
            }
            Ok(())
        })
    }
}

struct Builder<'e> {
    env: &'e Environment,
    states: Vec<Itemset>,
    index: Map<Vec<LR0Item>, StateID>,
    memo: Map<(StateID, SymbolID), Option<StateID>>,
}

impl Builder<'_> {
    fn build(&mut self) {
        let _span = tracing::trace_span!("lr0").entered();

        let initial = self.closure([LR0Item::START]);
        self.intern(initial);

        let env = self.env;
        let symbols = env.symbols();
        let edge_symbols: Vec<SymbolID> = symbols
            .terminals()
            .filter(|t| !matches!(*t, SymbolID::EPSILON | SymbolID::UNKNOWN))
            .chain(symbols.nonterminals().filter(|n| *n != SymbolID::START))
            .collect();

        loop {
            let discovered = (self.states.len(), self.memo.len());
            for state in 0..self.states.len() {
                for &symbol in &edge_symbols {
                    self.edge_target(StateID(state as u32), symbol);
                }
            }
            if (self.states.len(), self.memo.len()) == discovered {
                break;
            }
        }
    }

    /// Close `seed` under the prediction of nonterminals after the dot.
    fn closure(&self, seed: impl IntoIterator<Item = LR0Item>) -> Vec<LR0Item> {
        let mut items: Set<LR0Item> = seed.into_iter().collect();
        let mut cursor = 0;
        while cursor < items.len() {
            let item = items[cursor];
            cursor += 1;
            let Some(symbol) = item.next_symbol(self.env) else {
                continue;
            };
            if self.env.symbols().is_terminal(symbol) {
                continue;
            }
            for production in self.env.alternatives_of(symbol) {
                items.insert(LR0Item::new(production, 0));
            }
        }
        let mut items: Vec<_> = items.into_iter().collect();
        items.sort_unstable();
        items
    }

    fn edge_target(&mut self, from: StateID, symbol: SymbolID) -> Option<StateID> {
        if let Some(target) = self.memo.get(&(from, symbol)) {
            return *target;
        }

        let kernels: Vec<LR0Item> = self.states[from.index()]
            .items
            .iter()
            .filter(|item| item.next_symbol(self.env) == Some(symbol))
            .map(|item| item.advance())
            .collect();

        let target = if kernels.is_empty() {
            None
        } else {
            let items = self.closure(kernels);
            Some(self.intern(items))
        };
        self.memo.insert((from, symbol), target);
        target
    }

    /// Return the state with exactly these items, creating it if needed.
    fn intern(&mut self, items: Vec<LR0Item>) -> StateID {
        if let Some(id) = self.index.get(&items) {
            return *id;
        }
        let id = StateID(self.states.len() as u32);
        tracing::debug!("new state {:?} with {} item(s)", id, items.len());
        self.index.insert(items.clone(), id);
        self.states.push(Itemset { id, items });
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr_env() -> Environment {
        "\
E
| E + T\t
| T\t

T
| T * F\t
| F\t

F
| ( E )\t
| number\t
"
        .parse()
        .unwrap()
    }

    #[test]
    fn expression_automaton() {
        let env = expr_env();
        let lr0 = LR0Automaton::new(&env);
        assert_eq!(lr0.len(), 12);

        let initial = lr0.state(StateID::INITIAL);
        assert!(initial.contains(&LR0Item::START));
        assert_eq!(initial.items().len(), 7);
        assert_eq!(initial.kernels().collect::<Vec<_>>(), vec![LR0Item::START]);

        let e = env.symbols().get("E").unwrap();
        let accepting = lr0.edge(StateID::INITIAL, e).unwrap();
        assert!(lr0.state(accepting).contains(&LR0Item::START.advance()));
        assert_eq!(lr0.edge(StateID::INITIAL, SymbolID::STRING), None);
    }

    #[test]
    fn states_are_canonical() {
        let env = expr_env();
        let lr0 = LR0Automaton::new(&env);
        let mut seen = Set::default();
        for state in lr0.states() {
            assert!(seen.insert(state.items().to_vec()), "duplicated {:?}", state.id());
        }

        // `(` leads to the same state from every state that can shift it.
        let open = env.symbols().get("(").unwrap();
        let targets: Set<StateID> = lr0
            .edges()
            .filter(|(_, symbol, _)| *symbol == open)
            .map(|(_, _, to)| to)
            .collect();
        assert_eq!(targets.len(), 1);
    }

    #[test]
    fn item_display() {
        let env = expr_env();
        let item = LR0Item::new(ProductionID::new(1, 0), 1);
        assert_eq!(item.display(&env).to_string(), "E : E . + T");
        assert_eq!(item.advance().advance().display(&env).to_string(), "E : E + T .");
        assert_eq!(LR0Item::START.display(&env).to_string(), "$start : . E");
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "past the end")]
    fn item_display_rejects_overrun() {
        let env = expr_env();
        let item = LR0Item::new(ProductionID::new(1, 0), 4);
        let _ = item.display(&env).to_string();
    }

    #[test]
    fn epsilon_alternatives_are_complete_at_once() {
        let env: Environment = "S\n| a S\t\n| epsilon\t\n".parse().unwrap();
        let lr0 = LR0Automaton::new(&env);
        let empty = LR0Item::new(ProductionID::new(1, 1), 0);
        assert!(empty.is_complete(&env));
        assert!(lr0.state(StateID::INITIAL).contains(&empty));
        assert_eq!(lr0.len(), 4);
    }
}
