use elparse::{
    first_sets::FirstSets,
    grammar::Environment,
    language::Language,
    lr0::{LR0Automaton, StateID},
    table::Action,
};
use std::{collections::HashSet, env, path::PathBuf};

fn load(name: &str) -> Environment {
    let path = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap())
        .join("tests/grammars")
        .join(format!("{}.grammar", name));
    Environment::from_file(path).unwrap()
}

macro_rules! define_tests {
    ($($name:ident),*$(,)?) => {$(
        mod $name {
            use super::*;

            #[test]
            fn itemsets_are_canonical() {
                let env = load(stringify!($name));
                let lr0 = LR0Automaton::new(&env);
                let mut seen = HashSet::new();
                for state in lr0.states() {
                    assert!(seen.insert(state.items().to_vec()), "duplicated itemset {:?}", state.id());
                }
            }

            #[test]
            fn shiftable_terminals_have_actions() {
                let env = load(stringify!($name));
                let lr0 = LR0Automaton::new(&env);
                let language = Language::build(load(stringify!($name))).unwrap();
                for (from, symbol, _) in lr0.edges() {
                    if env.symbols().is_terminal(symbol) {
                        assert!(
                            language.table().action(from, symbol).is_some(),
                            "missing action at ({:?}, {})",
                            from,
                            env.symbols().name(symbol)
                        );
                    }
                }
            }

            #[test]
            fn first_sets_are_fixed_points() {
                let env = load(stringify!($name));
                let first = FirstSets::new(&env);
                for (_, grammar, condinate) in env.productions() {
                    let mut lhs = first.first_of(grammar.lhs()).clone();
                    let rhs = first.first_of_sequence(condinate.symbols());
                    assert!(!lhs.union_with(&rhs), "FIRST({}) is not closed", env.symbols().name(grammar.lhs()));
                }
                let again = FirstSets::new(&env);
                for symbol in env.symbols().iter() {
                    assert_eq!(first.first_of(symbol.id()), again.first_of(symbol.id()));
                }
            }

            #[test]
            fn persistence_round_trip() {
                let language = Language::build(load(stringify!($name))).unwrap();
                let mut buf = vec![];
                language.save(&mut buf).unwrap();
                let loaded = Language::load(&buf[..]).unwrap();
                assert_same_tables(&language, &loaded);
            }
        }
    )*};
}

define_tests! {
    expr,
    if_else,
    lvalue,
    statements,
}

/// Compare two tables by symbol name.
fn assert_same_tables(expected: &Language, actual: &Language) {
    let (ex_env, ac_env) = (expected.environment(), actual.environment());
    assert_eq!(expected.table().len(), actual.table().len());

    let describe = |env: &Environment, action: Option<Action>| match action {
        Some(Action::Shift(next)) => format!("shift {:?}", next),
        Some(Action::Reduce(p)) => format!("reduce {}", env.display_production(p)),
        Some(Action::Accept) => "accept".to_owned(),
        None => "error".to_owned(),
    };

    for state in 0..expected.table().len() {
        let state = StateID::from_raw(state as u32);
        for symbol in ex_env.symbols().iter() {
            let other = ac_env.symbols().get(symbol.name()).unwrap();
            if symbol.is_terminal() {
                assert_eq!(
                    describe(ex_env, expected.table().action(state, symbol.id())),
                    describe(ac_env, actual.table().action(state, other)),
                    "action ({:?}, {})",
                    state,
                    symbol
                );
            } else {
                assert_eq!(
                    expected.table().goto(state, symbol.id()),
                    actual.table().goto(state, other),
                    "goto ({:?}, {})",
                    state,
                    symbol
                );
            }
        }
    }
}

#[test]
fn conflicts_by_fixture() {
    for name in ["expr", "lvalue", "statements"] {
        let language = Language::build(load(name)).unwrap();
        assert!(language.conflicts().is_empty(), "{} has conflicts", name);
    }
    let language = Language::build(load("if_else")).unwrap();
    assert_eq!(language.conflicts().len(), 1);
}
