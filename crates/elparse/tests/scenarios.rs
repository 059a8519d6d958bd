use elparse::{
    grammar::{Environment, GrammarError},
    language::{Config, Language},
    runtime::{Position, SyntaxError, SyntaxNode},
    table::Action,
};
use std::{env, path::PathBuf};
use tracing_subscriber::EnvFilter;

fn grammar(name: &str) -> Environment {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let path = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap())
        .join("tests/grammars")
        .join(format!("{}.grammar", name));
    Environment::from_file(path).unwrap()
}

fn constant(node: Option<&SyntaxNode>) -> i64 {
    match node {
        Some(SyntaxNode::Constant(value)) => *value,
        node => panic!("expected a constant, found {:?}", node),
    }
}

fn symbol(node: Option<&SyntaxNode>) -> &str {
    match node {
        Some(SyntaxNode::Symbol(name)) => &**name,
        node => panic!("expected a symbol, found {:?}", node),
    }
}

#[test]
fn precedence_is_structural() {
    let language = Language::build(grammar("expr")).unwrap();
    let tree = language.parse_str("2 + 3 * 4").unwrap();

    let root = tree.root().unwrap();
    assert_eq!(root.tag(), Some("+"));
    assert_eq!(constant(root.child(0)), 2);

    let product = root.child(1).unwrap();
    assert_eq!(product.tag(), Some("*"));
    assert_eq!(constant(product.child(0)), 3);
    assert_eq!(constant(product.child(1)), 4);

    assert_eq!(
        tree.to_string(),
        "└── +\n    ├── 2\n    └── *\n        ├── 3\n        └── 4\n"
    );
}

#[test]
fn parentheses_and_left_associativity() {
    let language = Language::build(grammar("expr")).unwrap();

    let tree = language.parse_str("(1 + 2) * 3").unwrap();
    let root = tree.root().unwrap();
    assert_eq!(root.tag(), Some("*"));
    assert_eq!(root.child(0).unwrap().tag(), Some("+"));
    assert_eq!(constant(root.child(1)), 3);

    let tree = language.parse_str("1 + 2 + 3").unwrap();
    let root = tree.root().unwrap();
    assert_eq!(root.child(0).unwrap().tag(), Some("+"));
    assert_eq!(constant(root.child(1)), 3);
}

#[test]
fn unexpected_token_reports_its_position() {
    let language = Language::build(grammar("expr")).unwrap();
    let err = language.parse_str("2 + )").unwrap_err();
    match err {
        SyntaxError::Unexpected {
            ref symbol,
            position,
            ..
        } => {
            assert_eq!(symbol, ")");
            assert_eq!(position, Position::new(1, 5));
        }
        err => panic!("unexpected error: {:?}", err),
    }
    assert_eq!(err.to_string(), "line 1, column 5: unexpected symbol `)`");

    let err = language.parse_str("1 *\n\n  * 2").unwrap_err();
    assert_eq!(err.position(), Position::new(3, 3));

    let err = language.parse_str("1 +").unwrap_err();
    assert!(matches!(err, SyntaxError::Unexpected { ref symbol, .. } if symbol == "zero"));
}

#[test]
fn epsilon_alternative_leaves_an_absent_child() {
    let language = Language::build(grammar("if_else")).unwrap();

    let tree = language.parse_str("if (x) y;").unwrap();
    let root = tree.root().unwrap();
    assert_eq!(root.tag(), Some("if"));
    assert_eq!(root.children().len(), 3);
    assert_eq!(symbol(root.child(0)), "x");
    assert_eq!(symbol(root.child(1)), "y");
    assert!(root.children()[2].is_none());
    assert!(tree.to_string().ends_with("└── (none)\n"));

    let tree = language.parse_str("if (1) y; else z;").unwrap();
    let root = tree.root().unwrap();
    assert_eq!(constant(root.child(0)), 1);
    assert_eq!(symbol(root.child(2)), "z");
}

#[test]
fn dangling_else_binds_to_the_nearest_if() {
    let language = Language::build(grammar("if_else")).unwrap();

    let conflicts = language.conflicts();
    assert_eq!(conflicts.len(), 1);
    let env = language.environment();
    assert_eq!(env.symbols().name(conflicts[0].symbol), "else");
    assert!(matches!(conflicts[0].kept, Action::Shift(_)));
    assert!(matches!(conflicts[0].rejected, Action::Reduce(_)));

    let tree = language.parse_str("if (a) if (b) c; else d;").unwrap();
    let outer = tree.root().unwrap();
    assert!(outer.children()[2].is_none());
    let inner = outer.child(1).unwrap();
    assert_eq!(inner.tag(), Some("if"));
    assert_eq!(symbol(inner.child(2)), "d");

    let err = Config::new()
        .deny_conflicts(true)
        .build(grammar("if_else"))
        .unwrap_err();
    assert!(matches!(err, GrammarError::Conflicts { ref conflicts } if conflicts.len() == 1));
}

#[test]
fn side_tables_collect_token_values() {
    let language = Language::build(grammar("statements")).unwrap();
    let mut syntaxer = language.syntaxer();
    let tree = syntaxer
        .parse(elparse::runtime::Scanner::new(
            "x = 1;\nprint \"hello\";\nprint x;\n",
        ))
        .unwrap();

    let root = tree.root().unwrap();
    assert_eq!(root.tag(), Some("program"));
    assert_eq!(syntaxer.symbols().collect::<Vec<_>>(), vec!["x"]);
    assert_eq!(syntaxer.literals().collect::<Vec<_>>(), vec!["hello"]);
    assert_eq!(syntaxer.constants().collect::<Vec<_>>(), vec![("1", 1)]);
}

#[test]
fn long_left_recursive_lists() {
    let language = Language::build(grammar("statements")).unwrap();
    let input = "x = 1;\n".repeat(200_000);
    let tree = language.parse_str(&input).unwrap();

    let mut items = tree.root().unwrap().child(0);
    let mut depth = 0;
    while let Some(node) = items {
        assert_eq!(node.tag(), Some("items"));
        assert_eq!(node.child(1).unwrap().tag(), Some("assign"));
        items = node.child(0);
        depth += 1;
    }
    assert_eq!(depth, 200_000);

    drop(tree);
}

#[test]
fn empty_input_reduces_epsilon_only() {
    let language = Language::build(grammar("statements")).unwrap();
    let tree = language.parse_str("").unwrap();
    let root = tree.root().unwrap();
    assert_eq!(root.tag(), Some("program"));
    assert_eq!(root.children(), &[None::<SyntaxNode>]);
}

#[test]
fn action_type_mismatch_is_a_syntax_error() {
    let language: Language = "S\n| identifier\t$$ = constant($1)\n".parse().unwrap();
    let err = language.parse_str("\n  abc").unwrap_err();
    assert!(matches!(err, SyntaxError::Action { .. }));
    assert_eq!(err.position(), Position::new(2, 6));
}

#[test]
fn reader_errors() {
    let err = "E\n| E + T $$ = $1\n".parse::<Environment>().unwrap_err();
    assert!(matches!(err, GrammarError::MissingSeparator { line: 2 }));

    let err = "E\n| T\t$$ = $1\n".parse::<Environment>().unwrap_err();
    assert!(matches!(err, GrammarError::UnknownNonterminal { ref name, .. } if name == "T"));
}
