//! Drive a hand-written table for
//!
//! ```text
//! $start : List                                 (0)
//! List   : List , number   $$ = make(",", $3, $1)   (1)
//!        | number          $$ = constant($1)         (2)
//! ```
//!
//! over a token source that does not come from the default scanner.

use elparse_runtime::{
    ParseAction, ParseTable, Position, Production, ScanError, SemanticAction, SyntaxError,
    SyntaxNode, Syntaxer, Token, TokenClass, TokenKind, TokenSource,
};
use std::{rc::Rc, sync::Arc};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Sym {
    Zero,
    Number,
    Comma,
    List,
}

struct Lists {
    actions: [Option<SemanticAction>; 3],
}

impl Lists {
    fn new() -> Self {
        Self {
            actions: [
                None,
                SemanticAction::parse("$$ = make(\",\", $3, $1)").unwrap(),
                SemanticAction::parse("$$ = constant($1)").unwrap(),
            ],
        }
    }
}

impl ParseTable for Lists {
    type State = u8;
    type Symbol = Sym;
    type Production = usize;

    fn initial_state(&self) -> u8 {
        0
    }

    fn token_class(&self, class: TokenClass) -> Sym {
        match class {
            TokenClass::EndOfFile => Sym::Zero,
            TokenClass::Number => Sym::Number,
            // no identifiers or strings in this language.
            TokenClass::Identifier | TokenClass::String => Sym::List,
        }
    }

    fn terminal(&self, text: &str) -> Option<Sym> {
        (text == ",").then_some(Sym::Comma)
    }

    fn action(&self, current: u8, lookahead: Sym) -> ParseAction<u8, usize> {
        match (current, lookahead) {
            (0, Sym::Number) => ParseAction::Shift(2),
            (1, Sym::Zero) => ParseAction::Accept,
            (1, Sym::Comma) => ParseAction::Shift(3),
            (2, Sym::Zero | Sym::Comma) => ParseAction::Reduce(2),
            (3, Sym::Number) => ParseAction::Shift(4),
            (4, Sym::Zero | Sym::Comma) => ParseAction::Reduce(1),
            _ => ParseAction::Error,
        }
    }

    fn goto(&self, current: u8, symbol: Sym) -> Option<u8> {
        (current == 0 && symbol == Sym::List).then_some(1)
    }

    fn production(&self, production: usize) -> Production<'_, Sym> {
        Production {
            lhs: Sym::List,
            len: [1, 3, 1][production],
            action: self.actions[production].as_ref(),
        }
    }

    fn symbol_name(&self, symbol: Sym) -> &str {
        match symbol {
            Sym::Zero => "zero",
            Sym::Number => "number",
            Sym::Comma => ",",
            Sym::List => "List",
        }
    }
}

/// Tokens prepared in advance, one per line.
struct Prepared<'s> {
    tokens: Vec<Token<'s>>,
    cursor: usize,
}

impl<'s> Prepared<'s> {
    fn new(texts: &[&'s str]) -> Self {
        let tokens = texts
            .iter()
            .enumerate()
            .map(|(i, text)| {
                let kind = if text.bytes().all(|b| b.is_ascii_digit()) {
                    TokenKind::Number
                } else {
                    TokenKind::Sign
                };
                Token::new(kind, text, Position::new(i as u32 + 1, 1))
            })
            .collect();
        Self { tokens, cursor: 0 }
    }
}

impl<'s> TokenSource<'s> for Prepared<'s> {
    fn next_token(&mut self) -> Result<Token<'s>, ScanError> {
        match self.tokens.get(self.cursor) {
            Some(token) => {
                self.cursor += 1;
                Ok(*token)
            }
            None => Ok(Token::new(
                TokenKind::EndOfFile,
                "",
                Position::new(self.tokens.len() as u32 + 1, 1),
            )),
        }
    }
}

#[test]
fn left_recursive_list() {
    init_tracing();
    let mut syntaxer = Syntaxer::new(Lists::new());
    let tree = syntaxer.parse(Prepared::new(&["1", ",", "2", ",", "3"])).unwrap();

    let root = tree.root().unwrap();
    assert_eq!(root.tag(), Some(","));
    assert_eq!(root.child(1), Some(&SyntaxNode::Constant(3)));
    let inner = root.child(0).unwrap();
    assert_eq!(inner.tag(), Some(","));
    assert_eq!(inner.child(0), Some(&SyntaxNode::Constant(1)));
    assert_eq!(inner.child(1), Some(&SyntaxNode::Constant(2)));
}

#[test]
fn shared_tables() {
    init_tracing();
    let table = Rc::new(Lists::new());
    let tree = Syntaxer::new(Rc::clone(&table))
        .parse(Prepared::new(&["7"]))
        .unwrap();
    assert_eq!(tree.root(), Some(&SyntaxNode::Constant(7)));

    let table = Arc::new(Lists::new());
    let mut syntaxer = Syntaxer::new(&*table);
    let mut source = Prepared::new(&["7", ",", "8"]);
    let tree = syntaxer.parse(&mut source).unwrap();
    assert_eq!(tree.root().unwrap().children().len(), 2);
    assert_eq!(syntaxer.constants().count(), 2);
}

#[test]
fn error_on_the_line_of_the_token() {
    init_tracing();
    let mut syntaxer = Syntaxer::new(Lists::new());
    let err = syntaxer.parse(Prepared::new(&["1", ",", ","])).unwrap_err();
    assert!(matches!(err, SyntaxError::Unexpected { ref symbol, .. } if symbol == ","));
    assert_eq!(err.position(), Position::new(3, 1));

    let err = syntaxer.parse(Prepared::new(&["1", ","])).unwrap_err();
    assert!(matches!(err, SyntaxError::Unexpected { ref symbol, .. } if symbol == "zero"));
    assert_eq!(err.position(), Position::new(3, 1));
}
