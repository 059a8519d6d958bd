//! Runtime support for the parsers built by `elparse`.
//!
//! This crate holds everything the shift-reduce driver needs at parse time:
//! the token model and the default scanner, the semantic action language,
//! the syntax tree, and the abstraction over compiled parse tables.

pub mod action;
pub mod definition;
pub mod scanner;
pub mod syntaxer;
pub mod token;
pub mod tree;

pub use crate::{
    action::{ActionError, SemanticAction},
    definition::{ParseAction, ParseTable, Production, TokenClass},
    scanner::Scanner,
    syntaxer::{SyntaxError, Syntaxer},
    token::{Position, ScanError, Token, TokenKind, TokenSource},
    tree::{SyntaxNode, SyntaxTree, Value},
};
