//! An LALR(1) parser generator with an embedded semantic action language.
//!
//! ```
//! use elparse::language::Language;
//!
//! let language: Language = "\
//! E
//! \t| E + number\t$$ = make(\"+\", $3, $1)
//! \t| number\t$$ = constant($1)
//! "
//! .parse()
//! .unwrap();
//!
//! let tree = language.parse_str("1 + 2").unwrap();
//! assert_eq!(tree.root().unwrap().tag(), Some("+"));
//! ```

pub mod first_sets;
pub mod grammar;
pub mod lalr;
pub mod language;
pub mod lr0;
pub mod serialize;
pub mod symbol;
pub mod table;

mod digraph;
mod reader;
mod types;
mod util;

pub use elparse_runtime as runtime;
