//! Grammar source reader.
//!
//! ```text
//! Expr
//!     | Expr + Term	$$ = make("+", $3, $1)
//!     | Term	$$ = $1
//!
//! Term
//!     | number	$$ = constant($1)
//! ```
//!
//! Each paragraph defines one nonterminal. The first line names it, and every
//! following line is an alternative whose body is separated from its action by
//! a single TAB.

use crate::{
    grammar::{Environment, EnvironmentDef, GrammarError},
    symbol::SymbolID,
};
use std::{fs, path::Path, str::FromStr};

impl Environment {
    /// Read a grammar from a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, GrammarError> {
        let source = fs::read_to_string(path.as_ref())?;
        source.parse()
    }
}

impl FromStr for Environment {
    type Err = GrammarError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        Environment::define(|def| read_paragraphs(def, source))
    }
}

fn read_paragraphs(def: &mut EnvironmentDef, source: &str) -> Result<(), GrammarError> {
    let mut lhs: Option<SymbolID> = None;

    for (i, line) in source.lines().enumerate() {
        let line_no = i + 1;
        let at_line = |source| GrammarError::AtLine {
            line: line_no,
            source: Box::new(source),
        };
        if line.trim().is_empty() {
            lhs = None;
            continue;
        }

        let lhs = match lhs {
            Some(lhs) => lhs,
            None => {
                let name = line.trim().trim_end_matches(':').trim_end();
                if name.is_empty() || name.contains(char::is_whitespace) {
                    return Err(GrammarError::Syntax {
                        line: line_no,
                        message: format!("invalid left-hand side `{}`", line.trim()),
                    });
                }
                lhs = Some(def.symbol(name).map_err(at_line)?);
                continue;
            }
        };

        let (body, action) = split_alternative(line).ok_or(GrammarError::MissingSeparator { line: line_no })?;
        let rhs = body
            .split_whitespace()
            .map(|name| def.symbol(name))
            .collect::<Result<Vec<_>, _>>()
            .map_err(at_line)?;
        if rhs.is_empty() {
            return Err(GrammarError::Syntax {
                line: line_no,
                message: "empty production body (write `epsilon`)".into(),
            });
        }

        def.alternative(lhs, action, rhs).map_err(at_line)?;
    }

    Ok(())
}

/// Split `[\t]? | body<TAB>action` into its body and action text.
fn split_alternative(line: &str) -> Option<(&str, &str)> {
    let line = line.trim_start_matches([':', '\t', '\n', ' ']);
    let line = line.strip_prefix('|').unwrap_or(line);
    line.split_once('\t')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::ProductionID;

    const EXPR: &str = "\
E
\t| E + T\t$$ = make(\"+\", $3, $1)
\t| T\t$$ = $1

T
\t| number\t$$ = constant($1)
";

    #[test]
    fn paragraphs() {
        let env: Environment = EXPR.parse().unwrap();
        let e = env.symbols().get("E").unwrap();
        let t = env.symbols().get("T").unwrap();
        assert_eq!(env.grammar(e).unwrap().condinates().len(), 2);
        assert_eq!(env.grammar(t).unwrap().condinates().len(), 1);
        assert_eq!(env.start_symbol(), e);
        assert_eq!(
            env.display_production(ProductionID::new(1, 0)).to_string(),
            "E : E + T"
        );
    }

    #[test]
    fn lenient_markers() {
        let env: Environment = "S:\n: a S\t\n  |b\t$$ = $1\n".parse().unwrap();
        let s = env.symbols().get("S").unwrap();
        let grammar = env.grammar(s).unwrap();
        assert_eq!(grammar.condinates().len(), 2);
        assert!(grammar.condinates()[0].action().is_none());
        assert!(grammar.condinates()[1].action().is_some());
    }

    #[test]
    fn merges_paragraphs_with_the_same_lhs() {
        let env: Environment = "S\n| a\t\n\nS\n| b\t\n".parse().unwrap();
        let s = env.symbols().get("S").unwrap();
        assert_eq!(env.grammar(s).unwrap().condinates().len(), 2);
    }

    #[test]
    fn missing_tab_reports_the_line() {
        let err = "S\n| a\t\n| b $$ = $1\n".parse::<Environment>().unwrap_err();
        assert!(matches!(err, GrammarError::MissingSeparator { line: 3 }), "{:?}", err);
    }

    #[test]
    fn definition_errors_carry_the_line() {
        let err = "S\n| a\t\n| b\t$$ = $4\n".parse::<Environment>().unwrap_err();
        match err {
            GrammarError::AtLine { line, source } => {
                assert_eq!(line, 3);
                assert!(matches!(*source, GrammarError::ActionOutOfRange { .. }));
            }
            err => panic!("unexpected error: {:?}", err),
        }

        let err = "S\n|\t$$ = $1\n".parse::<Environment>().unwrap_err();
        assert!(matches!(err, GrammarError::Syntax { line: 2, .. }));
    }

    #[test]
    fn display_is_readable() {
        let env: Environment = EXPR.parse().unwrap();
        let reread: Environment = env.to_string().parse().unwrap();
        assert_eq!(env.to_string(), reread.to_string());
    }
}
