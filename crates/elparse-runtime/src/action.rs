//! The semantic action language.
//!
//! Each grammar alternative may carry an action of the form `$$ = <call>`,
//! where `<call>` is one of:
//!
//! * `$N` - pass the N-th value through unchanged,
//! * `constant($N)`, `literal($N)`, `symbol($N)` - wrap a token record into a leaf node,
//! * `make("tag", $A, $B, ...)` - build an operation node; `$0` leaves the slot empty.
//!   Apart from `$0`, a value can be referenced only once.
//!
//! References count from the top of the value stack at reduce time, so `$1`
//! is the value of the last symbol of the alternative.

use crate::{
    scanner::Scanner,
    token::{ScanError, Token, TokenKind, TokenSource},
    tree::{SyntaxNode, Value, MAX_SYNTAX_NODE_CHILDREN},
};
use std::{fmt, mem};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SemanticAction {
    Identity(usize),
    Constant(usize),
    Literal(usize),
    Symbol(usize),
    Make { tag: String, args: Vec<usize> },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ActionError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("expected {expected}, found `{found}`")]
    Expected {
        expected: &'static str,
        found: String,
    },

    #[error("unknown action `{0}`")]
    UnknownVerb(String),

    #[error("invalid value reference `{0}`")]
    InvalidIndex(String),

    #[error("unexpected `{0}` after the action")]
    TrailingCharacters(String),

    #[error("too many children ({count}), at most {} are allowed", MAX_SYNTAX_NODE_CHILDREN)]
    TooManyChildren { count: usize },

    #[error("`${0}` is referenced more than once")]
    DuplicateReference(usize),

    #[error("`{verb}` expects a {expected} at ${index}")]
    Mismatch {
        verb: &'static str,
        expected: &'static str,
        index: usize,
    },
}

impl SemanticAction {
    /// Parse an action text. Blank text means the alternative has no action.
    pub fn parse(text: &str) -> Result<Option<Self>, ActionError> {
        let mut parser = ActionParser::new(text)?;
        if parser.lookahead.is_eof() {
            return Ok(None);
        }
        let action = parser.parse_action()?;

        let rest = parser.bump()?;
        if !rest.is_eof() {
            return Err(ActionError::TrailingCharacters(rest.text.to_owned()));
        }

        Ok(Some(action))
    }

    /// Return the largest stack offset referenced by this action.
    pub fn max_index(&self) -> usize {
        match self {
            Self::Identity(n) | Self::Constant(n) | Self::Literal(n) | Self::Symbol(n) => *n,
            Self::Make { args, .. } => args.iter().copied().max().unwrap_or(0),
        }
    }

    /// Synthesize a value from the top of `values`.
    ///
    /// Referenced slots are moved out and left `Empty`; the caller pops them afterwards.
    pub fn invoke(&self, values: &mut [Value]) -> Result<Value, ActionError> {
        match self {
            Self::Identity(n) => Ok(take(values, *n)),

            Self::Constant(n) => match take(values, *n) {
                Value::Constant(value) => Ok(Value::Node(SyntaxNode::Constant(value))),
                Value::Node(node @ SyntaxNode::Constant(_)) => Ok(Value::Node(node)),
                _ => Err(ActionError::Mismatch {
                    verb: "constant",
                    expected: "number",
                    index: *n,
                }),
            },

            Self::Literal(n) => match take(values, *n) {
                Value::Literal(text) => Ok(Value::Node(SyntaxNode::Literal(text))),
                Value::Node(node @ SyntaxNode::Literal(_)) => Ok(Value::Node(node)),
                _ => Err(ActionError::Mismatch {
                    verb: "literal",
                    expected: "string",
                    index: *n,
                }),
            },

            Self::Symbol(n) => match take(values, *n) {
                Value::Symbol(name) => Ok(Value::Node(SyntaxNode::Symbol(name))),
                Value::Node(node @ SyntaxNode::Symbol(_)) => Ok(Value::Node(node)),
                _ => Err(ActionError::Mismatch {
                    verb: "symbol",
                    expected: "identifier",
                    index: *n,
                }),
            },

            Self::Make { tag, args } => {
                let children = args
                    .iter()
                    .map(|&n| match n {
                        0 => None,
                        n => take(values, n).into_node(),
                    })
                    .collect();
                Ok(Value::Node(SyntaxNode::Operation {
                    tag: tag.as_str().into(),
                    children,
                }))
            }
        }
    }
}

impl fmt::Display for SemanticAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$$ = ")?;
        match self {
            Self::Identity(n) => write!(f, "${}", n),
            Self::Constant(n) => write!(f, "constant(${})", n),
            Self::Literal(n) => write!(f, "literal(${})", n),
            Self::Symbol(n) => write!(f, "symbol(${})", n),
            Self::Make { tag, args } => {
                write!(f, "make(\"{}\"", tag)?;
                for arg in args {
                    write!(f, ", ${}", arg)?;
                }
                f.write_str(")")
            }
        }
    }
}

fn take(values: &mut [Value], offset: usize) -> Value {
    let index = values
        .len()
        .checked_sub(offset)
        .unwrap_or_else(|| panic!("${} refers below the bottom of the value stack", offset));
    mem::take(&mut values[index])
}

struct ActionParser<'a> {
    scanner: Scanner<'a>,
    lookahead: Token<'a>,
}

impl<'a> ActionParser<'a> {
    fn new(text: &'a str) -> Result<Self, ActionError> {
        let mut scanner = Scanner::new(text);
        let lookahead = scanner.next_token()?;
        Ok(Self { scanner, lookahead })
    }

    fn bump(&mut self) -> Result<Token<'a>, ActionError> {
        let next = self.scanner.next_token()?;
        Ok(mem::replace(&mut self.lookahead, next))
    }

    fn peek_sign(&self, sign: &str) -> bool {
        self.lookahead.kind == TokenKind::Sign && self.lookahead.text == sign
    }

    fn expect_sign(&mut self, sign: &'static str, expected: &'static str) -> Result<(), ActionError> {
        if !self.peek_sign(sign) {
            return Err(ActionError::Expected {
                expected,
                found: self.lookahead.to_string(),
            });
        }
        self.bump()?;
        Ok(())
    }

    fn expect_reference(&mut self, allow_zero: bool) -> Result<usize, ActionError> {
        let token = self.bump()?;
        if token.kind != TokenKind::Identifier || !token.text.starts_with('$') {
            return Err(ActionError::Expected {
                expected: "a value reference",
                found: token.to_string(),
            });
        }
        parse_index(token.text, allow_zero)
    }

    fn parse_action(&mut self) -> Result<SemanticAction, ActionError> {
        let lhs = self.bump()?;
        if lhs.kind != TokenKind::Identifier || lhs.text != "$$" {
            return Err(ActionError::Expected {
                expected: "`$$`",
                found: lhs.to_string(),
            });
        }
        self.expect_sign("=", "`=`")?;

        let head = self.bump()?;
        if head.kind != TokenKind::Identifier {
            return Err(ActionError::Expected {
                expected: "an action",
                found: head.to_string(),
            });
        }
        if head.text.starts_with('$') {
            return parse_index(head.text, false).map(SemanticAction::Identity);
        }

        match head.text {
            "constant" | "literal" | "symbol" => {
                self.expect_sign("(", "`(`")?;
                let index = self.expect_reference(false)?;
                self.expect_sign(")", "`)`")?;
                Ok(match head.text {
                    "constant" => SemanticAction::Constant(index),
                    "literal" => SemanticAction::Literal(index),
                    _ => SemanticAction::Symbol(index),
                })
            }

            "make" => {
                self.expect_sign("(", "`(`")?;
                let tag = self.bump()?;
                if tag.kind != TokenKind::String {
                    return Err(ActionError::Expected {
                        expected: "a string tag",
                        found: tag.to_string(),
                    });
                }
                let mut args = vec![];
                while self.peek_sign(",") {
                    self.bump()?;
                    let index = self.expect_reference(true)?;
                    // each referenced value is moved into the node
                    if index != 0 && args.contains(&index) {
                        return Err(ActionError::DuplicateReference(index));
                    }
                    args.push(index);
                }
                self.expect_sign(")", "`,` or `)`")?;
                if args.len() > MAX_SYNTAX_NODE_CHILDREN {
                    return Err(ActionError::TooManyChildren { count: args.len() });
                }
                Ok(SemanticAction::Make {
                    tag: tag.text.to_owned(),
                    args,
                })
            }

            verb => Err(ActionError::UnknownVerb(verb.to_owned())),
        }
    }
}

fn parse_index(text: &str, allow_zero: bool) -> Result<usize, ActionError> {
    let digits = &text[1..];
    match digits.parse::<usize>() {
        Ok(0) if !allow_zero => Err(ActionError::InvalidIndex(text.to_owned())),
        Ok(index) if digits.bytes().all(|b| b.is_ascii_digit()) => Ok(index),
        _ => Err(ActionError::InvalidIndex(text.to_owned())),
    }
}
