//! Token model shared by the scanner, the action language and the driver.

use std::fmt;

/// The maximum number of characters in a single token.
pub const MAX_TOKEN_CHARACTERS: usize = 32;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TokenKind {
    EndOfFile,
    Identifier,
    Number,
    String,
    /// Operators and punctuation, identified by their text.
    Sign,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::EndOfFile => "end of file",
            Self::Identifier => "identifier",
            Self::Number => "number",
            Self::String => "string",
            Self::Sign => "sign",
        })
    }
}

/// 1-based location of a token in the input.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Token<'source> {
    pub kind: TokenKind,
    /// The token text. String literals do not include the surrounding quotes.
    pub text: &'source str,
    pub position: Position,
}

impl<'source> Token<'source> {
    pub const fn new(kind: TokenKind, text: &'source str, position: Position) -> Self {
        Self {
            kind,
            text,
            position,
        }
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::EndOfFile
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::EndOfFile => f.write_str("<eof>"),
            TokenKind::String => write!(f, "\"{}\"", self.text),
            _ => f.write_str(self.text),
        }
    }
}

/// A producer of tokens consumed by the driver.
///
/// Once the input is exhausted, implementations must keep returning
/// `EndOfFile` tokens.
pub trait TokenSource<'source> {
    fn next_token(&mut self) -> Result<Token<'source>, ScanError>;
}

impl<'source, T: ?Sized> TokenSource<'source> for &mut T
where
    T: TokenSource<'source>,
{
    fn next_token(&mut self) -> Result<Token<'source>, ScanError> {
        (**self).next_token()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScanError {
    #[error("{position}: invalid character `{text}`")]
    InvalidCharacter { text: String, position: Position },

    #[error("{position}: unterminated string literal")]
    UnterminatedString { position: Position },

    #[error("{position}: token `{text}` exceeds {} characters", MAX_TOKEN_CHARACTERS)]
    TokenTooLong { text: String, position: Position },
}

impl ScanError {
    pub fn position(&self) -> Position {
        match self {
            Self::InvalidCharacter { position, .. }
            | Self::UnterminatedString { position }
            | Self::TokenTooLong { position, .. } => *position,
        }
    }
}
