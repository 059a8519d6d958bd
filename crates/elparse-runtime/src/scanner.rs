//! The default scanner, used both for source files and for action texts.

use crate::token::{Position, ScanError, Token, TokenKind, TokenSource, MAX_TOKEN_CHARACTERS};
use logos::Logos;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Logos)]
#[logos(skip r"[ \t\r\f]+")]
#[logos(skip r"#[^\n]*")]
enum Lexeme {
    #[token("\n")]
    Newline,

    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*")]
    Identifier,

    #[regex(r"[0-9]+")]
    Number,

    #[regex(r#""[^"\n]*""#)]
    String,

    #[regex(r#""[^"\n]*"#)]
    UnterminatedString,

    #[token("<<=")]
    #[token(">>=")]
    #[token("++")]
    #[token("--")]
    #[token("+=")]
    #[token("-=")]
    #[token("*=")]
    #[token("/=")]
    #[token("%=")]
    #[token("&=")]
    #[token("|=")]
    #[token("^=")]
    #[token("<<")]
    #[token(">>")]
    #[token("<=")]
    #[token(">=")]
    #[token("==")]
    #[token("!=")]
    #[token("&&")]
    #[token("||")]
    #[token("+")]
    #[token("-")]
    #[token("*")]
    #[token("/")]
    #[token("%")]
    #[token("&")]
    #[token("|")]
    #[token("^")]
    #[token("~")]
    #[token("<")]
    #[token(">")]
    #[token("=")]
    #[token("!")]
    #[token("{")]
    #[token("}")]
    #[token("(")]
    #[token(")")]
    #[token("[")]
    #[token("]")]
    #[token(";")]
    #[token(":")]
    #[token(",")]
    #[token(".")]
    #[token("?")]
    Sign,
}

/// Splits a source text into tokens, tracking line and column numbers.
pub struct Scanner<'source> {
    lexer: logos::Lexer<'source, Lexeme>,
    line: u32,
    line_start: usize,
}

impl<'source> Scanner<'source> {
    pub fn new(source: &'source str) -> Self {
        Self {
            lexer: Lexeme::lexer(source),
            line: 1,
            line_start: 0,
        }
    }

    fn position_at(&self, offset: usize) -> Position {
        let column = self.lexer.source()[self.line_start..offset].chars().count() + 1;
        Position::new(self.line, column as u32)
    }
}

impl<'source> TokenSource<'source> for Scanner<'source> {
    fn next_token(&mut self) -> Result<Token<'source>, ScanError> {
        loop {
            let Some(lexeme) = self.lexer.next() else {
                let end = self.lexer.source().len();
                return Ok(Token::new(TokenKind::EndOfFile, "", self.position_at(end)));
            };

            let span = self.lexer.span();
            let position = self.position_at(span.start);
            let mut text = self.lexer.slice();

            let kind = match lexeme {
                Ok(Lexeme::Newline) => {
                    self.line += 1;
                    self.line_start = span.end;
                    continue;
                }
                Ok(Lexeme::Identifier) => TokenKind::Identifier,
                Ok(Lexeme::Number) => TokenKind::Number,
                Ok(Lexeme::String) => {
                    text = &text[1..text.len() - 1];
                    TokenKind::String
                }
                Ok(Lexeme::UnterminatedString) => {
                    return Err(ScanError::UnterminatedString { position });
                }
                Ok(Lexeme::Sign) => TokenKind::Sign,
                Err(()) => {
                    return Err(ScanError::InvalidCharacter {
                        text: text.to_owned(),
                        position,
                    });
                }
            };

            if text.chars().count() > MAX_TOKEN_CHARACTERS {
                return Err(ScanError::TokenTooLong {
                    text: text.to_owned(),
                    position,
                });
            }

            return Ok(Token::new(kind, text, position));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(source: &str) -> Vec<(TokenKind, String, u32, u32)> {
        let mut scanner = Scanner::new(source);
        let mut tokens = vec![];
        loop {
            let token = scanner.next_token().unwrap();
            tokens.push((
                token.kind,
                token.text.to_owned(),
                token.position.line,
                token.position.column,
            ));
            if token.is_eof() {
                break;
            }
        }
        tokens
    }

    #[test]
    fn smoke() {
        use TokenKind::*;
        assert_eq!(
            scan("x = 12 + \"ab\""),
            vec![
                (Identifier, "x".into(), 1, 1),
                (Sign, "=".into(), 1, 3),
                (Number, "12".into(), 1, 5),
                (Sign, "+".into(), 1, 8),
                (String, "ab".into(), 1, 10),
                (EndOfFile, "".into(), 1, 14),
            ]
        );
    }

    #[test]
    fn action_references_are_identifiers() {
        use TokenKind::*;
        let tokens = scan("$$ = make(\"+\", $3, $1)");
        let kinds: Vec<_> = tokens.iter().map(|t| (t.0, t.1.as_str())).collect();
        assert_eq!(
            kinds,
            vec![
                (Identifier, "$$"),
                (Sign, "="),
                (Identifier, "make"),
                (Sign, "("),
                (String, "+"),
                (Sign, ","),
                (Identifier, "$3"),
                (Sign, ","),
                (Identifier, "$1"),
                (Sign, ")"),
                (EndOfFile, ""),
            ]
        );
    }

    #[test]
    fn longest_sign_wins() {
        let tokens = scan("a <<= b <= c < d");
        let signs: Vec<_> = tokens
            .iter()
            .filter(|t| t.0 == TokenKind::Sign)
            .map(|t| t.1.as_str())
            .collect();
        assert_eq!(signs, vec!["<<=", "<=", "<"]);
    }

    #[test]
    fn tracks_lines_and_skips_comments() {
        let tokens = scan("if # trailing comment\n  x\n\n    then");
        assert_eq!((tokens[0].2, tokens[0].3), (1, 1));
        assert_eq!((tokens[1].2, tokens[1].3), (2, 3));
        assert_eq!((tokens[2].1.as_str(), tokens[2].2, tokens[2].3), ("then", 4, 5));
    }

    #[test]
    fn eof_is_sticky() {
        let mut scanner = Scanner::new("a");
        assert_eq!(scanner.next_token().unwrap().kind, TokenKind::Identifier);
        assert!(scanner.next_token().unwrap().is_eof());
        assert!(scanner.next_token().unwrap().is_eof());
    }

    #[test]
    fn errors() {
        let mut scanner = Scanner::new("a @");
        scanner.next_token().unwrap();
        let err = scanner.next_token();
        assert!(matches!(
            err,
            Err(ScanError::InvalidCharacter { ref text, position }) if text == "@" && position == Position::new(1, 3)
        ));

        let err = Scanner::new("\"abc").next_token();
        assert!(matches!(err, Err(ScanError::UnterminatedString { .. })));

        let long = "x".repeat(MAX_TOKEN_CHARACTERS + 1);
        let err = Scanner::new(&long).next_token();
        assert!(matches!(err, Err(ScanError::TokenTooLong { .. })));
    }
}
