use logos::Logos;
use std::fmt;

use crate::Span;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"\s+")] // Skip whitespace
pub enum TokenKind {
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    // A lone quote mark. A quote glued to text (`'a`) lexes as an Atom and
    // the parser unwraps it.
    #[token("'", priority = 3)]
    Quote,
    // Anything else up to whitespace or a paren: symbols, numbers, `'x`.
    #[regex(r"[^\s()]+", |lex| lex.slice().to_string())]
    Atom(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::Quote => write!(f, "'"),
            TokenKind::Atom(s) => write!(f, "{}", s),
        }
    }
}

/// Splits `input` into tokens. Every non-whitespace character belongs to
/// some token, so tokenizing cannot fail; malformed input is left for the
/// parser to reject.
pub fn tokenize(input: &str) -> Vec<Token> {
    TokenKind::lexer(input)
        .spanned()
        .map(|(result, range)| Token {
            // The Atom rule covers every character the other rules and the
            // skip pattern leave over, so the error arm is unreachable in practice.
            kind: result.unwrap_or_else(|()| TokenKind::Atom(input[range.clone()].to_string())),
            span: Span::new(range.start, range.end),
        })
        .collect()
}
