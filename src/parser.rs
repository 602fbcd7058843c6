use crate::{MAX_PARSE_DEPTH, Span};
use crate::lexer::{Token, TokenKind, tokenize};
use crate::types::Expr;
use std::vec::IntoIter; // To iterate over Vec<Token>
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("Parse Error [at {span}]: {message}")]
    MalformedSyntax { message: String, span: Span },
    #[error("Parse Error [at {span}]: unmatched opening parenthesis")]
    UnbalancedParenthesis { span: Span }, // Span of the '(' that never closes
}

impl ParseError {
    fn malformed(message: &str, span: Span) -> Self {
        ParseError::MalformedSyntax {
            message: message.to_string(),
            span,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            ParseError::MalformedSyntax { span, .. } | ParseError::UnbalancedParenthesis { span } => {
                *span
            }
        }
    }
}

// Result type alias for convenience
type ParseResult<T> = Result<T, ParseError>;

/// Consumes the tokens *inside* a list, left to right.
pub struct Parser {
    tokens: IntoIter<Token>,
    depth: usize, // Lists and quotes currently open around the next token
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser::with_depth(tokens, 0)
    }

    fn with_depth(tokens: Vec<Token>, depth: usize) -> Self {
        Parser {
            tokens: tokens.into_iter(),
            depth,
        }
    }

    fn descend(&mut self, span: Span) -> ParseResult<()> {
        self.depth += 1;
        check_depth(self.depth, span)
    }

    // Consumes the next token if available.
    fn next_token(&mut self) -> Option<Token> {
        self.tokens.next()
    }

    /// Parses every remaining token as an element of one list. The enclosing
    /// parens must already be stripped, so any `)` met at this level is stray.
    pub fn parse_list(mut self) -> ParseResult<Vec<Expr>> {
        self.parse_elements(None)
    }

    /// Collects elements until the `)` matching `open`, or until the tokens
    /// run out when there is no enclosing paren.
    fn parse_elements(&mut self, open: Option<Span>) -> ParseResult<Vec<Expr>> {
        let mut elements = Vec::new();
        loop {
            match self.next_token() {
                Some(Token {
                    kind: TokenKind::LParen,
                    span,
                }) => {
                    self.descend(span)?;
                    elements.push(Expr::List(self.parse_elements(Some(span))?));
                    self.depth -= 1;
                }
                Some(Token {
                    kind: TokenKind::RParen,
                    span,
                }) => {
                    return match open {
                        Some(_) => Ok(elements),
                        None => Err(ParseError::malformed("unexpected closing parenthesis", span)),
                    };
                }
                Some(Token {
                    kind: TokenKind::Quote,
                    span,
                }) => elements.push(self.parse_quoted(span)?),
                Some(Token {
                    kind: TokenKind::Atom(text),
                    span,
                }) => elements.push(parse_text(&text, span.start, self.depth)?),
                None => {
                    return match open {
                        Some(span) => Err(ParseError::UnbalancedParenthesis { span }),
                        None => Ok(elements),
                    };
                }
            }
        }
    }

    /// Parses whatever follows a lone `'` and wraps it as `(quote X)`.
    fn parse_quoted(&mut self, quote_span: Span) -> ParseResult<Expr> {
        self.descend(quote_span)?;
        let quoted = self.parse_quote_target(quote_span)?;
        self.depth -= 1;
        Ok(Expr::quoted(quoted))
    }

    fn parse_quote_target(&mut self, quote_span: Span) -> ParseResult<Expr> {
        Ok(match self.next_token() {
            Some(Token {
                kind: TokenKind::LParen,
                span,
            }) => {
                self.descend(span)?;
                let list = Expr::List(self.parse_elements(Some(span))?);
                self.depth -= 1;
                list
            }
            Some(Token {
                kind: TokenKind::Quote,
                span,
            }) => self.parse_quoted(span)?,
            Some(Token {
                kind: TokenKind::Atom(text),
                span,
            }) => parse_text(&text, span.start, self.depth)?,
            Some(Token {
                kind: TokenKind::RParen,
                span,
            }) => {
                return Err(ParseError::malformed(
                    "quote must be followed by an expression",
                    quote_span.merge(span),
                ));
            }
            None => return Err(ParseError::malformed("unexpected end after quote", quote_span)),
        })
    }
}

/// Parses one expression from raw text.
pub fn parse_str(input: &str) -> ParseResult<Expr> {
    parse_text(input, 0, 0)
}

fn check_depth(depth: usize, span: Span) -> ParseResult<()> {
    if depth > MAX_PARSE_DEPTH {
        Err(ParseError::malformed("expression nested too deeply", span))
    } else {
        Ok(())
    }
}

// `offset` is where `text` starts in the full input, so spans in errors
// point at the right place after recursing into a slice. `depth` counts the
// lists and quotes already open around it.
fn parse_text(text: &str, offset: usize, depth: usize) -> ParseResult<Expr> {
    let offset = offset + (text.len() - text.trim_start().len());
    let trimmed = text.trim();
    let span = Span::new(offset, offset + trimmed.len());

    if let Some(rest) = trimmed.strip_prefix('\'') {
        if rest.trim().is_empty() {
            return Err(ParseError::malformed("unexpected end after quote", span));
        }
        check_depth(depth + 1, Span::new(offset, offset + 1))?;
        return Ok(Expr::quoted(parse_text(rest, offset + 1, depth + 1)?));
    }

    if is_integer(trimmed) {
        return trimmed
            .parse::<i64>()
            .map(Expr::Integer)
            .map_err(|_| ParseError::malformed("integer literal out of range", span));
    }

    if trimmed.starts_with('(') {
        if !trimmed.ends_with(')') {
            return Err(ParseError::UnbalancedParenthesis {
                span: Span::new(offset, offset + 1),
            });
        }
        let mut tokens: Vec<Token> = tokenize(trimmed)
            .into_iter()
            .map(|token| Token {
                kind: token.kind,
                span: token.span.shift(offset),
            })
            .collect();
        // Drop the outer parens; the text starts with '(' and ends with ')'.
        tokens.pop();
        tokens.remove(0);
        check_depth(depth + 1, Span::new(offset, offset + 1))?;
        return Parser::with_depth(tokens, depth + 1)
            .parse_list()
            .map(Expr::List);
    }

    if trimmed.is_empty() {
        return Err(ParseError::malformed("expected an expression", span));
    }
    if trimmed
        .chars()
        .any(|c| c.is_whitespace() || c == '(' || c == ')')
    {
        return Err(ParseError::malformed("expected a single expression", span));
    }

    // Symbols are resolved at evaluation time, not here.
    Ok(Expr::Symbol(trimmed.to_string()))
}

// An optional leading '-' followed by at least one digit and nothing else.
fn is_integer(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}
