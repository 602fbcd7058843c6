// Declare modules publicly so they are part of the library interface
pub mod config;
pub mod environment;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod pretty_print;
pub mod primitives;
pub mod session;
pub mod source;
pub mod types;

/// Deepest nesting of lists and quotes the parser accepts.
pub const MAX_PARSE_DEPTH: usize = 128;

/// Deepest nesting of list evaluations, counted across user-function calls.
/// Hitting it is an error, not a stack overflow.
pub const MAX_EVAL_DEPTH: usize = 256;

pub use config::{ConditionalPolicy, HeadVariablePolicy, Policy, Settings};
pub use environment::Environment;
pub use evaluator::{EvalError, EvalResult, evaluate};
pub use lexer::{Token, TokenKind, tokenize};
pub use parser::{ParseError, Parser, parse_str};
pub use session::{Outcome, Session};
pub use source::Span;
pub use types::{Expr, Value, format_value};
