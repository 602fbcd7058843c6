use num_rational::Ratio;
use std::fmt; // For custom display formatting

pub const QUOTE: &str = "quote";

/// A parsed S-expression. This is the code side: the evaluator walks it,
/// and `quote` hands it back as data after converting it into a [`Value`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Integer(i64),    // e.g., 42, -7
    Symbol(String),  // e.g., +, square, set!
    List(Vec<Expr>), // e.g., (+ 1 2), (), (quote x)
}

impl Expr {
    pub fn symbol(name: &str) -> Self {
        Expr::Symbol(name.to_string())
    }

    /// Wraps `expr` as `(quote expr)`. Both the `'` shorthand and the
    /// long form end up in this shape.
    pub fn quoted(expr: Expr) -> Self {
        Expr::List(vec![Expr::symbol(QUOTE), expr])
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Expr::Symbol(name) => Some(name),
            _ => None,
        }
    }
}

// Canonical source text: atoms as written, lists parenthesized and space-joined.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Integer(n) => write!(f, "{}", n),
            Expr::Symbol(s) => write!(f, "{}", s),
            Expr::List(list) => {
                write!(f, "(")?;
                write_joined(f, list)?;
                write!(f, ")")
            }
        }
    }
}

/// The runtime result of evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Integer(i64),
    Rational(Ratio<i64>), // Always in lowest terms with a denominator other than 1
    Boolean(bool),        // T is true; NIL is bound to Nil, not false
    Symbol(String),
    List(Vec<Value>), // Dotted pairs are stored as [a, ., b]
    Nil,
}

impl Value {
    pub fn symbol(name: &str) -> Self {
        Value::Symbol(name.to_string())
    }

    /// Builds a number, collapsing whole rationals into integers so that
    /// `(/ 4 2)` and `2` compare equal.
    pub fn from_ratio(ratio: Ratio<i64>) -> Self {
        if ratio.is_integer() {
            Value::Integer(ratio.to_integer())
        } else {
            Value::Rational(ratio)
        }
    }

    /// `nil`, `false` and the empty list are false; everything else
    /// (including 0) is true.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Boolean(false)) && !self.is_empty_list()
    }

    pub fn is_empty_list(&self) -> bool {
        matches!(self, Value::List(items) if items.is_empty())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Rational(_) => "rational",
            Value::Boolean(_) => "boolean",
            Value::Symbol(_) => "symbol",
            Value::List(_) => "list",
            Value::Nil => "nil",
        }
    }
}

// Quoting turns code into data without evaluating any of it.
impl From<&Expr> for Value {
    fn from(expr: &Expr) -> Self {
        match expr {
            Expr::Integer(n) => Value::Integer(*n),
            Expr::Symbol(s) => Value::Symbol(s.clone()),
            Expr::List(items) => Value::List(items.iter().map(Value::from).collect()),
        }
    }
}

// The reverse direction, used when `defun` is applied to already-evaluated
// values through `mapcar`. Only integer/symbol/list data is code.
impl TryFrom<&Value> for Expr {
    type Error = &'static str;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Integer(n) => Ok(Expr::Integer(*n)),
            Value::Symbol(s) => Ok(Expr::Symbol(s.clone())),
            Value::List(items) => items
                .iter()
                .map(Expr::try_from)
                .collect::<Result<Vec<_>, _>>()
                .map(Expr::List),
            other => Err(other.type_name()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil | Value::Boolean(false) => write!(f, "NIL"),
            Value::Boolean(true) => write!(f, "T"),
            Value::List(list) if list.is_empty() => write!(f, "NIL"),
            Value::List(list) => {
                write!(f, "(")?;
                write_joined(f, list)?;
                write!(f, ")")
            }
            Value::Integer(n) => write!(f, "{}", n),
            Value::Rational(r) => write!(f, "{}/{}", r.numer(), r.denom()),
            Value::Symbol(s) => write!(f, "{}", s),
        }
    }
}

fn write_joined<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    let mut first = true;
    for item in items {
        if !first {
            write!(f, " ")?;
        }
        write!(f, "{}", item)?;
        first = false;
    }
    Ok(())
}

/// Renders a value the way the REPL prints it.
pub fn format_value(value: &Value) -> String {
    value.to_string()
}
