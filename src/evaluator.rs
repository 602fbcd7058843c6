use crate::config::{ConditionalPolicy, HeadVariablePolicy};
use crate::environment::{Environment, Function, UserFunction};
use crate::primitives::Builtin;
use crate::types::{Expr, QUOTE, Value};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;
use tracing::trace;

// --- Evaluation Error ---
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("Malformed syntax: {0}")]
    MalformedSyntax(String), // e.g. (quote a b)
    #[error("Unknown function: {0}")]
    UnknownFunction(String),
    #[error("Variable '{0}' is not defined")]
    UndefinedVariable(String), // set! on a name that was never defined
    #[error("Function '{name}' expects {expected} arguments, got {found}")]
    ArityMismatch {
        name: String,
        expected: Arity,
        found: usize,
    },
    #[error("Type mismatch in '{operator}': expected {expected}, got {found}")]
    TypeMismatch {
        operator: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("Integer overflow in '{0}'")]
    IntegerOverflow(String), // Operator whose result left the 32-bit range
    #[error("Division by zero is not allowed")]
    DivisionByZero,
    #[error("Domain error in '{operator}': {message}")]
    DomainError { operator: String, message: String },
    #[error("Recursion too deep: evaluation nested more than {0} levels")]
    RecursionLimit(usize),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exactly(n) => write!(f, "{}", n),
            Arity::AtLeast(n) => write!(f, "at least {}", n),
        }
    }
}

// Result type alias for convenience
pub type EvalResult<T = Value> = Result<T, EvalError>;

/// Forms recognised by name before the function table is consulted.
pub fn special_form_identifiers() -> HashSet<String> {
    [QUOTE, "set!", "defun", "mapcar"]
        .into_iter()
        .map(String::from)
        .collect()
}

// --- Evaluate Function ---

/// Evaluates an expression within the given environment.
///
/// Atoms: a bound symbol yields its value; numbers and unbound symbols
/// evaluate to themselves. Lists: `()` is nil, otherwise the head decides
/// between a variable reference, `quote`, a special form or a call.
pub fn evaluate(expr: &Expr, env: &mut Environment) -> EvalResult {
    match expr {
        Expr::Integer(n) => Ok(Value::Integer(*n)),
        Expr::Symbol(name) => Ok(env
            .get(name)
            .cloned()
            .unwrap_or_else(|| Value::Symbol(name.clone()))),
        Expr::List(elements) => match elements.split_first() {
            None => Ok(Value::Nil), // `()` is not a call
            Some((head, operands)) => {
                env.enter()?;
                let result = evaluate_list(expr, head, operands, env);
                env.leave();
                result
            }
        },
    }
}

fn evaluate_list(
    expr: &Expr,
    head: &Expr,
    operands: &[Expr],
    env: &mut Environment,
) -> EvalResult {
    trace!(%expr, "evaluate");

    if let Some(name) = head.as_symbol() {
        if let Some(value) = head_variable(name, env) {
            return Ok(value);
        }
        if name == QUOTE {
            return evaluate_quote(operands);
        }
    }

    let (name, function) = match head
        .as_symbol()
        .and_then(|name| env.lookup_function(name).map(|function| (name, function)))
    {
        Some(found) => found,
        None => return Err(EvalError::UnknownFunction(head.to_string())),
    };

    match (name, &function) {
        ("set!", _) => evaluate_set(operands, env),
        // The operands are the definition itself, not values.
        ("defun", _) => Builtin::Defun.apply(operands.iter().map(Value::from).collect(), env),
        ("mapcar", _) if operands.len() < 2 => Err(EvalError::ArityMismatch {
            name: name.to_string(),
            expected: Arity::AtLeast(2),
            found: operands.len(),
        }),
        // Always the builtin, even when a user function takes the name.
        ("mapcar", _) => {
            let args = evaluate_operands(operands, env)?;
            Builtin::Mapcar.apply(args, env)
        }
        (_, Function::Builtin(builtin @ (Builtin::If | Builtin::And | Builtin::Or)))
            if env.policy().conditionals == ConditionalPolicy::Lazy =>
        {
            evaluate_lazy_conditional(*builtin, operands, env)
        }
        _ => {
            let args = evaluate_operands(operands, env)?;
            apply_function(function, args, env)
        }
    }
}

// Left to right, stopping at the first error.
fn evaluate_operands(operands: &[Expr], env: &mut Environment) -> EvalResult<Vec<Value>> {
    operands
        .iter()
        .map(|operand| evaluate(operand, env))
        .collect()
}

/// A list whose head names a variable evaluates to that variable. Under
/// `HeadVariablePolicy::Call`, names that are also functions are left to
/// call dispatch.
fn head_variable(name: &str, env: &Environment) -> Option<Value> {
    match env.policy().head_variable {
        HeadVariablePolicy::Call if env.has_function(name) => None,
        _ => env.get(name).cloned(),
    }
}

fn evaluate_quote(operands: &[Expr]) -> EvalResult {
    if let [quoted] = operands {
        // Returned as data, nothing inside is evaluated.
        Ok(Value::from(quoted))
    } else {
        Err(EvalError::MalformedSyntax(
            "quote expects exactly one argument".to_string(),
        ))
    }
}

fn evaluate_set(operands: &[Expr], env: &mut Environment) -> EvalResult {
    if let [name, value] = operands {
        let value = evaluate(value, env)?;
        Builtin::Set.apply(vec![Value::from(name), value], env)
    } else {
        Err(EvalError::ArityMismatch {
            name: "set!".to_string(),
            expected: Arity::Exactly(2),
            found: operands.len(),
        })
    }
}

// `if`/`and`/`or` evaluating only what they need. Results match the eager
// builtins whenever every operand evaluates cleanly.
fn evaluate_lazy_conditional(
    builtin: Builtin,
    operands: &[Expr],
    env: &mut Environment,
) -> EvalResult {
    match (builtin, operands) {
        (Builtin::If, [condition, consequent, alternative]) => {
            if evaluate(condition, env)? == Value::Boolean(true) {
                evaluate(consequent, env)
            } else {
                evaluate(alternative, env)
            }
        }
        (Builtin::And, [left, right]) => {
            let left = evaluate(left, env)?;
            if left.is_truthy() {
                evaluate(right, env)
            } else {
                Ok(left)
            }
        }
        (Builtin::Or, [left, right]) => {
            let left = evaluate(left, env)?;
            if left.is_truthy() {
                Ok(left)
            } else {
                evaluate(right, env)
            }
        }
        _ => Err(EvalError::ArityMismatch {
            name: builtin.name().to_string(),
            expected: Arity::Exactly(if builtin == Builtin::If { 3 } else { 2 }),
            found: operands.len(),
        }),
    }
}

/// Calls the function named `name` with already-evaluated arguments.
pub fn apply(name: &str, args: Vec<Value>, env: &mut Environment) -> EvalResult {
    match env.lookup_function(name) {
        Some(function) => apply_function(function, args, env),
        None => Err(EvalError::UnknownFunction(name.to_string())),
    }
}

fn apply_function(function: Function, args: Vec<Value>, env: &mut Environment) -> EvalResult {
    match function {
        Function::Builtin(builtin) => builtin.apply(args, env),
        Function::UserDefined(user_function) => call_user_function(&user_function, args, env),
    }
}

/// Runs a user function in a throwaway copy of the calling environment with
/// the parameters bound on top. Nothing the body binds survives the call,
/// except functions, since the table is shared.
fn call_user_function(function: &UserFunction, args: Vec<Value>, env: &Environment) -> EvalResult {
    if args.len() != function.params.len() {
        return Err(EvalError::ArityMismatch {
            name: function.name.clone(),
            expected: Arity::Exactly(function.params.len()),
            found: args.len(),
        });
    }

    let mut local_env = env.new_child();
    for (param, arg) in function.params.iter().zip(args) {
        local_env.define(param.clone(), arg);
    }

    trace!(name = %function.name, "enter");
    let result = evaluate(&function.body, &mut local_env);
    trace!(name = %function.name, ok = result.is_ok(), "exit");
    result
}
