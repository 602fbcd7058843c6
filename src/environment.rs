use crate::MAX_EVAL_DEPTH;
use crate::config::Policy;
use crate::evaluator::{EvalError, EvalResult, evaluate};
use crate::primitives::Builtin;
use crate::types::{Expr, Value};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use tracing::debug;

/// A function created by `defun`. It keeps no environment of its own: the
/// body is evaluated in a copy of whichever environment invokes it.
#[derive(Debug, Clone, PartialEq)]
pub struct UserFunction {
    pub name: String,
    pub params: Vec<String>,
    pub body: Expr,
}

/// Something a call head can resolve to.
#[derive(Debug, Clone, PartialEq)]
pub enum Function {
    Builtin(Builtin),
    UserDefined(Rc<UserFunction>),
}

// Shared between an environment and every child made from it, so a `defun`
// anywhere is visible everywhere straight away.
type FunctionTable = Rc<RefCell<HashMap<String, Rc<UserFunction>>>>;

// --- Environment Definition ---

#[derive(Debug, Clone)]
pub struct Environment {
    variables: HashMap<String, Value>,
    functions: FunctionTable,
    policy: Policy,
    depth: usize, // List evaluations in progress, including the caller's
}

impl Default for Environment {
    fn default() -> Self {
        Environment::new()
    }
}

impl Environment {
    /// Creates a top-level environment with `T` and `NIL` bound and the
    /// builtin operators available.
    pub fn new() -> Self {
        Environment::with_policy(Policy::default())
    }

    pub fn with_policy(policy: Policy) -> Self {
        let mut variables = HashMap::new();
        variables.insert("T".to_string(), Value::Boolean(true));
        variables.insert("NIL".to_string(), Value::Nil);
        Environment {
            variables,
            functions: Rc::new(RefCell::new(HashMap::new())),
            policy,
            depth: 0,
        }
    }

    /// Creates the environment for one user-function call: a full copy of
    /// this environment's variables and the same function table.
    pub fn new_child(&self) -> Self {
        Environment {
            variables: self.variables.clone(),
            functions: Rc::clone(&self.functions),
            policy: self.policy,
            depth: self.depth,
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Starts one nested list evaluation. Every successful `enter` must be
    /// paired with a `leave`.
    pub(crate) fn enter(&mut self) -> Result<(), EvalError> {
        if self.depth >= MAX_EVAL_DEPTH {
            return Err(EvalError::RecursionLimit(MAX_EVAL_DEPTH));
        }
        self.depth += 1;
        Ok(())
    }

    pub(crate) fn leave(&mut self) {
        self.depth -= 1;
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    /// Evaluates `expr` against this environment. See [`evaluate`].
    pub fn evaluate(&mut self, expr: &Expr) -> EvalResult {
        evaluate(expr, self)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn is_variable(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    /// Binds `name`, replacing any previous value.
    pub fn define(&mut self, name: String, value: Value) {
        debug!(%name, %value, "define");
        self.variables.insert(name, value);
    }

    /// Overwrites an existing binding. Errors if `name` was never defined.
    pub fn set(&mut self, name: &str, value: Value) -> Result<(), EvalError> {
        match self.variables.get_mut(name) {
            Some(slot) => {
                debug!(%name, %value, "set!");
                *slot = value;
                Ok(())
            }
            None => Err(EvalError::UndefinedVariable(name.to_string())),
        }
    }

    /// Registers (or replaces) a user function.
    pub fn defun(&mut self, function: UserFunction) {
        debug!(name = %function.name, params = ?function.params, body = %function.body, "defun");
        self.functions
            .borrow_mut()
            .insert(function.name.clone(), Rc::new(function));
    }

    /// Resolves a call head. User definitions shadow builtins of the same name.
    pub fn lookup_function(&self, name: &str) -> Option<Function> {
        if let Some(function) = self.functions.borrow().get(name) {
            return Some(Function::UserDefined(Rc::clone(function)));
        }
        Builtin::from_name(name).map(Function::Builtin)
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.functions.borrow().contains_key(name) || Builtin::from_name(name).is_some()
    }

    /// Gets every name that can appear in an expression: variables, user
    /// functions and builtins.
    pub fn get_identifiers(&self) -> HashSet<String> {
        let mut identifiers: HashSet<String> = self.variables.keys().cloned().collect();
        identifiers.extend(self.functions.borrow().keys().cloned());
        identifiers.extend(Builtin::ALL.iter().map(|builtin| builtin.name().to_string()));
        identifiers
    }
}
