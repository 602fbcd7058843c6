use crate::environment::{Environment, UserFunction};
use crate::evaluator::{self, Arity, EvalError, EvalResult};
use crate::types::{Expr, Value};
use num_rational::Ratio;
use num_traits::{CheckedAdd, CheckedDiv, CheckedMul, CheckedSub, One, Signed, Zero};

type Number = Ratio<i64>;

// Every arithmetic result must fit a 32-bit signed integer.
const INT_MIN: i64 = i32::MIN as i64;
const INT_MAX: i64 = i32::MAX as i64;

/// The fixed set of native operators.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Builtin {
    Add,
    Sub,
    Mul,
    Div,
    Sqrt,
    Pow,
    Greater,
    Less,
    Equal,
    NotEqual,
    And,
    Or,
    Not,
    Car,
    Cdr,
    Cons,
    Define,
    If,
    Set,
    Defun,
    Mapcar,
}

impl Builtin {
    pub const ALL: [Builtin; 21] = [
        Builtin::Add,
        Builtin::Sub,
        Builtin::Mul,
        Builtin::Div,
        Builtin::Sqrt,
        Builtin::Pow,
        Builtin::Greater,
        Builtin::Less,
        Builtin::Equal,
        Builtin::NotEqual,
        Builtin::And,
        Builtin::Or,
        Builtin::Not,
        Builtin::Car,
        Builtin::Cdr,
        Builtin::Cons,
        Builtin::Define,
        Builtin::If,
        Builtin::Set,
        Builtin::Defun,
        Builtin::Mapcar,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Add => "+",
            Builtin::Sub => "-",
            Builtin::Mul => "*",
            Builtin::Div => "/",
            Builtin::Sqrt => "sqrt",
            Builtin::Pow => "pow",
            Builtin::Greater => ">",
            Builtin::Less => "<",
            Builtin::Equal => "=",
            Builtin::NotEqual => "!=",
            Builtin::And => "and",
            Builtin::Or => "or",
            Builtin::Not => "not",
            Builtin::Car => "car",
            Builtin::Cdr => "cdr",
            Builtin::Cons => "cons",
            Builtin::Define => "define",
            Builtin::If => "if",
            Builtin::Set => "set!",
            Builtin::Defun => "defun",
            Builtin::Mapcar => "mapcar",
        }
    }

    pub fn from_name(name: &str) -> Option<Builtin> {
        Builtin::ALL
            .iter()
            .copied()
            .find(|builtin| builtin.name() == name)
    }

    /// Applies the operator to already-evaluated arguments.
    pub fn apply(self, args: Vec<Value>, env: &mut Environment) -> EvalResult {
        match self {
            Builtin::Add => prim_add(args),
            Builtin::Sub => prim_sub(args),
            Builtin::Mul => prim_mul(args),
            Builtin::Div => prim_div(args),
            Builtin::Sqrt => prim_sqrt(args),
            Builtin::Pow => prim_pow(args),
            Builtin::Greater => compare_numbers(args, ">", |left, right| left > right),
            Builtin::Less => compare_numbers(args, "<", |left, right| left < right),
            Builtin::Equal => prim_equals(args, "=", true),
            Builtin::NotEqual => prim_equals(args, "!=", false),
            Builtin::And => prim_and(args),
            Builtin::Or => prim_or(args),
            Builtin::Not => prim_not(args),
            Builtin::Car => prim_car(args),
            Builtin::Cdr => prim_cdr(args),
            Builtin::Cons => prim_cons(args),
            Builtin::Define => prim_define(args, env),
            Builtin::If => prim_if(args),
            Builtin::Set => prim_set(args, env),
            Builtin::Defun => prim_defun(args, env),
            Builtin::Mapcar => prim_mapcar(args, env),
        }
    }
}

// Unpacks exactly N arguments or reports the count that was given.
fn expect_args<const N: usize>(args: Vec<Value>, name: &str) -> EvalResult<[Value; N]> {
    let found = args.len();
    args.try_into().map_err(|_| EvalError::ArityMismatch {
        name: name.to_string(),
        expected: Arity::Exactly(N),
        found,
    })
}

fn type_mismatch(operator: &str, expected: &'static str, found: &Value) -> EvalError {
    EvalError::TypeMismatch {
        operator: operator.to_string(),
        expected,
        found: found.type_name(),
    }
}

fn overflow(operator: &str) -> EvalError {
    EvalError::IntegerOverflow(operator.to_string())
}

fn expect_number(value: &Value, operator: &str) -> EvalResult<Number> {
    match value {
        Value::Integer(n) => Ok(Number::from_integer(*n)),
        Value::Rational(r) => Ok(*r),
        other => Err(type_mismatch(operator, "a number", other)),
    }
}

fn expect_symbol(value: Value, operator: &str) -> EvalResult<String> {
    match value {
        Value::Symbol(name) => Ok(name),
        other => Err(type_mismatch(operator, "a symbol", &other)),
    }
}

// Range check shared by every arithmetic result.
fn check_32bit(number: Number, operator: &str) -> EvalResult {
    if number < Number::from_integer(INT_MIN) || number > Number::from_integer(INT_MAX) {
        Err(overflow(operator))
    } else {
        Ok(Value::from_ratio(number))
    }
}

// --- Arithmetic ---

pub fn prim_add(args: Vec<Value>) -> EvalResult {
    // (+) -> 0
    // (+ 1 2 3) -> 6, range checked once at the end
    let mut sum = Number::zero();
    for arg in &args {
        sum = sum
            .checked_add(&expect_number(arg, "+")?)
            .ok_or_else(|| overflow("+"))?;
    }
    check_32bit(sum, "+")
}

pub fn prim_sub(args: Vec<Value>) -> EvalResult {
    let [left, right] = expect_args(args, "-")?;
    let difference = expect_number(&left, "-")?
        .checked_sub(&expect_number(&right, "-")?)
        .ok_or_else(|| overflow("-"))?;
    check_32bit(difference, "-")
}

pub fn prim_mul(args: Vec<Value>) -> EvalResult {
    // (*) -> 1
    // (* 2 3 4) -> 24, range checked after every step
    let mut product = Number::one();
    for arg in &args {
        product = product
            .checked_mul(&expect_number(arg, "*")?)
            .ok_or_else(|| overflow("*"))?;
        check_32bit(product, "*")?;
    }
    check_32bit(product, "*")
}

pub fn prim_div(args: Vec<Value>) -> EvalResult {
    // (/ 1 2) -> 1/2, exact
    let [left, right] = expect_args(args, "/")?;
    let dividend = expect_number(&left, "/")?;
    let divisor = expect_number(&right, "/")?;
    if divisor.is_zero() {
        return Err(EvalError::DivisionByZero);
    }
    let quotient = dividend
        .checked_div(&divisor)
        .ok_or_else(|| overflow("/"))?;
    check_32bit(quotient, "/")
}

pub fn prim_sqrt(args: Vec<Value>) -> EvalResult {
    let [arg] = expect_args(args, "sqrt")?;
    let number = expect_number(&arg, "sqrt")?;
    if number.is_negative() {
        return Err(EvalError::DomainError {
            operator: "sqrt".to_string(),
            message: "cannot compute square root of a negative number".to_string(),
        });
    }
    // floor(sqrt(x)) == isqrt(floor(x)) for x >= 0
    let root = number.floor().to_integer().isqrt();
    check_32bit(Number::from_integer(root), "sqrt")
}

pub fn prim_pow(args: Vec<Value>) -> EvalResult {
    let [base, exponent] = expect_args(args, "pow")?;
    let base = expect_number(&base, "pow")?;
    let exponent = match exponent {
        Value::Integer(n) => n,
        Value::Rational(_) => {
            return Err(EvalError::DomainError {
                operator: "pow".to_string(),
                message: "exponent must be an integer".to_string(),
            });
        }
        other => return Err(type_mismatch("pow", "an integer exponent", &other)),
    };
    let magnitude = usize::try_from(exponent.unsigned_abs()).map_err(|_| overflow("pow"))?;
    let power = num_traits::checked_pow(base, magnitude).ok_or_else(|| overflow("pow"))?;
    if exponent >= 0 {
        check_32bit(power, "pow")
    } else if power.is_zero() {
        Err(EvalError::DivisionByZero)
    } else if *power.numer() == i64::MIN {
        // The reciprocal would have to negate this numerator.
        Err(overflow("pow"))
    } else {
        check_32bit(power.recip(), "pow")
    }
}

// --- Comparison ---

fn compare_numbers<F: Fn(Number, Number) -> bool>(
    args: Vec<Value>,
    operator: &str,
    compare: F,
) -> EvalResult {
    let [left, right] = expect_args(args, operator)?;
    let left = expect_number(&left, operator)?;
    let right = expect_number(&right, operator)?;
    Ok(Value::Boolean(compare(left, right)))
}

// `=` and `!=` compare any two values structurally.
fn prim_equals(args: Vec<Value>, operator: &str, want_equal: bool) -> EvalResult {
    let [left, right] = expect_args(args, operator)?;
    Ok(Value::Boolean((left == right) == want_equal))
}

// --- Logic ---

pub fn prim_and(args: Vec<Value>) -> EvalResult {
    // Yields the first operand if it is false, else the second
    let [left, right] = expect_args(args, "and")?;
    Ok(if left.is_truthy() { right } else { left })
}

pub fn prim_or(args: Vec<Value>) -> EvalResult {
    let [left, right] = expect_args(args, "or")?;
    Ok(if left.is_truthy() { left } else { right })
}

pub fn prim_not(args: Vec<Value>) -> EvalResult {
    let [arg] = expect_args(args, "not")?;
    Ok(Value::Boolean(!arg.is_truthy()))
}

/// Picks between two values that have already been computed. Only the
/// exact true value selects the consequent.
pub fn prim_if(args: Vec<Value>) -> EvalResult {
    let [condition, consequent, alternative] = expect_args(args, "if")?;
    Ok(if condition == Value::Boolean(true) {
        consequent
    } else {
        alternative
    })
}

// --- List Primitives ---

pub fn prim_car(args: Vec<Value>) -> EvalResult {
    // (car list) -> first item; a non-list comes back unchanged
    let [arg] = expect_args(args, "car")?;
    match arg {
        Value::List(items) => Ok(items.into_iter().next().unwrap_or(Value::Nil)),
        other => Ok(other),
    }
}

pub fn prim_cdr(args: Vec<Value>) -> EvalResult {
    // (cdr list) -> rest of list as a new list
    let [arg] = expect_args(args, "cdr")?;
    match arg {
        Value::List(items) if items.is_empty() => Ok(Value::Nil),
        Value::List(items) => Ok(Value::List(items[1..].to_vec())),
        other => Err(type_mismatch("cdr", "a list", &other)),
    }
}

pub fn prim_cons(args: Vec<Value>) -> EvalResult {
    // (cons 1 '(2)) -> (1 2); (cons 1 2) -> (1 . 2)
    let [head, tail] = expect_args(args, "cons")?;
    let head = if head.is_empty_list() { Value::Nil } else { head };
    let tail = if tail.is_empty_list() { Value::Nil } else { tail };
    match (head, tail) {
        (Value::Nil, Value::Nil) => Ok(Value::Nil),
        (head, Value::List(items)) => {
            let mut list = Vec::with_capacity(items.len() + 1);
            list.push(head);
            list.extend(items);
            Ok(Value::List(list))
        }
        (head, tail) => Ok(Value::List(vec![head, Value::symbol("."), tail])),
    }
}

// --- Environment and state ---

pub fn prim_define(args: Vec<Value>, env: &mut Environment) -> EvalResult {
    let [name, value] = expect_args(args, "define")?;
    let name = expect_symbol(name, "define")?;
    env.define(name.clone(), value);
    Ok(Value::Symbol(name))
}

pub fn prim_set(args: Vec<Value>, env: &mut Environment) -> EvalResult {
    let [name, value] = expect_args(args, "set!")?;
    let name = expect_symbol(name, "set!")?;
    env.set(&name, value)?;
    Ok(Value::Symbol(name))
}

/// `(defun name (params...) body)` with its operands taken as data.
pub fn prim_defun(args: Vec<Value>, env: &mut Environment) -> EvalResult {
    let [name, params, body] = expect_args(args, "defun")?;
    let name = expect_symbol(name, "defun")?;
    let params = match params {
        Value::List(items) => items
            .into_iter()
            .map(|param| expect_symbol(param, "defun"))
            .collect::<EvalResult<Vec<_>>>()?,
        other => return Err(type_mismatch("defun", "a parameter list", &other)),
    };
    let body = Expr::try_from(&body).map_err(|found| EvalError::TypeMismatch {
        operator: "defun".to_string(),
        expected: "an expression body",
        found,
    })?;
    env.defun(UserFunction {
        name: name.clone(),
        params,
        body,
    });
    Ok(Value::Symbol(name))
}

/// Applies the named function to each positional tuple of the list
/// arguments, stopping at the shortest list.
pub fn prim_mapcar(mut args: Vec<Value>, env: &mut Environment) -> EvalResult {
    if args.len() < 2 {
        return Err(EvalError::ArityMismatch {
            name: "mapcar".to_string(),
            expected: Arity::AtLeast(2),
            found: args.len(),
        });
    }
    let function = expect_symbol(args.remove(0), "mapcar")?;
    let lists = args
        .into_iter()
        .map(|arg| match arg {
            Value::List(items) => Ok(items),
            other => Err(type_mismatch("mapcar", "a list", &other)),
        })
        .collect::<EvalResult<Vec<_>>>()?;

    let length = lists.iter().map(Vec::len).min().unwrap_or(0);
    let mut results = Vec::with_capacity(length);
    for index in 0..length {
        let tuple = lists.iter().map(|list| list[index].clone()).collect();
        results.push(evaluator::apply(&function, tuple, env)?);
    }
    Ok(Value::List(results))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(n: i64) -> Value {
        Value::Integer(n)
    }

    fn ratio(numer: i64, denom: i64) -> Value {
        Value::Rational(Ratio::new(numer, denom))
    }

    fn list(items: Vec<Value>) -> Value {
        Value::List(items)
    }

    fn call(builtin: Builtin, args: Vec<Value>) -> EvalResult {
        builtin.apply(args, &mut Environment::new())
    }

    fn assert_error_kind(result: EvalResult, expected: EvalError) {
        match result {
            Ok(value) => panic!("Expected {:?}, got {:?}", expected, value),
            Err(e) => assert_eq!(
                std::mem::discriminant(&e),
                std::mem::discriminant(&expected),
                "Expected error variant like {:?}, got: {:?}",
                expected,
                e
            ),
        }
    }

    fn overflow_error() -> EvalError {
        EvalError::IntegerOverflow(String::new())
    }

    fn arity_error() -> EvalError {
        EvalError::ArityMismatch {
            name: String::new(),
            expected: Arity::Exactly(0),
            found: 0,
        }
    }

    fn type_error() -> EvalError {
        EvalError::TypeMismatch {
            operator: String::new(),
            expected: "",
            found: "",
        }
    }

    fn domain_error() -> EvalError {
        EvalError::DomainError {
            operator: String::new(),
            message: String::new(),
        }
    }

    #[test]
    fn test_names_round_trip() {
        for builtin in Builtin::ALL {
            assert_eq!(Builtin::from_name(builtin.name()), Some(builtin));
        }
        assert_eq!(Builtin::from_name("lambda"), None);
    }

    #[test]
    fn test_add_and_mul() {
        assert_eq!(call(Builtin::Add, vec![]), Ok(int(0)));
        assert_eq!(call(Builtin::Add, vec![int(1), int(2), int(3)]), Ok(int(6)));
        assert_eq!(call(Builtin::Add, vec![ratio(1, 2), ratio(1, 2)]), Ok(int(1)));
        assert_eq!(call(Builtin::Mul, vec![]), Ok(int(1)));
        assert_eq!(call(Builtin::Mul, vec![int(2), int(3), int(4)]), Ok(int(24)));
        assert_eq!(call(Builtin::Mul, vec![ratio(2, 3), int(3)]), Ok(int(2)));
    }

    #[test]
    fn test_add_checks_only_final_sum() {
        assert_eq!(
            call(Builtin::Add, vec![int(INT_MAX), int(1), int(-1)]),
            Ok(int(INT_MAX))
        );
        assert_error_kind(call(Builtin::Add, vec![int(INT_MAX), int(1)]), overflow_error());
        assert_error_kind(call(Builtin::Add, vec![int(INT_MIN), int(-1)]), overflow_error());
    }

    #[test]
    fn test_mul_checks_every_step() {
        assert_error_kind(
            call(Builtin::Mul, vec![int(65536), int(65536), int(0)]),
            overflow_error(),
        );
        assert_error_kind(call(Builtin::Mul, vec![int(i64::MAX), int(2)]), overflow_error());
    }

    #[test]
    fn test_sub() {
        assert_eq!(call(Builtin::Sub, vec![int(10), int(3)]), Ok(int(7)));
        assert_eq!(call(Builtin::Sub, vec![int(1), ratio(1, 2)]), Ok(ratio(1, 2)));
        assert_error_kind(call(Builtin::Sub, vec![int(INT_MIN), int(1)]), overflow_error());
        assert_error_kind(call(Builtin::Sub, vec![int(5)]), arity_error());
    }

    #[test]
    fn test_div_is_exact() {
        assert_eq!(call(Builtin::Div, vec![int(10), int(2)]), Ok(int(5)));
        assert_eq!(call(Builtin::Div, vec![int(10), int(4)]), Ok(ratio(5, 2)));
        assert_eq!(call(Builtin::Div, vec![int(1), int(-3)]), Ok(ratio(-1, 3)));
        assert_eq!(call(Builtin::Div, vec![ratio(1, 2), ratio(1, 4)]), Ok(int(2)));
        assert_eq!(call(Builtin::Div, vec![int(1), int(0)]), Err(EvalError::DivisionByZero));
        assert_error_kind(call(Builtin::Div, vec![int(INT_MAX), ratio(1, 2)]), overflow_error());
    }

    #[test]
    fn test_sqrt() {
        assert_eq!(call(Builtin::Sqrt, vec![int(16)]), Ok(int(4)));
        assert_eq!(call(Builtin::Sqrt, vec![int(17)]), Ok(int(4)));
        assert_eq!(call(Builtin::Sqrt, vec![int(0)]), Ok(int(0)));
        assert_eq!(call(Builtin::Sqrt, vec![ratio(9, 2)]), Ok(int(2)));
        assert_error_kind(call(Builtin::Sqrt, vec![int(-1)]), domain_error());
        assert_error_kind(call(Builtin::Sqrt, vec![int(i64::MAX)]), overflow_error());
    }

    #[test]
    fn test_pow() {
        assert_eq!(call(Builtin::Pow, vec![int(2), int(10)]), Ok(int(1024)));
        assert_eq!(call(Builtin::Pow, vec![int(7), int(0)]), Ok(int(1)));
        assert_eq!(call(Builtin::Pow, vec![int(2), int(-2)]), Ok(ratio(1, 4)));
        assert_eq!(call(Builtin::Pow, vec![ratio(2, 3), int(2)]), Ok(ratio(4, 9)));
        assert_eq!(call(Builtin::Pow, vec![int(0), int(-1)]), Err(EvalError::DivisionByZero));
        assert_error_kind(call(Builtin::Pow, vec![int(2), int(31)]), overflow_error());
        assert_error_kind(call(Builtin::Pow, vec![int(2), int(64)]), overflow_error());
        assert_error_kind(call(Builtin::Pow, vec![int(2), ratio(1, 2)]), domain_error());
        assert_error_kind(call(Builtin::Pow, vec![int(2), Value::symbol("x")]), type_error());
    }

    #[test]
    fn test_arithmetic_type_errors() {
        assert_error_kind(call(Builtin::Add, vec![int(1), Value::Boolean(true)]), type_error());
        assert_error_kind(call(Builtin::Mul, vec![list(vec![])]), type_error());
        assert_error_kind(call(Builtin::Div, vec![Value::Nil, int(1)]), type_error());
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(call(Builtin::Greater, vec![int(2), int(1)]), Ok(Value::Boolean(true)));
        assert_eq!(call(Builtin::Less, vec![int(2), int(1)]), Ok(Value::Boolean(false)));
        assert_eq!(call(Builtin::Less, vec![ratio(1, 3), ratio(1, 2)]), Ok(Value::Boolean(true)));
        assert_error_kind(call(Builtin::Greater, vec![int(1), Value::symbol("a")]), type_error());

        assert_eq!(
            call(Builtin::Equal, vec![list(vec![int(1)]), list(vec![int(1)])]),
            Ok(Value::Boolean(true))
        );
        assert_eq!(
            call(Builtin::Equal, vec![Value::symbol("a"), Value::symbol("b")]),
            Ok(Value::Boolean(false))
        );
        assert_eq!(call(Builtin::NotEqual, vec![int(1), int(2)]), Ok(Value::Boolean(true)));
        assert_error_kind(call(Builtin::Equal, vec![int(1)]), arity_error());
    }

    #[test]
    fn test_logic() {
        let t = Value::Boolean(true);
        assert_eq!(call(Builtin::And, vec![t.clone(), int(2)]), Ok(int(2)));
        assert_eq!(call(Builtin::And, vec![Value::Nil, int(2)]), Ok(Value::Nil));
        assert_eq!(call(Builtin::Or, vec![Value::Nil, int(3)]), Ok(int(3)));
        assert_eq!(call(Builtin::Or, vec![int(0), int(3)]), Ok(int(0)));
        assert_eq!(call(Builtin::Not, vec![Value::Nil]), Ok(t.clone()));
        assert_eq!(call(Builtin::Not, vec![list(vec![])]), Ok(t));
        assert_eq!(call(Builtin::Not, vec![int(0)]), Ok(Value::Boolean(false)));
    }

    #[test]
    fn test_if_selects_on_exact_true() {
        let t = Value::Boolean(true);
        assert_eq!(call(Builtin::If, vec![t, int(1), int(2)]), Ok(int(1)));
        assert_eq!(call(Builtin::If, vec![int(1), int(1), int(2)]), Ok(int(2)));
        assert_eq!(call(Builtin::If, vec![Value::Nil, int(1), int(2)]), Ok(int(2)));
        assert_error_kind(call(Builtin::If, vec![Value::Nil, int(1)]), arity_error());
    }

    #[test]
    fn test_car_and_cdr() {
        let items = list(vec![int(1), int(2), int(3)]);
        assert_eq!(call(Builtin::Car, vec![items.clone()]), Ok(int(1)));
        assert_eq!(call(Builtin::Car, vec![list(vec![])]), Ok(Value::Nil));
        assert_eq!(call(Builtin::Car, vec![int(5)]), Ok(int(5)));

        assert_eq!(call(Builtin::Cdr, vec![items]), Ok(list(vec![int(2), int(3)])));
        assert_eq!(call(Builtin::Cdr, vec![list(vec![int(1)])]), Ok(list(vec![])));
        assert_eq!(call(Builtin::Cdr, vec![list(vec![])]), Ok(Value::Nil));
        assert_error_kind(call(Builtin::Cdr, vec![int(5)]), type_error());
        assert_error_kind(call(Builtin::Cdr, vec![Value::Nil]), type_error());
    }

    #[test]
    fn test_cons() {
        assert_eq!(
            call(Builtin::Cons, vec![int(1), list(vec![int(2)])]),
            Ok(list(vec![int(1), int(2)]))
        );
        assert_eq!(
            call(Builtin::Cons, vec![int(1), int(2)]),
            Ok(list(vec![int(1), Value::symbol("."), int(2)]))
        );
        assert_eq!(call(Builtin::Cons, vec![list(vec![]), Value::Nil]), Ok(Value::Nil));
        assert_eq!(
            call(Builtin::Cons, vec![int(1), list(vec![])]),
            Ok(list(vec![int(1), Value::symbol("."), Value::Nil]))
        );
        assert_eq!(
            call(Builtin::Cons, vec![list(vec![]), list(vec![int(2)])]),
            Ok(list(vec![Value::Nil, int(2)]))
        );
    }

    #[test]
    fn test_define_and_set() {
        let mut env = Environment::new();
        assert_eq!(
            Builtin::Define.apply(vec![Value::symbol("x"), int(1)], &mut env),
            Ok(Value::symbol("x"))
        );
        assert_eq!(env.get("x"), Some(&int(1)));
        assert_error_kind(Builtin::Define.apply(vec![int(1), int(1)], &mut env), type_error());

        assert_eq!(
            Builtin::Set.apply(vec![Value::symbol("x"), int(2)], &mut env),
            Ok(Value::symbol("x"))
        );
        assert_eq!(env.get("x"), Some(&int(2)));
        assert_eq!(
            Builtin::Set.apply(vec![Value::symbol("y"), int(2)], &mut env),
            Err(EvalError::UndefinedVariable("y".to_string()))
        );
    }

    #[test]
    fn test_defun_validates_shape() {
        let mut env = Environment::new();
        let body = list(vec![Value::symbol("+"), Value::symbol("a"), int(1)]);
        assert_eq!(
            Builtin::Defun.apply(
                vec![Value::symbol("inc"), list(vec![Value::symbol("a")]), body.clone()],
                &mut env
            ),
            Ok(Value::symbol("inc"))
        );
        assert!(env.has_function("inc"));

        assert_error_kind(
            Builtin::Defun.apply(vec![int(1), list(vec![]), body.clone()], &mut env),
            type_error(),
        );
        assert_error_kind(
            Builtin::Defun.apply(vec![Value::symbol("f"), Value::symbol("a"), body.clone()], &mut env),
            type_error(),
        );
        assert_error_kind(
            Builtin::Defun.apply(vec![Value::symbol("f"), list(vec![int(1)]), body], &mut env),
            type_error(),
        );
        assert_error_kind(
            Builtin::Defun.apply(
                vec![Value::symbol("f"), list(vec![]), Value::Boolean(true)],
                &mut env
            ),
            type_error(),
        );
    }

    #[test]
    fn test_mapcar_on_builtins() {
        let mut env = Environment::new();
        let result = Builtin::Mapcar.apply(
            vec![
                Value::symbol("+"),
                list(vec![int(1), int(2), int(3)]),
                list(vec![int(10), int(20)]),
            ],
            &mut env,
        );
        assert_eq!(result, Ok(list(vec![int(11), int(22)])));

        let result = Builtin::Mapcar.apply(vec![Value::symbol("car"), list(vec![])], &mut env);
        assert_eq!(result, Ok(list(vec![])));
    }

    #[test]
    fn test_mapcar_errors() {
        let mut env = Environment::new();
        assert_error_kind(
            Builtin::Mapcar.apply(vec![Value::symbol("+")], &mut env),
            arity_error(),
        );
        assert_error_kind(
            Builtin::Mapcar.apply(vec![Value::symbol("+"), int(1)], &mut env),
            type_error(),
        );
        assert_error_kind(
            Builtin::Mapcar.apply(vec![int(1), list(vec![int(1)])], &mut env),
            type_error(),
        );
        assert_eq!(
            Builtin::Mapcar.apply(vec![Value::symbol("nope"), list(vec![int(1)])], &mut env),
            Err(EvalError::UnknownFunction("nope".to_string()))
        );
    }
}
