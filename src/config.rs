use std::path::PathBuf;

/// What a list whose head names a bound variable means.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum HeadVariablePolicy {
    /// `(x ...)` with `x` bound yields the value of `x` and ignores the rest
    /// of the list, even when `x` also names a function.
    #[default]
    ReturnValue,
    /// A head naming a function is always a call; a head naming only a
    /// variable still yields the variable.
    Call,
}

/// How `if`, `and` and `or` treat their operands.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ConditionalPolicy {
    /// Every operand is evaluated before the builtin picks a result, so both
    /// branches of an `if` run.
    #[default]
    Eager,
    /// `if` evaluates only the branch it selects; `and`/`or` stop once the
    /// first operand decides the result.
    Lazy,
}

/// Evaluation knobs. Every child environment inherits its parent's policy.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Policy {
    pub head_variable: HeadVariablePolicy,
    pub conditionals: ConditionalPolicy,
}

impl Policy {
    pub fn lazy_conditionals(mut self) -> Self {
        self.conditionals = ConditionalPolicy::Lazy;
        self
    }

    pub fn calls_over_variables(mut self) -> Self {
        self.head_variable = HeadVariablePolicy::Call;
        self
    }
}

pub const DEFAULT_TRANSCRIPT: &str = "results.file";
pub const DEFAULT_HISTORY: &str = "plisp_history.txt";

/// REPL settings, filled in from the command line by the binary.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub history_file: PathBuf,
    /// Where results are appended; `None` disables the transcript.
    pub transcript: Option<PathBuf>,
    pub vi_mode: bool,
    pub policy: Policy,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            history_file: PathBuf::from(DEFAULT_HISTORY),
            transcript: Some(PathBuf::from(DEFAULT_TRANSCRIPT)),
            vi_mode: false,
            policy: Policy::default(),
        }
    }
}
