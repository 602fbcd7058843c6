use std::borrow::Cow;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use clap::Parser;
use plisp::config::{DEFAULT_HISTORY, DEFAULT_TRANSCRIPT};
use plisp::evaluator::special_form_identifiers;
use plisp::{Outcome, Policy, Session, Settings, TokenKind, tokenize};
use rustyline::error::ReadlineError;
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Cmd, Completer, Context, Editor, EventHandler, KeyCode, KeyEvent, Modifiers};
use rustyline::{Helper, Highlighter, Hinter, Validator};
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Interactive Lisp interpreter.
#[derive(Parser, Debug)]
#[command(name = "plisp", version, about)]
struct Args {
    /// Line-editor history file
    #[arg(long, default_value = DEFAULT_HISTORY)]
    history: PathBuf,

    /// File every result is appended to
    #[arg(long, default_value = DEFAULT_TRANSCRIPT)]
    transcript: PathBuf,

    /// Don't write a transcript
    #[arg(long)]
    no_transcript: bool,

    /// Use vi key bindings
    #[arg(long)]
    vi: bool,

    /// Evaluate only the selected branch of `if` and short-circuit `and`/`or`
    #[arg(long)]
    lazy_conditionals: bool,

    /// Treat `(f ...)` as a call even when `f` is also a variable
    #[arg(long)]
    calls_over_variables: bool,

    /// Log definitions and assignments
    #[arg(short, long)]
    verbose: bool,

    /// Log every evaluation step
    #[arg(long)]
    trace: bool,
}

impl Args {
    fn settings(&self) -> Settings {
        let mut policy = Policy::default();
        if self.lazy_conditionals {
            policy = policy.lazy_conditionals();
        }
        if self.calls_over_variables {
            policy = policy.calls_over_variables();
        }
        Settings {
            history_file: self.history.clone(),
            transcript: (!self.no_transcript).then(|| self.transcript.clone()),
            vi_mode: self.vi,
            policy,
        }
    }

    fn log_level(&self) -> Level {
        if self.trace {
            Level::TRACE
        } else if self.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        }
    }
}

struct LispCompleter {
    session: Rc<RefCell<Session>>,
}

impl rustyline::completion::Completer for LispCompleter {
    type Candidate = String;
    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        let candidates = match tokenize(&line[..pos]).last().map(|t| t.kind.clone()) {
            // The token must end at the cursor, otherwise there's nothing to extend.
            Some(TokenKind::Atom(atom)) if line[..pos].ends_with(&atom) => {
                let prefix = atom.trim_start_matches('\'');
                self.session
                    .borrow()
                    .environment()
                    .get_identifiers()
                    .union(&special_form_identifiers())
                    .filter_map(|id| id.strip_prefix(prefix).map(str::to_string))
                    .filter(|rest| !rest.is_empty())
                    .collect()
            }
            _ => vec![],
        };
        Ok((pos, candidates))
    }
}

#[derive(Completer, Helper, Highlighter, Hinter, Validator)]
struct ReplHelper {
    #[rustyline(Validator)]
    validator: ParenValidator,
    #[rustyline(Highlighter)]
    highlighter: ParenHighlighter,
    #[rustyline(Completer)]
    completer: LispCompleter,
}

// Keeps reading lines until every '(' is closed.
struct ParenValidator;

impl Validator for ParenValidator {
    fn validate(&self, ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        let mut depth = 0usize;
        for (i, c) in ctx.input().char_indices() {
            match c {
                '(' => depth += 1,
                ')' if depth == 0 => {
                    return Ok(ValidationResult::Invalid(Some(format!(
                        "  - Unmatched ')' at position {}",
                        i
                    ))));
                }
                ')' => depth -= 1,
                _ => {}
            }
        }
        if depth > 0 {
            Ok(ValidationResult::Incomplete)
        } else {
            Ok(ValidationResult::Valid(None))
        }
    }
}

struct ParenHighlighter;

impl Highlighter for ParenHighlighter {
    fn highlight<'l>(&self, line: &'l str, pos: usize) -> Cow<'l, str> {
        let cursor = pos.checked_sub(1);
        // (index in `line`, index in `highlighted`) of each open paren
        let mut stack: Vec<(usize, usize)> = Vec::new();
        let mut highlighted = String::new();

        for (i, c) in line.char_indices() {
            match c {
                '(' => {
                    stack.push((i, highlighted.len()));
                    highlighted.push(c);
                }
                ')' => match stack.pop() {
                    Some((open_index, open_at)) => {
                        if cursor == Some(i) || cursor == Some(open_index) {
                            highlighted.push_str("\x1b[34m)\x1b[0m"); // Blue pair
                            highlighted.replace_range(open_at..=open_at, "\x1b[1;34m(\x1b[0m");
                        } else {
                            highlighted.push(c);
                        }
                    }
                    None => highlighted.push_str("\x1b[31m)\x1b[0m"), // Red stray closer
                },
                _ => highlighted.push(c),
            }
        }

        Cow::Owned(highlighted)
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        true
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level())
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let settings = args.settings();
    info!(?settings, "starting");

    let mut session = Session::new(settings.policy);
    if let Some(path) = &settings.transcript {
        match Session::open_transcript(path) {
            Ok(file) => session = session.with_transcript(file),
            Err(e) => warn!(path = %path.display(), error = %e, "transcript disabled"),
        }
    }
    let session = Rc::new(RefCell::new(session));

    let helper = ReplHelper {
        validator: ParenValidator,
        highlighter: ParenHighlighter,
        completer: LispCompleter {
            session: Rc::clone(&session),
        },
    };
    let edit_mode = if settings.vi_mode {
        rustyline::EditMode::Vi
    } else {
        rustyline::EditMode::Emacs
    };
    let config = rustyline::config::Config::builder()
        .edit_mode(edit_mode)
        .build();
    let mut rl = Editor::with_config(config)?;
    rl.set_helper(Some(helper));
    rl.bind_sequence(
        KeyEvent(KeyCode::Char('s'), Modifiers::CTRL),
        EventHandler::Simple(Cmd::Newline),
    );
    if rl.load_history(&settings.history_file).is_err() {
        info!("no previous history");
    }

    println!("plisp {}", env!("CARGO_PKG_VERSION"));
    println!("Type (quit) or press Ctrl-D to leave.");

    loop {
        match rl.readline("plisp> ") {
            Ok(line) => {
                if let Err(e) = rl.add_history_entry(line.as_str()) {
                    warn!(error = %e, "history entry dropped");
                }
                // Leave the loop on I/O failure so the transcript still gets its EOF.
                let outcome = match session.borrow_mut().handle_line(&line) {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        error!(error = %e, "transcript write failed");
                        break;
                    }
                };
                match outcome {
                    Outcome::Skip => {}
                    Outcome::Print(text) => println!("{}", text),
                    Outcome::Error(e) => {
                        if e.pretty_print(&line).is_err() {
                            eprintln!("{}", e);
                        }
                    }
                    Outcome::Quit => {
                        println!("bye");
                        break;
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("Interrupted. Type (quit) or Ctrl-D to leave.");
            }
            Err(ReadlineError::Eof) => {
                println!("bye");
                break;
            }
            Err(err) => {
                eprintln!("Readline Error: {:?}", err);
                break;
            }
        }
    }

    session.borrow_mut().finish()?;
    rl.save_history(&settings.history_file)?;
    Ok(())
}
