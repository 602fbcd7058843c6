use crate::config::Policy;
use crate::{Environment, EvalError, ParseError, format_value, parse_str};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Either half of the pipeline can reject a line.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Eval(#[from] EvalError),
}

impl SessionError {
    pub fn pretty_print(&self, input: &str) -> io::Result<()> {
        match self {
            SessionError::Parse(e) => e.pretty_print(input),
            SessionError::Eval(e) => e.pretty_print(input),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Skip,          // Blank line
    Print(String), // Formatted result
    Error(SessionError),
    Quit,
}

/// One interactive session: a long-lived environment plus an optional
/// append-only transcript of every result.
pub struct Session {
    env: Environment,
    transcript: Option<Box<dyn Write>>,
}

impl Session {
    pub fn new(policy: Policy) -> Self {
        Session {
            env: Environment::with_policy(policy),
            transcript: None,
        }
    }

    pub fn with_transcript<W: Write + 'static>(mut self, writer: W) -> Self {
        self.transcript = Some(Box::new(writer));
        self
    }

    /// Opens `path` for appending, creating it if needed.
    pub fn open_transcript(path: &Path) -> io::Result<File> {
        OpenOptions::new().create(true).append(true).open(path)
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// Handles one line of input. Only transcript I/O can fail here;
    /// interpreter errors come back as `Outcome::Error`.
    pub fn handle_line(&mut self, line: &str) -> io::Result<Outcome> {
        let input = line.trim();
        if input.is_empty() {
            return Ok(Outcome::Skip);
        }
        if input == "(quit)" {
            info!("quit requested");
            return Ok(Outcome::Quit);
        }
        // `()` is answered directly rather than evaluated.
        if input == "()" {
            self.record("NIL")?;
            return Ok(Outcome::Print("NIL".to_string()));
        }

        debug!(%input, "read");
        // Parse the untrimmed line so error spans index into what was typed.
        match self.run(line) {
            Ok(text) => {
                self.record(&text)?;
                Ok(Outcome::Print(text))
            }
            Err(e) => {
                self.record(&format!("Error: {}", e))?;
                Ok(Outcome::Error(e))
            }
        }
    }

    fn run(&mut self, line: &str) -> Result<String, SessionError> {
        let expr = parse_str(line)?;
        let value = self.env.evaluate(&expr)?;
        Ok(format_value(&value))
    }

    fn record(&mut self, line: &str) -> io::Result<()> {
        match self.transcript.as_mut() {
            Some(writer) => writeln!(writer, "{}", line),
            None => Ok(()),
        }
    }

    /// Closes the transcript with its `EOF` marker.
    pub fn finish(&mut self) -> io::Result<()> {
        if let Some(mut writer) = self.transcript.take() {
            writeln!(writer, "EOF")?;
            writer.flush()?;
        }
        Ok(())
    }
}
