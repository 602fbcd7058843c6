use crate::{EvalError, ParseError};
use ariadne::{Config, Label, Report, ReportKind, Source};
use std::ops::Range;

type ReplReport = Report<'static, (&'static str, Range<usize>)>;

const SOURCE_ID: &str = "REPL";

impl EvalError {
    // Evaluation errors carry no span, so the label covers the whole input.
    fn report(&self, input: &str) -> ReplReport {
        let range = 0..input.len();
        let label = match self {
            EvalError::MalformedSyntax(_) => "This form is malformed".to_string(),
            EvalError::UnknownFunction(name) => format!("`{}` is not a known function", name),
            EvalError::UndefinedVariable(name) => {
                format!("`{}` must be defined before set! can change it", name)
            }
            EvalError::ArityMismatch { name, .. } => format!("Check the arguments to `{}`", name),
            EvalError::TypeMismatch {
                expected, found, ..
            } => format!("Expected {}, found {}", expected, found),
            EvalError::IntegerOverflow(_) => {
                "Results must fit in a 32-bit signed integer".to_string()
            }
            EvalError::DivisionByZero => "The divisor evaluated to zero".to_string(),
            EvalError::DomainError { message, .. } => message.clone(),
            EvalError::RecursionLimit(_) => "This expression recurses without stopping".to_string(),
        };
        Report::build(ReportKind::Error, (SOURCE_ID, range.clone()))
            .with_config(Config::default().with_color(false))
            .with_message(self.to_string())
            .with_label(Label::new((SOURCE_ID, range)).with_message(label))
            .finish()
    }

    pub fn pretty_print(&self, input: &str) -> std::io::Result<()> {
        self.report(input).eprint((SOURCE_ID, Source::from(input)))
    }

    pub fn render(&self, input: &str) -> String {
        render_report(self.report(input), input)
    }
}

impl ParseError {
    fn report(&self, input: &str) -> ReplReport {
        let range = self.span().to_range();
        let (message, label) = match self {
            ParseError::MalformedSyntax { message, .. } => {
                ("Malformed syntax".to_string(), message.clone())
            }
            ParseError::UnbalancedParenthesis { .. } => (
                "Unbalanced parenthesis".to_string(),
                "This '(' is never closed".to_string(),
            ),
        };
        // Keep the label inside the input so ariadne has a line to draw on.
        let range = range.start.min(input.len())..range.end.min(input.len());
        Report::build(ReportKind::Error, (SOURCE_ID, range.clone()))
            .with_config(Config::default().with_color(false))
            .with_message(message)
            .with_label(Label::new((SOURCE_ID, range)).with_message(label))
            .finish()
    }

    pub fn pretty_print(&self, input: &str) -> std::io::Result<()> {
        self.report(input).eprint((SOURCE_ID, Source::from(input)))
    }

    pub fn render(&self, input: &str) -> String {
        render_report(self.report(input), input)
    }
}

fn render_report(report: ReplReport, input: &str) -> String {
    let mut buffer = Vec::new();
    match report.write((SOURCE_ID, Source::from(input)), &mut buffer) {
        Ok(()) => String::from_utf8_lossy(&buffer).into_owned(),
        Err(e) => format!("failed to render report: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use crate::{Environment, parse_str};

    #[test]
    fn test_render_parse_error() {
        let input = "(+ 1 (* 2 3)";
        let error = parse_str("(+ 1 (* 2 3").unwrap_err();
        let rendered = error.render(input);
        assert!(rendered.contains("Unbalanced parenthesis"), "{}", rendered);
        assert!(rendered.contains("never closed"), "{}", rendered);
    }

    #[test]
    fn test_render_stray_closer() {
        let input = "(a) b)";
        let rendered = parse_str(input).unwrap_err().render(input);
        assert!(rendered.contains("unexpected closing parenthesis"), "{}", rendered);
    }

    #[test]
    fn test_render_eval_error() {
        let input = "(/ 1 0)";
        let expr = parse_str(input).unwrap();
        let error = Environment::new().evaluate(&expr).unwrap_err();
        let rendered = error.render(input);
        assert!(rendered.contains("Division by zero"), "{}", rendered);
        assert!(rendered.contains("divisor evaluated to zero"), "{}", rendered);
    }

    #[test]
    fn test_render_nesting_error() {
        let input = format!("{}a{}", "(".repeat(200), ")".repeat(200));
        let rendered = parse_str(&input).unwrap_err().render(&input);
        assert!(rendered.contains("nested too deeply"), "{}", rendered);
    }
}
