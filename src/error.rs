//! Error types for template parsing

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// Templates nest deeper than the parser allows
    #[error("maximum template nesting depth of {limit} exceeded at {span:?}")]
    RecursionLimitExceeded { limit: usize, span: Span },
}

impl ParseError {
    /// Location of the error in the parsed text
    pub fn span(&self) -> &Span {
        match self {
            ParseError::RecursionLimitExceeded { span, .. } => span,
        }
    }

    /// Whether this error is the nesting limit, which callers degrade on
    pub fn is_recursion_limit(&self) -> bool {
        matches!(self, ParseError::RecursionLimitExceeded { .. })
    }

    /// Format the error with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        let (message, label) = match self {
            ParseError::RecursionLimitExceeded { limit, .. } => (
                "Max recursion depth reached, aborted".to_string(),
                format!("this template opens nesting level {}", limit + 1),
            ),
        };

        let span = self.span().clone();
        let mut buf = Vec::new();
        let written = Report::build(ReportKind::Error, filename, span.start)
            .with_message(&message)
            .with_label(
                Label::new((filename, span))
                    .with_message(label)
                    .with_color(Color::Red),
            )
            .finish()
            .write((filename, Source::from(source)), &mut buf);

        match written {
            Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
            Err(_) => self.to_string(),
        }
    }
}
