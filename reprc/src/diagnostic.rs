//!
//! Diagnostic Module - Fatal Error Reporting
//!
//! Renders fatal errors with source context using miette: the failing
//! stage, line and column, and a labelled snippet of the input. Errors
//! without a location (grammar, output) fall back to their plain message.
//!
//! Usage:
//!   let reporter = DiagnosticReporter::new(&source_file);
//!   reporter.report(&err);
//!

use miette::{Diagnostic, NamedSource, Report, SourceSpan};
use thiserror::Error;

use crate::error::Error;
use crate::matcher::MatchError;
use crate::source::SourceFile;
use crate::translate::TranslateError;

#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(reprc::input))]
pub struct ReprcDiagnostic {
    message: String,
    #[source_code]
    src: NamedSource<String>,
    #[label("{label}")]
    span: SourceSpan,
    label: String,
    #[help]
    help_text: Option<String>,
}

impl ReprcDiagnostic {
    /// `None` when the error carries no location.
    pub fn from_error(err: &Error, source: &SourceFile) -> Option<Self> {
        let span = err.span()?;
        let (line, col) = source.line_col(span.start);

        Some(Self {
            message: format!("{} at {}:{}", err.stage(), line, col),
            src: NamedSource::new(&source.name, source.source.clone()),
            span: (span.start as usize, span.len() as usize).into(),
            label: err.to_string(),
            help_text: help_for(err),
        })
    }
}

fn help_for(err: &Error) -> Option<String> {
    match err {
        Error::Match(MatchError::NoRule { .. }) => Some(
            "only attributes, `use` items, structs with named fields and enums are recognized"
                .to_string(),
        ),
        Error::Translate(TranslateError::WideGenericInLayout { .. }) => Some(
            "multi-parameter generics have no C layout; drop #[repr(C)] or change the field"
                .to_string(),
        ),
        Error::Translate(TranslateError::Unterminated { .. }) => {
            Some("add the closing `}`".to_string())
        }
        _ => None,
    }
}

pub struct DiagnosticReporter<'a> {
    source: &'a SourceFile,
}

impl<'a> DiagnosticReporter<'a> {
    pub fn new(source: &'a SourceFile) -> Self {
        Self { source }
    }

    pub fn render(&self, err: &Error) -> String {
        match ReprcDiagnostic::from_error(err, self.source) {
            Some(diag) => format!("{:?}", Report::new(diag)),
            None => format!("error: {}", err),
        }
    }

    pub fn report(&self, err: &Error) {
        eprintln!("{}", self.render(err));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::LexError;
    use crate::source::Span;
    use crate::symbols::{AlphabetError, SymbolClass};

    #[test]
    fn test_diagnostic_from_lex_error() {
        let source = SourceFile::new("in.rs", "pub struct A {\n  x: $\n}");
        let err = Error::Lex(LexError::UnknownToken {
            found: '$',
            span: Span::new(20, 21),
        });

        let diag = ReprcDiagnostic::from_error(&err, &source).unwrap();
        assert_eq!(diag.message, "lex error at 2:6");
        assert!(diag.help_text.is_none());
    }

    #[test]
    fn test_diagnostic_from_match_error() {
        let source = SourceFile::new("in.rs", "fn main() {}");
        let err = Error::Match(MatchError::NoRule {
            context: "fn main(){}".to_string(),
            span: Span::new(0, 2),
        });

        let diag = ReprcDiagnostic::from_error(&err, &source).unwrap();
        assert!(diag.message.starts_with("syntax error at 1:1"));
        assert_eq!(diag.label, "no rule matched at `fn main(){}`");
        assert!(diag.help_text.is_some());

        let labels: Vec<_> = diag.labels().unwrap().collect();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].label(), Some("no rule matched at `fn main(){}`"));
        assert_eq!((labels[0].offset(), labels[0].len()), (0, 2));
        assert!(diag.help().is_some());
        assert!(diag.source_code().is_some());
    }

    #[test]
    fn test_unlocated_error_renders_plain() {
        let source = SourceFile::new("in.rs", "");
        let err = Error::Alphabet(AlphabetError::Exhausted {
            class: SymbolClass::Operator,
            text: "<<=".to_string(),
            capacity: 2,
        });
        let reporter = DiagnosticReporter::new(&source);
        assert!(reporter.render(&err).starts_with("error: too many distinct operators"));
    }
}
