///
/// Crate Error
///
/// Every fatal failure of a run, by the stage that produced it. Stages
/// that point into the input expose a span for diagnostics.
///

use thiserror::Error;

use crate::canon::EncodeError;
use crate::emit::EmitError;
use crate::lexer::LexError;
use crate::matcher::MatchError;
use crate::rules::GrammarError;
use crate::source::Span;
use crate::symbols::AlphabetError;
use crate::translate::TranslateError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Grammar(#[from] GrammarError),

    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Alphabet(#[from] AlphabetError),

    #[error(transparent)]
    Match(#[from] MatchError),

    #[error(transparent)]
    Translate(#[from] TranslateError),

    #[error(transparent)]
    Emit(#[from] EmitError),
}

impl From<EncodeError> for Error {
    fn from(err: EncodeError) -> Self {
        match err {
            EncodeError::Lex(e) => Error::Lex(e),
            EncodeError::Alphabet(e) => Error::Alphabet(e),
        }
    }
}

impl Error {
    pub fn span(&self) -> Option<Span> {
        match self {
            Error::Lex(e) => Some(e.span()),
            Error::Match(e) => Some(e.span()),
            Error::Translate(e) => Some(e.span()),
            Error::Grammar(_) | Error::Alphabet(_) | Error::Emit(_) => None,
        }
    }

    /// Short label for the failing stage.
    pub fn stage(&self) -> &'static str {
        match self {
            Error::Grammar(_) => "grammar error",
            Error::Lex(_) => "lex error",
            Error::Alphabet(_) => "encoding error",
            Error::Match(_) => "syntax error",
            Error::Translate(_) => "translation error",
            Error::Emit(_) => "output error",
        }
    }
}
