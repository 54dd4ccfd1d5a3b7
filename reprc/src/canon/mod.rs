///
/// Canonical Encoder
///
/// Consumes the lexer's token stream and produces the canonical string: one
/// symbol per significant token, in token order. Index i of the symbol vector
/// is token i, which is what lets a regex match over the canonical text be
/// mapped back onto token ranges and original source text.
///
/// Comments are not part of the canonical string. Each one is recorded with
/// an anchor token index:
/// - a comment following a significant token on the same line anchors to
///   that token
/// - otherwise (start of input, or first thing on its line) it anchors to
///   the next significant token
///

use std::ops::Range;

use thiserror::Error;

use crate::lexer::{LexError, Token, TokenKind};
use crate::symbols::{self, Alphabet, AlphabetError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Alphabet(#[from] AlphabetError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Comment<'a> {
    pub anchor: usize,
    pub text: &'a str,
}

#[derive(Debug, Clone)]
pub struct Canonical<'a> {
    pub tokens: Vec<Token<'a>>,
    pub symbols: Vec<char>,
    pub text: String,
    /// Sorted by anchor, since anchors never decrease during encoding.
    pub comments: Vec<Comment<'a>>,
}

impl<'a> Canonical<'a> {
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Comments anchored inside the half-open token range.
    pub fn comments_in(&self, tokens: Range<usize>) -> &[Comment<'a>] {
        let lo = self.comments.partition_point(|c| c.anchor < tokens.start);
        let hi = self.comments.partition_point(|c| c.anchor < tokens.end);
        &self.comments[lo..hi.max(lo)]
    }
}

pub fn encode<'a, I>(tokens: I, alphabet: &mut Alphabet) -> Result<Canonical<'a>, EncodeError>
where
    I: IntoIterator<Item = Result<Token<'a>, LexError>>,
{
    let mut canonical = Canonical {
        tokens: Vec::new(),
        symbols: Vec::new(),
        text: String::new(),
        comments: Vec::new(),
    };
    // Last significant token on the current line, if any.
    let mut line_anchor: Option<usize> = None;

    for token in tokens {
        let token = token?;
        let symbol = match token.kind {
            TokenKind::Eof => break,
            TokenKind::Whitespace => continue,
            TokenKind::Newline => {
                line_anchor = None;
                continue;
            }
            TokenKind::Comment => {
                canonical.comments.push(Comment {
                    anchor: line_anchor.unwrap_or(canonical.tokens.len()),
                    text: token.text,
                });
                continue;
            }
            TokenKind::Keyword => alphabet.keyword(token.text)?,
            TokenKind::Operator => alphabet.operator(token.text)?,
            TokenKind::Ident => symbols::IDENT,
            TokenKind::Number => symbols::NUMBER,
            TokenKind::Str => symbols::STRING,
            TokenKind::Char => symbols::CHAR,
        };
        line_anchor = Some(canonical.tokens.len());
        canonical.tokens.push(token);
        canonical.symbols.push(symbol);
        canonical.text.push(symbol);
    }

    tracing::debug!(
        tokens = canonical.tokens.len(),
        comments = canonical.comments.len(),
        "encoded canonical string"
    );
    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn encode_str(source: &str) -> (Canonical<'_>, Alphabet) {
        let mut alphabet = Alphabet::new();
        let canonical = encode(tokenize(source), &mut alphabet).unwrap();
        (canonical, alphabet)
    }

    #[test]
    fn test_one_symbol_per_token() {
        let (canonical, mut alphabet) = encode_str("pub x: u32 = 5, \"s\" 'c'");
        assert_eq!(canonical.symbols.len(), canonical.tokens.len());
        assert_eq!(canonical.text.chars().count(), canonical.tokens.len());
        let expected: String = [
            alphabet.keyword("pub").unwrap(),
            symbols::IDENT,
            alphabet.operator(":").unwrap(),
            symbols::IDENT,
            alphabet.operator("=").unwrap(),
            symbols::NUMBER,
            alphabet.operator(",").unwrap(),
            symbols::STRING,
            symbols::CHAR,
        ]
        .iter()
        .collect();
        assert_eq!(canonical.text, expected);
    }

    #[test]
    fn test_trailing_comment_anchors_to_previous_token() {
        let (canonical, _) = encode_str("A, // var=a\nB,");
        assert_eq!(
            canonical.comments,
            vec![Comment {
                anchor: 1,
                text: "// var=a"
            }]
        );
    }

    #[test]
    fn test_own_line_comment_anchors_to_next_token() {
        let (canonical, _) = encode_str("A,\n/// doc\nB,");
        assert_eq!(canonical.comments[0].anchor, 2);
        let (canonical, _) = encode_str("/* head */ A");
        assert_eq!(canonical.comments[0].anchor, 0);
    }

    #[test]
    fn test_comments_in_range_is_half_open() {
        let (canonical, _) = encode_str("A, // a\n// b\nB, // c\n");
        let texts = |r: Range<usize>| -> Vec<&str> {
            canonical.comments_in(r).iter().map(|c| c.text).collect()
        };
        assert_eq!(texts(0..2), vec!["// a"]);
        assert_eq!(texts(2..4), vec!["// b", "// c"]);
        assert_eq!(texts(0..4), vec!["// a", "// b", "// c"]);
        assert!(texts(4..4).is_empty());
    }

    #[test]
    fn test_lex_error_propagates() {
        let mut alphabet = Alphabet::new();
        let err = encode(tokenize("struct $"), &mut alphabet).unwrap_err();
        assert!(matches!(err, EncodeError::Lex(LexError::UnknownToken { found: '$', .. })));
    }
}
