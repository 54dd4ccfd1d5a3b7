//!
//! Lexer Module - Zero-Copy Tokenization
//!
//! This module turns declaration source text into a lazy stream of tokens.
//! Unlike a compiler lexer it keeps trivia in the stream: whitespace, newlines
//! and comments are yielded as tokens so the canonical encoder can anchor
//! comments to the significant token they describe.
//!
//! Key design decisions:
//! - Zero-copy: token text borrows the source string
//! - Never backtracks; every byte is consumed exactly once
//! - No recovery: an unrecognized byte or an unclosed literal is a LexError
//!
//! Token categories:
//! - Keywords: a fixed reserved-word list (struct, enum, pub, use, ...)
//! - Operators: greedy longest match over 3-, 2- and 1-byte tables
//! - Identifiers: plain or raw (`r#name`, stored without the prefix)
//! - Literals: numbers, double-quoted strings, single-quoted chars
//! - Trivia: whitespace (and a byte-order mark), newlines, comments
//!

use memchr::{memchr, memchr2, memmem};
use thiserror::Error;

use crate::source::Span;

pub const KEYWORDS: &[&str] = &[
    "as", "break", "const", "continue", "crate", "else", "enum", "extern", "false", "fn", "for",
    "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref", "return",
    "self", "Self", "static", "struct", "super", "trait", "true", "type", "unsafe", "use", "where",
    "while", "async", "await", "dyn",
];

const OPERATORS_3: &[&str] = &["..=", "<<=", ">>="];

const OPERATORS_2: &[&str] = &[
    "!=", "%=", "&&", "&=", "*=", "+=", "-=", "..", "/=", "<<", "<=", "==", ">=", ">>", "^=", "|=",
    "||", "::",
];

const OPERATORS_1: &[u8] = b"!%&*+-/<=>?^|{}[](),.:;#";

const BYTE_ORDER_MARK: char = '\u{feff}';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Keyword,
    Operator,
    Ident,
    Number,
    Str,
    Char,

    Whitespace,
    Newline,
    Comment,

    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub span: Span,
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind, text: &'a str, span: Span) -> Self {
        Self { kind, text, span }
    }

    pub fn is_trivia(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Whitespace | TokenKind::Newline | TokenKind::Comment
        )
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("unterminated block comment")]
    UnterminatedComment { span: Span },

    #[error("unterminated string literal")]
    UnterminatedString { span: Span },

    #[error("unterminated character literal")]
    UnterminatedChar { span: Span },

    #[error("unknown token starting with {found:?}")]
    UnknownToken { found: char, span: Span },
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            LexError::UnterminatedComment { span } => *span,
            LexError::UnterminatedString { span } => *span,
            LexError::UnterminatedChar { span } => *span,
            LexError::UnknownToken { span, .. } => *span,
        }
    }
}

pub fn tokenize(source: &str) -> Lexer<'_> {
    Lexer::new(source)
}

/// Lazy token stream. Yields every token including trivia, ends with a
/// single `Eof` token, then stops. The first error ends the stream.
pub struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    done: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            done: false,
        }
    }

    #[inline(always)]
    fn peek_char(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(start as u32, self.pos as u32)
    }

    fn token(&self, kind: TokenKind, start: usize) -> Token<'a> {
        Token::new(kind, &self.source[start..self.pos], self.span_from(start))
    }

    pub fn next_token(&mut self) -> Result<Token<'a>, LexError> {
        let start = self.pos;

        let Some(c) = self.peek_char() else {
            return Ok(self.token(TokenKind::Eof, start));
        };

        if c.is_whitespace() || c == BYTE_ORDER_MARK {
            return Ok(self.scan_whitespace(start));
        }

        let rest = &self.bytes[self.pos..];

        if rest.starts_with(b"/*") {
            return match memmem::find(&rest[2..], b"*/") {
                Some(offset) => {
                    self.pos += offset + 4;
                    Ok(self.token(TokenKind::Comment, start))
                }
                None => {
                    self.pos = self.bytes.len();
                    Err(LexError::UnterminatedComment {
                        span: self.span_from(start),
                    })
                }
            };
        }

        if rest.starts_with(b"//") {
            match memchr(b'\n', rest) {
                Some(offset) => self.pos += offset,
                None => self.pos = self.bytes.len(),
            }
            return Ok(self.token(TokenKind::Comment, start));
        }

        match c {
            '"' => return self.scan_quoted(start, b'"'),
            '\'' => return self.scan_quoted(start, b'\''),
            _ => {}
        }

        if rest.starts_with(b"r#") && rest.len() > 2 {
            if let Some(token) = self.scan_raw_ident(start) {
                return Ok(token);
            }
        }

        if let Some(len) = match_operator(rest) {
            self.pos += len;
            return Ok(self.token(TokenKind::Operator, start));
        }

        if c.is_alphabetic() || c == '_' {
            self.pos += c.len_utf8();
            self.skip_while(|c| c.is_alphanumeric() || c == '_');
            let text = &self.source[start..self.pos];
            let kind = if KEYWORDS.contains(&text) {
                TokenKind::Keyword
            } else {
                TokenKind::Ident
            };
            return Ok(self.token(kind, start));
        }

        if c.is_ascii_digit() {
            self.pos += 1;
            self.skip_while(char::is_alphanumeric);
            return Ok(self.token(TokenKind::Number, start));
        }

        Err(LexError::UnknownToken {
            found: c,
            span: Span::new(start as u32, (start + c.len_utf8()) as u32),
        })
    }

    fn skip_while(&mut self, pred: impl Fn(char) -> bool) {
        while let Some(c) = self.peek_char() {
            if !pred(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn scan_whitespace(&mut self, start: usize) -> Token<'a> {
        self.skip_while(|c| c.is_whitespace() || c == BYTE_ORDER_MARK);
        let kind = if memchr(b'\n', &self.bytes[start..self.pos]).is_some() {
            TokenKind::Newline
        } else {
            TokenKind::Whitespace
        };
        self.token(kind, start)
    }

    /// Scans a string or char literal. A backslash escapes whatever follows it.
    fn scan_quoted(&mut self, start: usize, quote: u8) -> Result<Token<'a>, LexError> {
        self.pos += 1;
        loop {
            match memchr2(quote, b'\\', &self.bytes[self.pos..]) {
                Some(offset) => {
                    self.pos += offset;
                    if self.bytes[self.pos] == quote {
                        self.pos += 1;
                        let kind = if quote == b'"' {
                            TokenKind::Str
                        } else {
                            TokenKind::Char
                        };
                        return Ok(self.token(kind, start));
                    }
                    self.pos += 1;
                    if let Some(c) = self.peek_char() {
                        self.pos += c.len_utf8();
                    }
                }
                None => {
                    self.pos = self.bytes.len();
                    let span = self.span_from(start);
                    return Err(if quote == b'"' {
                        LexError::UnterminatedString { span }
                    } else {
                        LexError::UnterminatedChar { span }
                    });
                }
            }
        }
    }

    /// `r#name` lexes as the identifier `name`; the span still covers the prefix.
    fn scan_raw_ident(&mut self, start: usize) -> Option<Token<'a>> {
        let name_start = start + 2;
        let name_len = self.source[name_start..]
            .char_indices()
            .find(|&(_, c)| !(c.is_alphanumeric() || c == '_'))
            .map(|(i, _)| i)
            .unwrap_or(self.source.len() - name_start);
        if name_len == 0 {
            return None;
        }
        self.pos = name_start + name_len;
        Some(Token::new(
            TokenKind::Ident,
            &self.source[name_start..self.pos],
            self.span_from(start),
        ))
    }
}

fn match_operator(rest: &[u8]) -> Option<usize> {
    if OPERATORS_3.iter().any(|op| rest.starts_with(op.as_bytes())) {
        return Some(3);
    }
    if OPERATORS_2.iter().any(|op| rest.starts_with(op.as_bytes())) {
        return Some(2);
    }
    match rest.first() {
        Some(b) if OPERATORS_1.contains(b) => Some(1),
        _ => None,
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token<'a>, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let result = self.next_token();
        match &result {
            Ok(token) if token.is_eof() => self.done = true,
            Err(_) => self.done = true,
            Ok(_) => {}
        }
        Some(result)
    }
}
