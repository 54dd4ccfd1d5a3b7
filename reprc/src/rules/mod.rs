///
/// Rule Compiler
///
/// Grammar rules are written in a small notation over token classes and
/// compiled into regular expressions over the canonical alphabet:
///
/// - `KW{word}` / `KEYWORD{word}`: the keyword `word`
/// - `OP{text}` / `OP<text>` / `OPERATOR{..}`: the operator `text`
///   (the angle form allows `OP<{>` and `OP<}>`)
/// - `IDEN` / `IDENTIFIER`, `NUM` / `NUMBER`, `STR` / `STRING`, `CHAR`:
///   any token of that class
/// - `( )`, `(?: )`, `|`, `?`, `*`, `+`, `{n,m}`: regex structure, passed through
/// - `(?= ... )`: lookahead, only as the last element of a rule; matched but
///   not consumed
///
/// Whitespace between fragments is insignificant. Rules compile against the
/// same Alphabet as the input, so a keyword named only in a rule still gets
/// the symbol the encoder would give it.
///

pub mod grammar;

use regex::Regex;
use thiserror::Error;

use crate::symbols::{self, Alphabet, AlphabetError};

const LOOKAHEAD_GROUP: &str = "ahead";
const STRUCTURAL: &str = "(){}[]|+-?*:,.=0123456789";

#[derive(Debug, Clone, Error)]
pub enum GrammarError {
    #[error("rule {rule}: unknown notation at {fragment:?}")]
    UnknownFragment { rule: String, fragment: String },

    #[error("rule {rule}: empty {what} reference")]
    EmptyReference { rule: String, what: &'static str },

    #[error("rule {rule}: invalid pattern: {source}")]
    InvalidPattern {
        rule: String,
        #[source]
        source: Box<regex::Error>,
    },

    #[error("rule {rule}: {source}")]
    Alphabet {
        rule: String,
        #[source]
        source: AlphabetError,
    },
}

#[derive(Debug, Clone)]
pub struct CompiledRule<K> {
    pub kind: K,
    pub regex: Regex,
    /// Regex group indices reported to callers, in order; lookahead groups excluded.
    captures: Vec<usize>,
    lookaheads: Vec<usize>,
}

impl<K> CompiledRule<K> {
    pub fn captures(&self) -> &[usize] {
        &self.captures
    }

    pub fn lookaheads(&self) -> &[usize] {
        &self.lookaheads
    }

    pub fn group_count(&self) -> usize {
        self.captures.len()
    }
}

/// Rules in priority order: the first one matching at a position wins.
#[derive(Debug, Clone)]
pub struct RuleSet<K> {
    rules: Vec<CompiledRule<K>>,
}

impl<K: Copy + std::fmt::Debug> RuleSet<K> {
    pub fn compile<'r>(
        rules: impl IntoIterator<Item = (K, &'r str)>,
        alphabet: &mut Alphabet,
    ) -> Result<Self, GrammarError> {
        let rules = rules
            .into_iter()
            .map(|(kind, notation)| compile_rule(kind, notation, alphabet))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }
}

impl<K> RuleSet<K> {
    pub fn iter(&self) -> impl Iterator<Item = &CompiledRule<K>> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

pub fn compile_rule<K: Copy + std::fmt::Debug>(
    kind: K,
    notation: &str,
    alphabet: &mut Alphabet,
) -> Result<CompiledRule<K>, GrammarError> {
    let rule = format!("{:?}", kind);
    let pattern = translate_notation(&rule, notation, alphabet)?;
    let regex = Regex::new(&format!("^(?:{})", pattern)).map_err(|e| {
        GrammarError::InvalidPattern {
            rule: rule.clone(),
            source: Box::new(e),
        }
    })?;

    let mut captures = Vec::new();
    let mut lookaheads = Vec::new();
    for (index, name) in regex.capture_names().enumerate().skip(1) {
        match name {
            Some(name) if name.starts_with(LOOKAHEAD_GROUP) => lookaheads.push(index),
            _ => captures.push(index),
        }
    }

    tracing::trace!(rule = %rule, pattern = %pattern, "compiled rule");
    Ok(CompiledRule {
        kind,
        regex,
        captures,
        lookaheads,
    })
}

fn translate_notation(
    rule: &str,
    notation: &str,
    alphabet: &mut Alphabet,
) -> Result<String, GrammarError> {
    let mut pattern = String::new();
    let mut rest = notation;
    let mut lookahead_count = 0;

    let symbol_err = |source: AlphabetError| GrammarError::Alphabet {
        rule: rule.to_string(),
        source,
    };

    while let Some(c) = rest.chars().next() {
        if c.is_whitespace() {
            rest = &rest[c.len_utf8()..];
            continue;
        }

        if let Some((word, after)) = braced(rest, &["KEYWORD{", "KW{"], '}') {
            if word.is_empty() {
                return Err(GrammarError::EmptyReference {
                    rule: rule.to_string(),
                    what: "keyword",
                });
            }
            pattern.push(alphabet.keyword(word).map_err(symbol_err)?);
            rest = after;
            continue;
        }

        let operator = braced(rest, &["OPERATOR{", "OP{"], '}')
            .or_else(|| braced(rest, &["OPERATOR<", "OP<"], '>'));
        if let Some((op, after)) = operator {
            if op.is_empty() {
                return Err(GrammarError::EmptyReference {
                    rule: rule.to_string(),
                    what: "operator",
                });
            }
            pattern.push(alphabet.operator(op).map_err(symbol_err)?);
            rest = after;
            continue;
        }

        let placeholders = [
            ("IDENTIFIER", symbols::IDENT),
            ("IDEN", symbols::IDENT),
            ("NUMBER", symbols::NUMBER),
            ("NUM", symbols::NUMBER),
            ("STRING", symbols::STRING),
            ("STR", symbols::STRING),
            ("CHAR", symbols::CHAR),
        ];
        if let Some((name, symbol)) = placeholders.iter().find(|(name, _)| rest.starts_with(*name)) {
            pattern.push(*symbol);
            rest = &rest[name.len()..];
            continue;
        }

        if let Some(after) = rest.strip_prefix("(?=") {
            pattern.push_str(&format!("(?P<{}{}>", LOOKAHEAD_GROUP, lookahead_count));
            lookahead_count += 1;
            rest = after;
            continue;
        }

        if let Some(after) = rest.strip_prefix("(?:") {
            pattern.push_str("(?:");
            rest = after;
            continue;
        }

        if STRUCTURAL.contains(c) {
            pattern.push(c);
            rest = &rest[1..];
            continue;
        }

        let fragment = rest.split_whitespace().next().unwrap_or(rest);
        return Err(GrammarError::UnknownFragment {
            rule: rule.to_string(),
            fragment: fragment.to_string(),
        });
    }

    Ok(pattern)
}

/// Matches `PREFIX content CLOSE` at the start of `input` for any of the
/// prefixes, returning the content (up to the first `close`) and the rest.
fn braced<'n>(input: &'n str, prefixes: &[&str], close: char) -> Option<(&'n str, &'n str)> {
    let body = prefixes.iter().find_map(|p| input.strip_prefix(p))?;
    let end = body.find(close)?;
    Some((&body[..end], &body[end + close.len_utf8()..]))
}
