///
/// Rule Matcher and Source Reconstruction
///
/// Walks the canonical string with a cursor. At each position the rules are
/// tried in priority order and the first one that matches wins; this is
/// first-match, not longest-match. A match is mapped back onto its token
/// range, and the source text of the whole match and of every capture group
/// is rebuilt from the tokens.
///
/// Reconstruction joins tokens without whitespace, except that a single
/// space separates two adjacent word-like tokens (keywords, identifiers,
/// numbers, string and char literals) that would otherwise fuse.
///

use std::ops::Range;

use smallvec::SmallVec;
use thiserror::Error;

use crate::canon::Canonical;
use crate::rules::RuleSet;
use crate::source::Span;
use crate::symbols::Alphabet;

/// Tokens shown after the cursor when no rule matches.
const CONTEXT_TOKENS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("no rule matched at `{context}`")]
    NoRule { context: String, span: Span },
}

impl MatchError {
    pub fn span(&self) -> Span {
        match self {
            MatchError::NoRule { span, .. } => *span,
        }
    }
}

pub type Groups = SmallVec<[Option<String>; 4]>;

#[derive(Debug, Clone, PartialEq)]
pub struct RuleMatch<'a, K> {
    pub rule: K,
    pub tokens: Range<usize>,
    pub span: Span,
    pub text: String,
    /// One entry per capture group; `None` when the group did not participate.
    pub groups: Groups,
    /// Comments anchored inside `tokens`.
    pub comments: Vec<&'a str>,
}

impl<'a, K> RuleMatch<'a, K> {
    pub fn group(&self, index: usize) -> Option<&str> {
        self.groups.get(index).and_then(|g| g.as_deref())
    }
}

/// Rebuilds the source text of a token range.
pub fn reconstruct(canonical: &Canonical<'_>, alphabet: &Alphabet, tokens: Range<usize>) -> String {
    let mut text = String::new();
    let mut prev_word = false;
    for index in tokens {
        let word = alphabet.is_word(canonical.symbols[index]);
        if prev_word && word {
            text.push(' ');
        }
        text.push_str(canonical.tokens[index].text);
        prev_word = word;
    }
    text
}

pub struct Matcher<'m, 'a, K> {
    rules: &'m RuleSet<K>,
    canonical: &'m Canonical<'a>,
    alphabet: &'m Alphabet,
    /// Cursor as a byte offset into the canonical text and as a token index.
    byte_pos: usize,
    token_pos: usize,
    failed: bool,
}

impl<'m, 'a, K: Copy> Matcher<'m, 'a, K> {
    pub fn new(rules: &'m RuleSet<K>, canonical: &'m Canonical<'a>, alphabet: &'m Alphabet) -> Self {
        Self {
            rules,
            canonical,
            alphabet,
            byte_pos: 0,
            token_pos: 0,
            failed: false,
        }
    }

    fn token_span(&self, tokens: &Range<usize>) -> Span {
        let tokens_slice = &self.canonical.tokens[tokens.clone()];
        match (tokens_slice.first(), tokens_slice.last()) {
            (Some(first), Some(last)) => first.span.merge(last.span),
            _ => Span::default(),
        }
    }

    fn no_rule(&self) -> MatchError {
        let end = (self.token_pos + CONTEXT_TOKENS).min(self.canonical.len());
        let context = reconstruct(self.canonical, self.alphabet, self.token_pos..end);
        MatchError::NoRule {
            context,
            span: self.canonical.tokens[self.token_pos].span,
        }
    }

    fn try_rules(&self) -> Option<(RuleMatch<'a, K>, usize)> {
        let rest = &self.canonical.text[self.byte_pos..];
        let count_tokens = |bytes: usize| rest[..bytes].chars().count();

        for rule in self.rules.iter() {
            let Some(caps) = rule.regex.captures(rest) else {
                continue;
            };
            let whole = caps.get(0)?;
            // A trailing lookahead is matched but not consumed.
            let consumed = rule
                .lookaheads()
                .iter()
                .filter_map(|&i| caps.get(i))
                .map(|m| m.start())
                .min()
                .unwrap_or(whole.end());
            if consumed == 0 {
                continue;
            }

            let start = self.token_pos;
            let tokens = start..start + count_tokens(consumed);
            let groups = rule
                .captures()
                .iter()
                .map(|&i| {
                    caps.get(i).map(|m| {
                        let from = start + count_tokens(m.start());
                        let to = start + count_tokens(m.end());
                        reconstruct(self.canonical, self.alphabet, from..to)
                    })
                })
                .collect();
            let comments = self
                .canonical
                .comments_in(tokens.clone())
                .iter()
                .map(|c| c.text)
                .collect();

            let found = RuleMatch {
                rule: rule.kind,
                span: self.token_span(&tokens),
                text: reconstruct(self.canonical, self.alphabet, tokens.clone()),
                tokens,
                groups,
                comments,
            };
            return Some((found, consumed));
        }
        None
    }
}

impl<'m, 'a, K: Copy + std::fmt::Debug> Iterator for Matcher<'m, 'a, K> {
    type Item = Result<RuleMatch<'a, K>, MatchError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.byte_pos >= self.canonical.text.len() {
            return None;
        }
        match self.try_rules() {
            Some((found, consumed)) => {
                tracing::debug!(rule = ?found.rule, tokens = ?found.tokens, text = %found.text, "rule matched");
                self.byte_pos += consumed;
                self.token_pos = found.tokens.end;
                Some(Ok(found))
            }
            None => {
                self.failed = true;
                Some(Err(self.no_rule()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canon::encode;
    use crate::lexer::tokenize;

    fn run<'a>(
        source: &'a str,
        rules: &[(&'static str, &str)],
    ) -> Result<Vec<RuleMatch<'a, &'static str>>, MatchError> {
        let mut alphabet = Alphabet::new();
        let rules = RuleSet::compile(rules.iter().copied(), &mut alphabet).unwrap();
        let canonical = encode(tokenize(source), &mut alphabet).unwrap();
        Matcher::new(&rules, &canonical, &alphabet).collect()
    }

    #[test]
    fn test_earlier_rule_wins_over_longer_match() {
        let rules = [("short", "IDEN"), ("long", "IDEN OP{:} IDEN")];
        let matches = run("a: b", &rules).unwrap_err();
        // `short` takes `a`, leaving `: b` which nothing matches.
        assert_eq!(matches.to_string(), "no rule matched at `:b`");

        let rules = [("short", "IDEN"), ("long", "IDEN OP{:} IDEN"), ("colon", "OP{:}")];
        let kinds: Vec<_> = run("a: b", &rules).unwrap().iter().map(|m| m.rule).collect();
        assert_eq!(kinds, vec!["short", "colon", "short"]);
    }

    #[test]
    fn test_reconstruction_spacing() {
        let rules = [("any", "(?: KW{pub} | KW{struct} | IDEN | NUM | STR | OP{:} | OP{<} | OP{>} | OP<{> )+")];
        let matches = run("pub   struct\nX { a :Vec < u8 > 1 \"s\" }", &rules).unwrap_err();
        assert!(matches.to_string().contains('}'));

        let rules = [("any", "(?: KW{pub} | KW{struct} | IDEN | NUM | STR | OP{:} | OP{<} | OP{>} | OP<{> | OP<}> )+")];
        let matches = run("pub   struct\nX { a :Vec < u8 > 1 \"s\" }", &rules).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].text, "pub struct X{a:Vec<u8>1 \"s\"}");
    }

    #[test]
    fn test_groups_and_absent_groups() {
        let rules = [("field", "(KW{pub})? (IDEN) OP{:} ((?: IDEN OP{::})* IDEN) OP{,}")];
        let matches = run("x: std::io::Error, pub y: u8,", &rules).unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].group(0), None);
        assert_eq!(matches[0].group(1), Some("x"));
        assert_eq!(matches[0].group(2), Some("std::io::Error"));
        assert_eq!(matches[1].group(0), Some("pub"));
        assert_eq!(matches[1].tokens, 8..13);
    }

    #[test]
    fn test_lookahead_is_not_consumed() {
        let rules = [
            ("field", "(IDEN) OP{:} (IDEN) (?: OP{,} | (?= OP<}> ) )"),
            ("end", "OP<}>"),
        ];
        let matches = run("a: u8, b: u16 }", &rules).unwrap();
        let summary: Vec<_> = matches
            .iter()
            .map(|m| (m.rule, m.text.as_str(), m.groups.len()))
            .collect();
        assert_eq!(
            summary,
            vec![("field", "a:u8,", 2), ("field", "b:u16", 2), ("end", "}", 0)]
        );
    }

    #[test]
    fn test_match_collects_comments_in_range() {
        let rules = [("variant", "(IDEN) OP{,}")];
        let matches = run("/// first\nA, // var=a\nB,\n", &rules).unwrap();
        assert_eq!(matches[0].comments, vec!["/// first", "// var=a"]);
        assert!(matches[1].comments.is_empty());
    }

    #[test]
    fn test_no_rule_reports_context_window() {
        let rules = [("ident", "IDEN")];
        let err = run("a b = c d e f g h i j k l m", &rules).unwrap_err();
        match err {
            MatchError::NoRule { context, span } => {
                assert_eq!(context, "=c d e f g h i j k");
                assert_eq!(span, Span::new(4, 5));
            }
        }
    }

    #[test]
    fn test_span_covers_matched_tokens() {
        let rules = [("pair", "IDEN IDEN")];
        let matches = run("  ab  cd", &rules).unwrap();
        assert_eq!(matches[0].span, Span::new(2, 8));
    }
}
