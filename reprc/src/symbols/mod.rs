///
/// Symbol Alphabet
///
/// Every significant token is compressed to one `char` so that declaration
/// grammars can be matched as ordinary regular expressions. Keywords and
/// operators each get a private symbol, assigned on first sight from two
/// disjoint code-point ranges; identifiers, numbers, strings and char
/// literals collapse to four fixed generic symbols.
///
/// Within one Alphabet a text always maps to the same symbol, and two texts
/// never share one. The lexer's input and the rule compiler's notation draw
/// from the same Alphabet, so a keyword that only appears in a rule still
/// gets a consistent symbol.
///

use indexmap::IndexSet;
use thiserror::Error;

pub const IDENT: char = 'I';
pub const NUMBER: char = 'N';
pub const STRING: char = '\u{21d2}';
pub const CHAR: char = '\u{2192}';

/// Enclosed Alphanumerics and Box Drawing.
pub const KEYWORD_RANGE: (u32, u32) = (0x2460, 0x257f);
/// Mathematical Operators.
pub const OPERATOR_RANGE: (u32, u32) = (0x2200, 0x22ff);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolClass {
    Keyword,
    Operator,
}

impl std::fmt::Display for SymbolClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SymbolClass::Keyword => write!(f, "keywords"),
            SymbolClass::Operator => write!(f, "operators"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlphabetError {
    #[error("too many distinct {class}: cannot assign a symbol to {text:?} (capacity {capacity})")]
    Exhausted {
        class: SymbolClass,
        text: String,
        capacity: usize,
    },
}

/// Insertion-ordered text → symbol table over one code-point range.
/// The symbol of a text is `base + insertion index`.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    class: SymbolClass,
    base: u32,
    capacity: usize,
    entries: IndexSet<String>,
}

impl SymbolTable {
    pub fn new(class: SymbolClass, first: u32, last: u32) -> Self {
        Self {
            class,
            base: first,
            capacity: (last - first + 1) as usize,
            entries: IndexSet::new(),
        }
    }

    pub fn symbol_for(&mut self, text: &str) -> Result<char, AlphabetError> {
        if let Some(index) = self.entries.get_index_of(text) {
            return Ok(self.symbol_at(index));
        }
        if self.entries.len() >= self.capacity {
            return Err(AlphabetError::Exhausted {
                class: self.class,
                text: text.to_string(),
                capacity: self.capacity,
            });
        }
        let (index, _) = self.entries.insert_full(text.to_string());
        let symbol = self.symbol_at(index);
        tracing::trace!(class = %self.class, text, symbol = %symbol.escape_unicode(), "assigned symbol");
        Ok(symbol)
    }

    fn symbol_at(&self, index: usize) -> char {
        // Both ranges lie in the BMP outside the surrogate block.
        char::from_u32(self.base + index as u32).unwrap_or(char::REPLACEMENT_CHARACTER)
    }

    pub fn contains_symbol(&self, symbol: char) -> bool {
        let code = symbol as u32;
        code >= self.base && ((code - self.base) as usize) < self.entries.len()
    }

    pub fn text_of(&self, symbol: char) -> Option<&str> {
        let code = symbol as u32;
        if code < self.base {
            return None;
        }
        self.entries
            .get_index((code - self.base) as usize)
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Assigned texts in first-seen order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}

#[derive(Debug, Clone)]
pub struct Alphabet {
    keywords: SymbolTable,
    operators: SymbolTable,
}

impl Default for Alphabet {
    fn default() -> Self {
        Self::with_ranges(KEYWORD_RANGE, OPERATOR_RANGE)
    }
}

impl Alphabet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inclusive `(first, last)` code points for each class; ranges must not overlap.
    pub fn with_ranges(keywords: (u32, u32), operators: (u32, u32)) -> Self {
        debug_assert!(keywords.1 < operators.0 || operators.1 < keywords.0);
        Self {
            keywords: SymbolTable::new(SymbolClass::Keyword, keywords.0, keywords.1),
            operators: SymbolTable::new(SymbolClass::Operator, operators.0, operators.1),
        }
    }

    pub fn keyword(&mut self, text: &str) -> Result<char, AlphabetError> {
        self.keywords.symbol_for(text)
    }

    pub fn operator(&mut self, text: &str) -> Result<char, AlphabetError> {
        self.operators.symbol_for(text)
    }

    pub fn keywords(&self) -> &SymbolTable {
        &self.keywords
    }

    pub fn operators(&self) -> &SymbolTable {
        &self.operators
    }

    /// Symbols whose tokens need a separating space when adjacent:
    /// keywords, identifiers, numbers, strings and chars.
    pub fn is_word(&self, symbol: char) -> bool {
        matches!(symbol, IDENT | NUMBER | STRING | CHAR) || self.keywords.contains_symbol(symbol)
    }
}
