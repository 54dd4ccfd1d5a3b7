///
/// Declaration Grammar
///
/// The fixed set of declaration shapes the translator understands, in
/// priority order. Anything else in the input is a match error.
///

use crate::rules::{GrammarError, RuleSet};
use crate::symbols::Alphabet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclRule {
    /// `#[name(arg, key = "value")]`; groups: name, arguments
    Attribute,
    /// `#[name]`; groups: name
    BareAttribute,
    /// `pub struct Name {`; groups: pub, name
    StructHeader,
    /// `pub name: Type,`; groups: pub, name, type
    StructField,
    /// `name: Map<K, V>,`; groups: pub, name, type
    WideGenericField,
    /// `}` or `};`
    BodyEnd,
    /// `pub enum Name {`; groups: pub, name
    EnumHeader,
    /// `Name(Type),`; groups: name, payload
    EnumVariant,
    /// `use a::b;`
    Import,
    /// `use a::{b, c};`
    ImportGroup,
}

macro_rules! path {
    () => {
        "(?: IDEN OP{::} )* IDEN"
    };
}

macro_rules! field_type {
    () => {
        concat!(
            path!(),
            " (?: OP{<} ",
            path!(),
            " (?: OP{>} | OP{<} ",
            path!(),
            " (?: OP{>>} | OP{>} OP{>} ) ) )?"
        )
    };
}

macro_rules! attr_arg {
    () => {
        "IDEN (?: OP{=} (?: STR | NUM | IDEN ) )?"
    };
}

macro_rules! use_prefix {
    () => {
        "KW{use} (?: OP{::} )? (?: (?: KW{crate} | KW{super} | KW{self} ) OP{::} )* (?: IDEN OP{::} )*"
    };
}

pub const DECLARATION_GRAMMAR: &[(DeclRule, &str)] = &[
    (
        DeclRule::Attribute,
        concat!(
            "OP{#} OP{[} (IDEN) OP{(} ( (?: ",
            attr_arg!(),
            " OP{,} )* ",
            attr_arg!(),
            " ) OP{)} OP{]}"
        ),
    ),
    (DeclRule::BareAttribute, "OP{#} OP{[} (IDEN) OP{]}"),
    (DeclRule::StructHeader, "(KW{pub})? KW{struct} (IDEN) OP<{>"),
    (
        DeclRule::StructField,
        concat!(
            "(KW{pub})? (IDEN) OP{:} (",
            field_type!(),
            ") (?: OP{,} | (?= OP<}> ) )"
        ),
    ),
    (
        DeclRule::WideGenericField,
        concat!(
            "(KW{pub})? (IDEN) OP{:} (",
            path!(),
            " OP{<} IDEN OP{,} IDEN OP{>}) OP{,}?"
        ),
    ),
    (DeclRule::BodyEnd, "OP<}> OP{;}?"),
    (DeclRule::EnumHeader, "(KW{pub})? KW{enum} (IDEN) OP<{>"),
    (
        DeclRule::EnumVariant,
        concat!("(IDEN) (?: OP<(> (", field_type!(), ") OP<)> )? OP{,}?"),
    ),
    (DeclRule::Import, concat!(use_prefix!(), " IDEN OP{;}")),
    (
        DeclRule::ImportGroup,
        concat!(use_prefix!(), " OP<{> (?: IDEN OP{,} )* IDEN OP{,}? OP<}> OP{;}"),
    ),
];

pub fn compile(alphabet: &mut Alphabet) -> Result<RuleSet<DeclRule>, GrammarError> {
    RuleSet::compile(DECLARATION_GRAMMAR.iter().copied(), alphabet)
}
