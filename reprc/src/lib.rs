///
/// reprc - Rust Layout Declarations to C Headers
///
/// Translates `pub` structs and enums marked `#[repr(C)]` into C header
/// declarations. Input is recognized by a small fixed grammar rather than a
/// full Rust parser:
///
/// - source: Spans and source files
/// - lexer: Tokenization of the input
/// - symbols: The keyword/operator symbol alphabet
/// - canon: Tokens → canonical one-symbol-per-token string
/// - rules: Grammar notation → compiled rules over the canonical string
/// - matcher: First-match rule matching and source reconstruction
/// - translate: Declaration state machine and type mapping
/// - emit: Header preamble and idempotent output writing
/// - diagnostic: Fatal error rendering
///
/// Entry points:
/// - `translate_source`: Translate an input text into header bodies and notices
/// - `Translation::render`: Prepend the header preamble
/// - `emit::write_if_changed`: Write the header only if it changed
///

pub mod canon;
pub mod diagnostic;
pub mod emit;
pub mod error;
pub mod lexer;
pub mod matcher;
pub mod rules;
pub mod source;
pub mod symbols;
pub mod translate;

pub use diagnostic::DiagnosticReporter;
pub use emit::{HeaderConfig, WriteOutcome, write_if_changed};
pub use error::Error;
pub use lexer::tokenize;
pub use source::SourceFile;
pub use translate::{Notice, Translation, Translator};

use matcher::Matcher;
use symbols::Alphabet;

pub fn translate_source(source: &str) -> Result<Translation, Error> {
    let mut alphabet = Alphabet::new();
    let rules = rules::grammar::compile(&mut alphabet)?;
    let canonical = canon::encode(tokenize(source), &mut alphabet)?;

    let mut translator = Translator::new();
    for found in Matcher::new(&rules, &canonical, &alphabet) {
        translator.feed(&found?)?;
    }
    Ok(translator.finish()?)
}

#[test]
fn test_translate_tagged_union_example() {
    let source = r#"
use std::fmt;

#[repr(C)]
pub enum E {
    None,
    SomeValue(u32),
}
"#;
    let translation = translate_source(source).unwrap();
    assert_eq!(
        translation.render(&HeaderConfig::default()),
        concat!(
            "#pragma once\n",
            "#include \"rust/rust_spt.h\"\n",
            "\n",
            "struct E {\n",
            "\tenum type_t : int {\n",
            "\t\tNONE,\n",
            "\t\tSOME_VALUE,\n",
            "\t};\n",
            "\ttype_t type;\n",
            "\tunion {\n",
            "\t\tuint32_t some_value;\n",
            "\t};\n",
            "};\n",
            "\n",
        )
    );
    assert!(translation.notices.is_empty());
}
