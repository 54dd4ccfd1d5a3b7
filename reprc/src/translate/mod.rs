///
/// Declaration Translator
///
/// Consumes rule matches one at a time and drives a small state machine:
///
///   Idle --struct header--> Struct --`}`--> Idle
///   Idle --enum header----> Enum   --`}`--> Idle
///
/// Attributes seen at top level are held until the next declaration is
/// finalized. A declaration is translated only when it is `pub` and one of
/// its attributes is `#[repr(C)]` (or `repr` with `C` among its arguments);
/// every other declaration produces a skip notice and no output.
///
/// Struct fields become `<c type> <name>;` lines. Enums become a struct
/// holding a `type_t` discriminant enumeration, a `type` field and an
/// anonymous union with one member per distinct payload.
///
/// A field whose type cannot be translated marks its declaration as failed:
/// the declaration is not emitted, and its body (with error markers) is
/// reported as a notice instead. Processing continues with the next one.
///

pub mod types;

use std::fmt;

use thiserror::Error;

use crate::matcher::RuleMatch;
use crate::rules::grammar::DeclRule;
use crate::source::Span;
use types::{CType, translate_type};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Struct,
    Enum,
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclKind::Struct => write!(f, "struct"),
            DeclKind::Enum => write!(f, "enum"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslateError {
    #[error("field `{field}: {ty}` cannot appear in #[repr(C)] {kind} `{decl}`")]
    WideGenericInLayout {
        kind: DeclKind,
        decl: String,
        field: String,
        ty: String,
        span: Span,
    },

    #[error("unexpected {event} {state}")]
    Misplaced {
        event: String,
        state: String,
        span: Span,
    },

    #[error("{kind} `{name}` is not closed before end of input")]
    Unterminated {
        kind: DeclKind,
        name: String,
        span: Span,
    },

    #[error("{rule:?} matched without its {what}")]
    MissingGroup {
        rule: DeclRule,
        what: &'static str,
        span: Span,
    },
}

impl TranslateError {
    pub fn span(&self) -> Span {
        match self {
            TranslateError::WideGenericInLayout { span, .. } => *span,
            TranslateError::Misplaced { span, .. } => *span,
            TranslateError::Unterminated { span, .. } => *span,
            TranslateError::MissingGroup { span, .. } => *span,
        }
    }
}

/// Side-channel messages about declarations that were not emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Skipped { kind: DeclKind, name: String },
    Untranslatable { kind: DeclKind, name: String, body: String },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Skipped { kind, name } => {
                write!(f, "skipping {} {}: not declared `pub` with #[repr(C)]", kind, name)
            }
            Notice::Untranslatable { kind, name, body } => write!(
                f,
                "warning: {} {} has fields of unknown type, fix them and retry:\n{}",
                kind, name, body
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub args: Vec<String>,
    pub text: String,
}

impl Attribute {
    /// `#[repr(C)]`, `#[repr(C, packed)]`, ...
    pub fn is_c_layout(&self) -> bool {
        self.name == "repr" && self.args.iter().any(|arg| arg == "C")
    }
}

fn split_args(args: &str) -> Vec<String> {
    args.split(',')
        .map(|arg| arg.split('=').next().unwrap_or(arg).trim().to_string())
        .filter(|arg| !arg.is_empty())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Attribute(Attribute),
    StructHeader { public: bool, name: String },
    StructField { name: String, ty: String },
    WideGenericField { name: String, ty: String },
    BodyEnd,
    EnumHeader { public: bool, name: String },
    EnumVariant {
        name: String,
        payload: Option<String>,
        comments: Vec<String>,
    },
    Import,
}

impl Event {
    pub fn from_match(found: &RuleMatch<'_, DeclRule>) -> Result<Self, TranslateError> {
        let required = |index: usize, what: &'static str| {
            found
                .group(index)
                .map(str::to_string)
                .ok_or(TranslateError::MissingGroup {
                    rule: found.rule,
                    what,
                    span: found.span,
                })
        };

        let event = match found.rule {
            DeclRule::Attribute => Event::Attribute(Attribute {
                name: required(0, "attribute name")?,
                args: split_args(found.group(1).unwrap_or_default()),
                text: found.text.clone(),
            }),
            DeclRule::BareAttribute => Event::Attribute(Attribute {
                name: required(0, "attribute name")?,
                args: Vec::new(),
                text: found.text.clone(),
            }),
            DeclRule::StructHeader => Event::StructHeader {
                public: found.group(0).is_some(),
                name: required(1, "struct name")?,
            },
            DeclRule::StructField => Event::StructField {
                name: required(1, "field name")?,
                ty: required(2, "field type")?,
            },
            DeclRule::WideGenericField => Event::WideGenericField {
                name: required(1, "field name")?,
                ty: required(2, "field type")?,
            },
            DeclRule::BodyEnd => Event::BodyEnd,
            DeclRule::EnumHeader => Event::EnumHeader {
                public: found.group(0).is_some(),
                name: required(1, "enum name")?,
            },
            DeclRule::EnumVariant => Event::EnumVariant {
                name: required(0, "variant name")?,
                payload: found.group(1).map(str::to_string),
                comments: found.comments.iter().map(|c| c.to_string()).collect(),
            },
            DeclRule::Import | DeclRule::ImportGroup => Event::Import,
        };
        Ok(event)
    }

    fn describe(&self) -> String {
        match self {
            Event::Attribute(attr) => format!("attribute `{}`", attr.text),
            Event::StructHeader { name, .. } => format!("struct header `{}`", name),
            Event::StructField { name, .. } | Event::WideGenericField { name, .. } => {
                format!("field `{}`", name)
            }
            Event::BodyEnd => "`}`".to_string(),
            Event::EnumHeader { name, .. } => format!("enum header `{}`", name),
            Event::EnumVariant { name, .. } => format!("enum variant `{}`", name),
            Event::Import => "use item".to_string(),
        }
    }
}

/// A declaration being built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decl {
    pub kind: DeclKind,
    pub name: String,
    pub body: String,
    pub eligible: bool,
    pub has_error: bool,
    pub uses_option: bool,
    pub span: Span,
}

impl Decl {
    fn open(kind: DeclKind, name: String, eligible: bool, span: Span) -> Self {
        let mut body = format!("struct {} {{\n", name);
        if kind == DeclKind::Enum {
            body.push_str("\tenum type_t : int {\n");
        }
        Self {
            kind,
            name,
            body,
            eligible,
            has_error: false,
            uses_option: false,
            span,
        }
    }

    fn push_field(&mut self, name: &str, ty: CType) {
        self.body.push_str(&format!("\t{} {};\n", ty.text, name));
        self.has_error |= ty.untranslatable;
        self.uses_option |= ty.uses_option;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    /// Upper snake case.
    pub name: String,
    pub payload: Option<CType>,
    pub comment: String,
}

impl Variant {
    /// Union member name: a `var=<name>` directive in the comment, or the
    /// lower-cased variant name.
    pub fn member_name(&self) -> String {
        var_directive(&self.comment)
            .map(str::to_string)
            .unwrap_or_else(|| self.name.to_lowercase())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDecl {
    pub decl: Decl,
    pub variants: Vec<Variant>,
}

impl EnumDecl {
    fn push_variant(&mut self, name: &str, payload: Option<&str>, comments: &[String]) {
        let name = upper_snake_case(name);
        self.decl.body.push_str(&format!("\t\t{},\n", name));
        let payload = payload.map(translate_type);
        if let Some(ty) = &payload {
            self.decl.has_error |= ty.untranslatable;
        }
        self.variants.push(Variant {
            name,
            payload,
            comment: comments.join("\n"),
        });
    }

    /// Closes the discriminant enumeration and appends the tagged union.
    fn close(mut self) -> Decl {
        let body = &mut self.decl.body;
        body.push_str("\t};\n");
        body.push_str("\ttype_t type;\n");

        let mut members: Vec<(String, &CType)> = Vec::new();
        for variant in &self.variants {
            let Some(ty) = &variant.payload else {
                continue;
            };
            let member = variant.member_name();
            // First occurrence wins for both the member name and the payload type.
            if members.iter().any(|(name, seen)| *name == member || seen.text == ty.text) {
                continue;
            }
            members.push((member, ty));
        }

        body.push_str("\tunion {\n");
        for (member, ty) in &members {
            body.push_str(&format!("\t\t{} {};\n", ty.text, member));
            self.decl.uses_option |= ty.uses_option;
        }
        body.push_str("\t};\n");
        body.push_str("};\n");
        self.decl
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DeclState {
    #[default]
    Idle,
    Struct(Decl),
    Enum(EnumDecl),
}

impl DeclState {
    fn describe(&self) -> String {
        match self {
            DeclState::Idle => "at top level".to_string(),
            DeclState::Struct(decl) => format!("inside struct `{}`", decl.name),
            DeclState::Enum(e) => format!("inside enum `{}`", e.decl.name),
        }
    }
}

/// Result of translating one input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Translation {
    /// Emitted declaration bodies, in input order.
    pub body: String,
    pub notices: Vec<Notice>,
    /// Whether any emitted body uses the optional wrapper.
    pub uses_option: bool,
}

#[derive(Debug, Default)]
pub struct Translator {
    state: DeclState,
    attributes: Vec<Attribute>,
    output: Translation,
}

impl Translator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DeclState {
        &self.state
    }

    pub fn feed(&mut self, found: &RuleMatch<'_, DeclRule>) -> Result<(), TranslateError> {
        let event = Event::from_match(found)?;
        self.apply(event, found.span)
    }

    pub fn apply(&mut self, event: Event, span: Span) -> Result<(), TranslateError> {
        let state = std::mem::take(&mut self.state);
        self.state = self.transition(state, event, span)?;
        Ok(())
    }

    fn transition(
        &mut self,
        state: DeclState,
        event: Event,
        span: Span,
    ) -> Result<DeclState, TranslateError> {
        match (state, event) {
            (state, Event::Import) => Ok(state),

            (DeclState::Idle, Event::Attribute(attr)) => {
                self.attributes.push(attr);
                Ok(DeclState::Idle)
            }
            // Field and variant attributes carry nothing for the layout.
            (state, Event::Attribute(_)) => Ok(state),

            (DeclState::Idle, Event::StructHeader { public, name }) => {
                Ok(DeclState::Struct(self.open(DeclKind::Struct, public, name, span)))
            }
            (DeclState::Struct(mut decl), Event::StructField { name, ty }) => {
                decl.push_field(&name, translate_type(&ty));
                Ok(DeclState::Struct(decl))
            }
            (DeclState::Struct(decl), Event::WideGenericField { name, ty }) => {
                if decl.eligible {
                    return Err(TranslateError::WideGenericInLayout {
                        kind: decl.kind,
                        decl: decl.name,
                        field: name,
                        ty,
                        span,
                    });
                }
                Ok(DeclState::Struct(decl))
            }
            (DeclState::Struct(mut decl), Event::BodyEnd) => {
                decl.body.push_str("};\n");
                self.finalize(decl);
                Ok(DeclState::Idle)
            }

            (DeclState::Idle, Event::EnumHeader { public, name }) => {
                let decl = self.open(DeclKind::Enum, public, name, span);
                Ok(DeclState::Enum(EnumDecl {
                    decl,
                    variants: Vec::new(),
                }))
            }
            (DeclState::Enum(mut e), Event::EnumVariant { name, payload, comments }) => {
                e.push_variant(&name, payload.as_deref(), &comments);
                Ok(DeclState::Enum(e))
            }
            (DeclState::Enum(e), Event::BodyEnd) => {
                self.finalize(e.close());
                Ok(DeclState::Idle)
            }

            (state, event) => Err(TranslateError::Misplaced {
                event: event.describe(),
                state: state.describe(),
                span,
            }),
        }
    }

    fn open(&mut self, kind: DeclKind, public: bool, name: String, span: Span) -> Decl {
        let eligible = public && self.attributes.iter().any(Attribute::is_c_layout);
        tracing::debug!(%kind, name = %name, eligible, "declaration opened");
        if !eligible {
            self.output.notices.push(Notice::Skipped {
                kind,
                name: name.clone(),
            });
        }
        Decl::open(kind, name, eligible, span)
    }

    fn finalize(&mut self, decl: Decl) {
        self.attributes.clear();
        tracing::debug!(kind = %decl.kind, name = %decl.name, eligible = decl.eligible, has_error = decl.has_error, "declaration finalized");
        if !decl.eligible {
            return;
        }
        if decl.has_error {
            tracing::info!(kind = %decl.kind, name = %decl.name, "declaration has untranslatable fields");
            self.output.notices.push(Notice::Untranslatable {
                kind: decl.kind,
                name: decl.name,
                body: decl.body,
            });
            return;
        }
        tracing::info!(kind = %decl.kind, name = %decl.name, "declaration emitted");
        self.output.uses_option |= decl.uses_option;
        self.output.body.push_str(&decl.body);
        self.output.body.push('\n');
    }

    pub fn finish(self) -> Result<Translation, TranslateError> {
        match self.state {
            DeclState::Idle => Ok(self.output),
            DeclState::Struct(decl) | DeclState::Enum(EnumDecl { decl, .. }) => {
                Err(TranslateError::Unterminated {
                    kind: decl.kind,
                    name: decl.name,
                    span: decl.span,
                })
            }
        }
    }
}

/// `SomeValue` → `SOME_VALUE`: an underscore before every capital except a
/// leading one, then upper-cased.
pub fn upper_snake_case(name: &str) -> String {
    let mut snake = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            snake.push('_');
        }
        snake.push(c);
    }
    snake
        .strip_prefix('_')
        .unwrap_or(&snake)
        .to_uppercase()
}

/// The first `var=<word>` in a comment.
fn var_directive(comment: &str) -> Option<&str> {
    comment.match_indices("var=").find_map(|(at, key)| {
        let rest = &comment[at + key.len()..];
        let end = rest
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        (end > 0).then(|| &rest[..end])
    })
}
