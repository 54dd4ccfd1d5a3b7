///
/// Type Mappings (Rust → C)
///
/// Converts the text of a Rust field type into its C-compatible counterpart:
/// - u8/i8/u16/i16/u32/u64/i64 → fixed-width <stdint.h> names, i32 → int
/// - usize → size_t, isize → ssize_t
/// - f32 → float, f64 → double
/// - String → RustString
/// - Vec<T> → RustVec<T'>
/// - Option<T> → RustOption<T'>
/// - any other plain name → itself (another translated declaration)
///
/// Anything else with generic arguments or a path qualifier has no layout
/// equivalent; it becomes an `<ERROR_TYPE(..)>` marker so the failure stays
/// visible in the generated text.
///

pub const VEC_WRAPPER: &str = "RustVec";
pub const OPTION_WRAPPER: &str = "RustOption";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CType {
    pub text: String,
    pub untranslatable: bool,
    pub uses_option: bool,
}

impl CType {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            untranslatable: false,
            uses_option: false,
        }
    }

    fn wrap(wrapper: &str, inner: CType) -> Self {
        Self {
            text: format!("{}<{}>", wrapper, inner.text),
            untranslatable: inner.untranslatable,
            uses_option: inner.uses_option || wrapper == OPTION_WRAPPER,
        }
    }
}

pub fn primitive(name: &str) -> Option<&'static str> {
    let c_name = match name {
        "String" => "RustString",
        "u8" | "byte" => "uint8_t",
        "i8" => "int8_t",
        "u16" => "uint16_t",
        "i16" => "int16_t",
        "u32" => "uint32_t",
        "i32" => "int",
        "u64" => "uint64_t",
        "i64" => "int64_t",
        "usize" => "size_t",
        "isize" => "ssize_t",
        "f32" => "float",
        "f64" => "double",
        _ => return None,
    };
    Some(c_name)
}

pub fn translate_type(ty: &str) -> CType {
    if let Some((head, inner)) = split_generic(ty) {
        if !has_top_level_comma(inner) {
            match head {
                "Vec" => return CType::wrap(VEC_WRAPPER, translate_type(inner)),
                "Option" => return CType::wrap(OPTION_WRAPPER, translate_type(inner)),
                _ => {}
            }
        }
    }

    if let Some(c_name) = primitive(ty) {
        return CType::plain(c_name);
    }

    if ty.contains('<') || ty.contains("::") {
        return CType {
            text: format!("<ERROR_TYPE({})>", ty),
            untranslatable: true,
            uses_option: false,
        };
    }

    CType::plain(ty)
}

/// `Head<Inner>` → `(Head, Inner)`.
fn split_generic(ty: &str) -> Option<(&str, &str)> {
    let open = ty.find('<')?;
    let inner = ty[open + 1..].strip_suffix('>')?;
    Some((&ty[..open], inner))
}

fn has_top_level_comma(args: &str) -> bool {
    let mut depth = 0i32;
    for c in args.chars() {
        match c {
            '<' => depth += 1,
            '>' => depth -= 1,
            ',' if depth == 0 => return true,
            _ => {}
        }
    }
    false
}
