///
/// Header Emitter
///
/// Prepends the fixed preamble to the translated bodies and writes the
/// result. The preamble's include line depends on whether any emitted body
/// uses the optional wrapper type.
///
/// Writing is idempotent: a target whose current content already equals the
/// new text (ignoring a leading byte-order mark) is left untouched. Output
/// containing any non-ASCII character is written with a UTF-8 byte-order
/// mark, plain UTF-8 otherwise.
///

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::translate::Translation;

pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Error)]
pub enum EmitError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Include lines for the generated preamble.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderConfig {
    /// Included when no body uses the optional wrapper.
    pub include: String,
    /// Included when some body uses the optional wrapper.
    pub option_include: String,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            include: "rust/rust_spt.h".to_string(),
            option_include: "rust/rust-common.h".to_string(),
        }
    }
}

impl Translation {
    pub fn render(&self, config: &HeaderConfig) -> String {
        render_header(&self.body, self.uses_option, config)
    }
}

pub fn render_header(body: &str, uses_option: bool, config: &HeaderConfig) -> String {
    let include = if uses_option {
        &config.option_include
    } else {
        &config.include
    };
    format!("#pragma once\n#include \"{}\"\n\n{}", include, body)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    Utf8Bom,
}

impl Encoding {
    pub fn detect(content: &str) -> Self {
        if content.is_ascii() {
            Encoding::Utf8
        } else {
            Encoding::Utf8Bom
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    Unchanged,
}

pub fn write_if_changed(path: &Path, content: &str) -> Result<WriteOutcome, EmitError> {
    match std::fs::read(path) {
        Ok(existing) => {
            let existing = existing.strip_prefix(UTF8_BOM).unwrap_or(&existing);
            if existing == content.as_bytes() {
                tracing::info!(path = %path.display(), "output unchanged");
                return Ok(WriteOutcome::Unchanged);
            }
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(EmitError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    }

    let encoding = Encoding::detect(content);
    let mut bytes = Vec::with_capacity(content.len() + UTF8_BOM.len());
    if encoding == Encoding::Utf8Bom {
        bytes.extend_from_slice(UTF8_BOM);
    }
    bytes.extend_from_slice(content.as_bytes());

    std::fs::write(path, bytes).map_err(|source| EmitError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), ?encoding, "output written");
    Ok(WriteOutcome::Written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_preamble_include_selection() {
        let config = HeaderConfig::default();
        assert_eq!(
            render_header("struct A {\n};\n\n", false, &config),
            "#pragma once\n#include \"rust/rust_spt.h\"\n\nstruct A {\n};\n\n"
        );
        assert_eq!(
            render_header("", true, &config),
            "#pragma once\n#include \"rust/rust-common.h\"\n\n"
        );
    }

    #[test]
    fn test_custom_includes() {
        let config = HeaderConfig {
            include: "base.h".to_string(),
            option_include: "opt.h".to_string(),
        };
        let translation = Translation {
            body: String::new(),
            notices: Vec::new(),
            uses_option: true,
        };
        assert_eq!(translation.render(&config), "#pragma once\n#include \"opt.h\"\n\n");
    }

    #[test]
    fn test_encoding_detection() {
        assert_eq!(Encoding::detect("struct A {};"), Encoding::Utf8);
        assert_eq!(Encoding::detect("// größe"), Encoding::Utf8Bom);
    }

    #[test]
    fn test_write_then_unchanged() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.h");

        assert_eq!(write_if_changed(&path, "a\n").unwrap(), WriteOutcome::Written);
        assert_eq!(write_if_changed(&path, "a\n").unwrap(), WriteOutcome::Unchanged);
        assert_eq!(write_if_changed(&path, "b\n").unwrap(), WriteOutcome::Written);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "b\n");
    }

    #[test]
    fn test_bom_is_written_and_ignored_on_compare() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.h");

        assert_eq!(write_if_changed(&path, "é\n").unwrap(), WriteOutcome::Written);
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
        assert_eq!(&bytes[UTF8_BOM.len()..], "é\n".as_bytes());

        assert_eq!(write_if_changed(&path, "é\n").unwrap(), WriteOutcome::Unchanged);
    }

    #[test]
    fn test_existing_bom_on_ascii_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.h");
        std::fs::write(&path, b"\xEF\xBB\xBFplain\n").unwrap();
        assert_eq!(write_if_changed(&path, "plain\n").unwrap(), WriteOutcome::Unchanged);
    }

    #[test]
    fn test_unreadable_target_is_an_error() {
        let dir = TempDir::new().unwrap();
        // A directory cannot be read as a file.
        let err = write_if_changed(dir.path(), "x").unwrap_err();
        assert!(matches!(err, EmitError::Read { .. }));
    }
}
