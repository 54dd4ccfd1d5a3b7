///
/// CLI Integration Tests
///
/// Drives the `reprc` binary via `env!("CARGO_BIN_EXE_reprc")` against
/// inputs written into a temp directory, and asserts on the generated
/// header, stderr notices and exit status.
///
/// Run all:  `cargo test --test cli`
///

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

const POINT: &str = "#[repr(C)]\npub struct Point {\n    pub x: i32,\n    pub y: i32,\n}\n";

const POINT_HEADER: &str =
    "#pragma once\n#include \"rust/rust_spt.h\"\n\nstruct Point {\n\tint x;\n\tint y;\n};\n\n";

fn reprc(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_reprc"))
        .args(args)
        .output()
        .expect("failed to run reprc")
}

fn write_input(dir: &Path, name: &str, source: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, source).unwrap();
    path.to_string_lossy().into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_prints_header_to_stdout() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_input(tmp.path(), "point.rs", POINT);

    let output = reprc(&[&input]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout), POINT_HEADER);
}

#[test]
fn test_reads_stdin() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_reprc"))
        .arg("-")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(POINT.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), POINT_HEADER);
}

#[test]
fn test_rerun_leaves_output_untouched() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_input(tmp.path(), "point.rs", POINT);
    let header = tmp.path().join("point.h");
    let header_arg = header.to_string_lossy().into_owned();

    let first = reprc(&[&input, "-o", &header_arg]);
    assert!(first.status.success());
    assert!(!stderr(&first).contains("No changes"));
    assert_eq!(std::fs::read_to_string(&header).unwrap(), POINT_HEADER);

    let second = reprc(&[&input, "-o", &header_arg]);
    assert!(second.status.success());
    assert!(stderr(&second).contains(&format!("No changes for file {}", header_arg)));
}

#[test]
fn test_changed_input_overwrites_output() {
    let tmp = tempfile::tempdir().unwrap();
    let header = tmp.path().join("out.h");
    std::fs::write(&header, "stale").unwrap();
    let input = write_input(tmp.path(), "point.rs", POINT);

    let output = reprc(&[&input, "--output", &header.to_string_lossy()]);
    assert!(output.status.success());
    assert_eq!(std::fs::read_to_string(&header).unwrap(), POINT_HEADER);
}

#[test]
fn test_non_ascii_output_gets_bom() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_input(tmp.path(), "grid.rs", "#[repr(C)]\npub struct Größe {\n    pub w: u32,\n}\n");
    let header = tmp.path().join("grid.h");

    let output = reprc(&[&input, "-o", &header.to_string_lossy()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let bytes = std::fs::read(&header).unwrap();
    assert!(bytes.starts_with(b"\xEF\xBB\xBF#pragma once\n"));
}

#[test]
fn test_custom_include() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_input(tmp.path(), "point.rs", POINT);

    let output = reprc(&[&input, "--include", "ffi/base.h"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("#pragma once\n#include \"ffi/base.h\"\n"));
}

#[test]
fn test_notices_go_to_stderr() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_input(
        tmp.path(),
        "mixed.rs",
        "struct Q { x: u32 }\n#[repr(C)]\npub struct Bad {\n    pub b: Box<u8>,\n}\n",
    );

    let output = reprc(&[&input]);
    assert!(output.status.success());
    let err = stderr(&output);
    assert!(err.contains("skipping struct Q"));
    assert!(err.contains("warning: struct Bad has fields of unknown type"));
    assert!(err.contains("<ERROR_TYPE(Box<u8>)> b;"));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "#pragma once\n#include \"rust/rust_spt.h\"\n\n"
    );
}

#[test]
fn test_unrecognized_input_fails() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_input(tmp.path(), "main.rs", "fn main() {}\n");
    let header = tmp.path().join("main.h");

    let output = reprc(&[&input, "-o", &header.to_string_lossy()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("no rule matched"));
    assert!(!header.exists());
}

#[test]
fn test_missing_input_fails() {
    let tmp = tempfile::tempdir().unwrap();
    let missing = tmp.path().join("nope.rs");

    let output = reprc(&[&missing.to_string_lossy()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Error reading file"));
}
