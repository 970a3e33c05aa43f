//! Regression tests for fuzz crashes

use depver::modfile::{self, ParseOptions};
use depver::{ManifestRecord, SENTINEL, extract_dependencies};
use std::panic::AssertUnwindSafe;

fn assert_no_panic(content: &str, name: &str) {
    let result = std::panic::catch_unwind(AssertUnwindSafe(|| extract_dependencies(content)));

    match result {
        Ok(json) if json == SENTINEL => {}
        Ok(json) => {
            let record: Result<ManifestRecord, _> = serde_json::from_str(&json);
            assert!(record.is_ok(), "{name}: output is not a record: {json}");
        }
        Err(_) => panic!("{name}: extraction should not panic"),
    }

    let lax = std::panic::catch_unwind(AssertUnwindSafe(|| {
        modfile::parse_with(content, ParseOptions::lax())
    }));
    assert!(lax.is_ok(), "{name}: lax parse should not panic");
}

#[test]
fn test_multibyte_characters() {
    // Column and byte offsets must stay on char boundaries
    assert_no_panic("module é/ü\nrequire 日本.com/x v1.0.0 // 間接\n", "multibyte");
    assert_no_panic("module m\nrequire \"日本\" v1.0.0\n", "multibyte string");
    assert_no_panic("// Deprecated: ✓\nmodule m\n", "multibyte deprecation");
}

#[test]
fn test_unterminated_strings() {
    assert_no_panic("module \"example.com/foo", "eof in string");
    assert_no_panic("module \"a\\", "escape at eof");
    assert_no_panic("module `raw\nstring`\n", "newline in raw string");
    assert_no_panic("require \"a\\x\" v1.0.0\n", "short hex escape");
    assert_no_panic("require \"\\u12\" v1.0.0\n", "short unicode escape");
    assert_no_panic("require \"\\U0011ffff\" v1.0.0\n", "escape beyond unicode range");
    assert_no_panic("require \"\\ud800\" v1.0.0\n", "surrogate escape");
}

#[test]
fn test_unbalanced_blocks() {
    assert_no_panic("require (", "open paren at eof");
    assert_no_panic("require (\n", "open block at eof");
    assert_no_panic(")\n", "stray close paren");
    assert_no_panic("require ( a v1.0.0 )\n", "inline block");
    assert_no_panic("require (\n(\n)\n)\n", "nested block");
    assert_no_panic("(\n)\n", "block without verb");
    assert_no_panic("retract [v1.0.0,\n", "open interval");
    assert_no_panic("retract ]]]]]][[[[[\n", "bracket soup");
}

#[test]
fn test_odd_versions() {
    assert_no_panic("require a.com/x v\n", "bare v");
    assert_no_panic("require a.com/x v1.\n", "trailing dot");
    assert_no_panic("require a.com/x v99999999999999999999999.0.0\n", "overflowing major");
    assert_no_panic("require a.com/x v1.0.0-\n", "empty prerelease");
    assert_no_panic("require a.com/x v1.0.0+\n", "empty build");
    assert_no_panic("require a.com/x/v v2.0.0\n", "empty path major");
    assert_no_panic("require gopkg.in/x.v v1.0.0\n", "empty gopkg.in major");
    assert_no_panic("go 1.\ngo .1\n", "truncated go versions");
    assert_no_panic("toolchain go1.\n", "truncated toolchain");
}

#[test]
fn test_control_bytes() {
    assert_no_panic("\0", "nul");
    assert_no_panic("module m\x01\n", "control in ident");
    assert_no_panic("\u{feff}module m\n", "byte order mark");
    assert_no_panic("module m\r\r\r", "bare carriage returns");
    assert_no_panic("/", "lone slash");
    assert_no_panic("module m/*x*/\n", "block comment after ident");
}

#[test]
fn test_deep_and_long_input() {
    let many_parens = "(".repeat(10_000);
    assert_no_panic(&many_parens, "many parens");

    let mut long = String::from("module m\nrequire (\n");
    for i in 0..5_000 {
        long.push_str(&format!("\tex{i}.com/x v1.0.{i}\n"));
    }
    long.push_str(")\n");
    let json = extract_dependencies(&long);
    let record: ManifestRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(record.dependencies.len(), 5_000);
    assert_eq!(record.dependencies[4_999], "ex4999.com/x;v1.0.4999");
}

#[test]
fn test_failure_is_sentinel_not_partial() {
    // One bad line anywhere discards the whole record
    let content = "module m\nrequire (\n\ta.com/x v1.0.0\n\tb.com/y not-a-version\n)\n";
    assert_eq!(extract_dependencies(content), SENTINEL);
}
