//! Context file loading and merge-precedence integration tests.

use assert_fs::prelude::*;
use rstest::rstest;
use stencil_core::{load, load_file, merge, Context, ContextError, Value};

fn ctx(json: &str) -> Context {
    let value: Value = serde_json::from_str(json).expect("fixture json");
    Context::try_from(value).expect("fixture must be a mapping")
}

// ---------------------------------------------------------------------------
// 1. Loading
// ---------------------------------------------------------------------------

#[rstest]
#[case("ctx.json", r#"{"name": "stencil", "nested": {"n": 1}}"#)]
#[case("ctx.yaml", "name: stencil\nnested:\n  n: 1\n")]
#[case("ctx.yml", "name: stencil\nnested: {n: 1}\n")]
fn json_and_yaml_load_to_the_same_context(#[case] file: &str, #[case] contents: &str) {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    dir.child(file).write_str(contents).expect("write");

    let loaded = load_file(&dir.path().join(file)).expect("load");
    assert_eq!(loaded, ctx(r#"{"name": "stencil", "nested": {"n": 1}}"#));
}

#[test]
fn unsupported_extension_is_rejected() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    dir.child("ctx.toml").write_str("name = 'x'").expect("write");

    let err = load(Some(&dir.path().join("ctx.toml"))).unwrap_err();
    assert!(matches!(err, ContextError::UnsupportedFormat { .. }), "got: {err}");
    assert!(err.to_string().contains("ctx.toml"));
}

#[test]
fn corrupt_yaml_reports_path_and_parser_diagnostic() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    dir.child("ctx.yaml")
        .write_str("a: [unclosed\n  b: : :")
        .expect("write");

    let err = load_file(&dir.path().join("ctx.yaml")).unwrap_err();
    let msg = err.to_string();
    assert!(matches!(err, ContextError::Parse { .. }), "got: {msg}");
    assert!(msg.contains("ctx.yaml"), "must contain file path, got: {msg}");
    let source = std::error::Error::source(&err).expect("parser diagnostic").to_string();
    assert!(!source.is_empty());
}

#[test]
fn unreadable_path_is_read_error() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    // A directory named like a context file cannot be read as text.
    dir.child("ctx.json").create_dir_all().expect("mkdir");

    let err = load_file(&dir.path().join("ctx.json")).unwrap_err();
    assert!(matches!(err, ContextError::Read { .. }), "got: {err}");
}

// ---------------------------------------------------------------------------
// 2. Merge precedence
// ---------------------------------------------------------------------------

#[test]
fn three_way_merge_follows_c_over_b_over_a() {
    let a = ctx(r#"{"x": 1, "deep": {"k1": "a", "k2": "a", "k3": "a", "more": {"z": "a"}}}"#);
    let b = ctx(r#"{"y": 2, "deep": {"k2": "b", "k3": "b", "more": {"z": "b", "w": "b"}}}"#);
    let c = ctx(r#"{"x": 3, "deep": {"k3": "c", "more": {"w": "c"}}}"#);

    let left = merge(&merge(&a, &b), &c);
    let right = merge(&a, &merge(&b, &c));
    let expected = ctx(
        r#"{"x": 3, "y": 2, "deep": {"k1": "a", "k2": "b", "k3": "c", "more": {"z": "b", "w": "c"}}}"#,
    );
    assert_eq!(left, expected);
    assert_eq!(right, expected);
}

#[test]
fn disjoint_key_sets_merge_associatively() {
    let a = ctx(r#"{"a": {"one": 1}}"#);
    let b = ctx(r#"{"b": {"two": 2}}"#);
    let c = ctx(r#"{"a": {"three": 3}}"#);
    assert_eq!(merge(&merge(&a, &b), &c), merge(&a, &merge(&b, &c)));
}

#[test]
fn merge_with_empty_is_identity_after_load() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    dir.child("ctx.yaml")
        .write_str("list: [1, 2]\nmap:\n  inner: ~\n")
        .expect("write");
    let base = load_file(&dir.path().join("ctx.yaml")).expect("load");
    assert_eq!(merge(&base, &Context::new()), base);
}
