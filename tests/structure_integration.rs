//! Integration tests for tree reconstruction and scoring.
//!
//! These tests parse the analyzer output fixture in testdata and score the
//! resulting tree with the built-in and file-based models.

use std::fs;
use std::path::{Path, PathBuf};

use semweight::analysis::{parse_output, ElementKind, ParseError};
use semweight::model::{ModelDirectory, ModelSource, WeightModel};
use semweight::score;

fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

fn sample_output() -> String {
    fs::read_to_string(testdata_path().join("sample_output.txt")).expect("should read fixture")
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn test_fixture_tree_shape() {
    let tree = parse_output(&sample_output()).expect("fixture should parse");
    let root = tree.root();

    assert_eq!(root.kind(), &ElementKind::Root);
    assert_eq!(root.end(), 2400);
    assert_eq!(tree.element_count(), 13);

    let classes: Vec<_> = root.children().collect();
    assert_eq!(classes.len(), 2);

    let first = classes[0];
    assert_eq!(first.child_count(), 9);
    assert_eq!(first.functions().count(), 4);
    assert_eq!(first.properties().count(), 2);
    assert_eq!(first.fields().count(), 1);
    assert_eq!(first.comments().count(), 2);

    let second = classes[1];
    assert_eq!((second.start(), second.end()), (1900, 2400));
    assert_eq!(second.functions().count(), 2);
    assert!(second.parent().map(|p| p.is_root()).unwrap_or(false));
}

#[test]
fn test_fixture_weights_with_standard_model() {
    let tree = parse_output(&sample_output()).unwrap();
    let model = WeightModel::standard();

    // First class: length 1840 in range, one class, four functions, three
    // members (0.95).
    let first = tree.root().children().next().unwrap();
    assert_close(score::score(first, &model), 10.0 + 10.0 + 10.0 + 8.0 * 0.95);

    // Root: two classes (0.8), no direct functions (0.6) or members (0.8).
    assert_close(score::score(tree.root(), &model), 10.0 + 8.0 + 6.0 + 6.4);
}

#[test]
fn test_fixture_weights_with_model_directory() {
    let models = ModelDirectory::new(testdata_path().join("models"));
    let model = models.model_for(Path::new("Program.cs")).unwrap();
    assert_eq!(model.base_length_weight, 20.0);

    let tree = parse_output(&sample_output()).unwrap();
    let b = score::breakdown(tree.root(), &model);

    assert_close(b.length_multiplier, 2.0);
    assert_close(b.length_weight, 40.0);
    assert_close(b.total(), 40.0 + 8.0 + 6.0 + 4.0);
}

#[test]
fn test_other_extensions_use_default_model_file() {
    let models = ModelDirectory::new(testdata_path().join("models"));
    let model = models.model_for(Path::new("script.py")).unwrap();

    assert_eq!(model.base_length_weight, 1.0);
    assert_eq!(model.base_class_weight, 0.0);
}

#[test]
fn test_parse_and_score_are_idempotent() {
    let output = sample_output();
    let a = parse_output(&output).unwrap();
    let b = parse_output(&output).unwrap();
    assert_eq!(a, b);

    let model = WeightModel::standard();
    assert_eq!(
        score::breakdown(a.root(), &model),
        score::breakdown(b.root(), &model)
    );
}

#[test]
fn test_truncated_output_is_rejected() {
    let mut output = sample_output();
    output.push_str("function - [2400-\n");

    let err = parse_output(&output).unwrap_err();
    assert!(matches!(err, ParseError::Malformed { line_number: 14, .. }));
}
