//! Integration tests for the batch runner with real analyzer processes.
//!
//! Each test builds a scratch analyzer root whose `cs` analyzer is a POSIX
//! shell script, then scores the project fixture in testdata.

#![cfg(unix)]

use std::fs;
use std::path::{Path, PathBuf};

use semweight::analysis::{FileError, InvokeError, Runner};
use semweight::config::Settings;
use semweight::files::{self, FileGroup};
use semweight::model::{FixedModel, ModelDirectory, WeightModel};
use semweight::registry::{AnalyzerRegistry, DECLARATIONS_FILE, DESCRIPTOR_FILE};
use tempfile::TempDir;

fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

/// Analyzer script: records its arguments, then prints the fixture output
/// for Program.cs and a small class for anything else.
fn fixture_script() -> String {
    let fixture = testdata_path().join("sample_output.txt");
    format!(
        r#"printf '%s\n' "$@" > last_args.txt
case "$(basename "$2")" in
  Program.cs) cat '{}' ;;
  *) printf 'class - [0-80]\nproperty - [20-60]\n' ;;
esac
"#,
        fixture.display()
    )
}

/// Scratch analyzer root with a single `cs` analyzer running `script`.
fn analyzer_root(script: &str) -> (TempDir, AnalyzerRegistry) {
    let temp = TempDir::new().expect("should create temp dir");
    fs::write(temp.path().join(DECLARATIONS_FILE), "{}").unwrap();

    let cs = temp.path().join("lang-semantics").join("cs");
    fs::create_dir_all(&cs).unwrap();
    fs::write(cs.join(DESCRIPTOR_FILE), "sh analyze.sh\n").unwrap();
    fs::write(cs.join("analyze.sh"), script).unwrap();

    let registry = AnalyzerRegistry::new(temp.path().join("lang-semantics"));
    (temp, registry)
}

fn project_groups() -> Vec<FileGroup> {
    files::collect_groups(&testdata_path().join("project"), &Settings::default())
        .expect("should collect project files")
}

fn file_names(group: &[semweight::FileAnalysis]) -> Vec<String> {
    group
        .iter()
        .map(|a| a.path.file_name().unwrap().to_string_lossy().to_string())
        .collect()
}

#[test]
fn test_project_groups() {
    let groups = project_groups();
    let names: Vec<_> = groups.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, vec!["assets", "src"]);
    assert_eq!(groups[1].len(), 2);
}

#[test]
fn test_scores_project_with_fallback_for_unsupported_files() {
    let (_temp, registry) = analyzer_root(&fixture_script());
    let models = FixedModel::default();
    let groups = project_groups();

    let results = Runner::new(&registry, &models)
        .run(&groups)
        .expect("batch should succeed");

    assert_eq!(results.len(), 2);

    let assets = &results[0];
    assert_eq!(file_names(assets), vec!["logo.bin"]);
    assert!(assets[0].is_fallback());
    assert!(assets[0].model.is_zero());
    assert_eq!(assets[0].tree.root().child_count(), 0);

    let src = &results[1];
    assert_eq!(file_names(src), vec!["Helper.cs", "Program.cs"]);
    assert!(src.iter().all(|a| a.analyzed));
    assert_eq!(src[1].tree.element_count(), 13);
    assert_eq!(src[1].tree.root().end(), 2400);
    assert!((src[1].total_weight() - 30.4).abs() < 1e-9);
}

#[test]
fn test_analyzer_receives_declarations_and_absolute_target() {
    let (temp, registry) = analyzer_root(&fixture_script());
    let models = FixedModel::default();
    let program = testdata_path().join("project/src/Program.cs");

    Runner::new(&registry, &models)
        .analyze_file(&program)
        .expect("analysis should succeed");

    let args = fs::read_to_string(registry.root().join("cs/last_args.txt"))
        .expect("analyzer should run in its own directory");
    let args: Vec<&str> = args.lines().collect();

    let declarations = temp.path().canonicalize().unwrap().join(DECLARATIONS_FILE);
    assert_eq!(args.len(), 2);
    assert_eq!(Path::new(args[0]), declarations.as_path());
    assert_eq!(Path::new(args[1]), program.canonicalize().unwrap().as_path());
}

#[test]
fn test_supported_and_unsupported_batch() {
    let (temp, registry) = analyzer_root(&fixture_script());
    let models = FixedModel::default();

    let supported = temp.path().join("supported.cs");
    let unsupported = temp.path().join("unsupported.bin");
    fs::write(&supported, "class A {}").unwrap();
    fs::write(&unsupported, [0u8, 1, 2]).unwrap();

    let group = FileGroup::new("scratch", vec![supported, unsupported]);
    let results = Runner::new(&registry, &models).run(&[group]).unwrap();

    assert_eq!(results[0].len(), 2);
    assert!(results[0][0].analyzed);
    let (model, tree) = results[0][1].pair();
    assert_eq!(model, &WeightModel::default());
    assert!(!tree.has_elements());
}

#[test]
fn test_parallel_run_matches_sequential() {
    let (_temp, registry) = analyzer_root(&fixture_script());
    let models = ModelDirectory::new(testdata_path().join("models"));
    let groups = project_groups();

    let sequential = Runner::new(&registry, &models).run(&groups).unwrap();
    let parallel = Runner::new(&registry, &models)
        .parallel(true)
        .run(&groups)
        .unwrap();

    assert_eq!(sequential.len(), parallel.len());
    for (a, b) in sequential.iter().zip(&parallel) {
        assert_eq!(file_names(a), file_names(b));
        for (x, y) in a.iter().zip(b) {
            assert_eq!(x.tree, y.tree);
            assert_eq!(x.weight, y.weight);
        }
    }

    // Program.cs is scored with testdata/models/cs.yaml.
    assert!((parallel[1][1].total_weight() - 58.0).abs() < 1e-9);
}

#[test]
fn test_failing_analyzer_aborts_batch() {
    let (_temp, registry) = analyzer_root("echo 'cannot load project' >&2\nexit 3\n");
    let models = FixedModel::default();
    let groups = project_groups();

    let err = Runner::new(&registry, &models).run(&groups).unwrap_err();
    assert!(err.path.ends_with("Helper.cs"));
    match err.source {
        FileError::Invoke(InvokeError::Failed { status, stderr, .. }) => {
            assert_eq!(status, Some(3));
            assert!(stderr.contains("cannot load project"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_malformed_analyzer_output_aborts_batch() {
    let (_temp, registry) = analyzer_root("echo 'class [0-100]'\n");
    let models = FixedModel::default();

    let err = Runner::new(&registry, &models)
        .analyze_file(&testdata_path().join("project/src/Helper.cs"))
        .unwrap_err();
    assert!(matches!(err.source, FileError::Parse(_)));
}
