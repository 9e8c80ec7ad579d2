//! CLI integration tests
//!
//! These tests run the built binary against temporary inputs.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const TREE: &str = r#"{
    "units": [{
        "package": "com.example",
        "classes": [{
            "name": "Widget",
            "methods": [{
                "name": "getLabel",
                "return_type": "java.lang.String",
                "annotations": [{"name": "androidx.annotation.Nullable"}]
            }]
        }, {
            "name": "Helper",
            "annotations": [{"name": "androidx.annotation.Keep"}]
        }]
    }]
}"#;

const DOCUMENT: &str = r#"<root>
  <item name="android.view.View android.view.View findFocus()">
    <annotation name="android.support.annotation.Nullable" />
  </item>
</root>
"#;

fn cli() -> Command {
    Command::cargo_bin("extractannotations").unwrap()
}

fn write_tree(dir: &Path) -> String {
    let path = dir.join("declarations.json");
    fs::write(&path, TREE).unwrap();
    path.to_string_lossy().to_string()
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_help() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--declarations"))
        .stdout(predicate::str::contains("--merge"));
}

#[test]
fn test_version() {
    cli()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("extractannotations"));
}

#[test]
fn test_nothing_to_do_fails() {
    let dir = TempDir::new().unwrap();
    cli()
        .current_dir(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Nothing to do"));
}

// ============================================================================
// Pipeline
// ============================================================================

#[test]
fn test_extract_writes_all_outputs() {
    let dir = TempDir::new().unwrap();
    let tree = write_tree(dir.path());
    let output = dir.path().join("annotations.zip");
    let keep = dir.path().join("keep.txt");

    cli()
        .current_dir(dir.path())
        .args(["--declarations", &tree, "--output"])
        .arg(&output)
        .arg("--keep")
        .arg(&keep)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 1 annotations on 1 items"));

    assert!(output.exists());
    assert_eq!(
        fs::read_to_string(&keep).unwrap(),
        "-keep class com.example.Helper\n"
    );
}

#[test]
fn test_merge_only_run() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("platform.xml");
    fs::write(&input, DOCUMENT).unwrap();
    let output = dir.path().join("out.zip");

    cli()
        .current_dir(dir.path())
        .arg("--merge")
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .assert()
        .success();

    assert!(output.exists());
}

#[test]
fn test_missing_declarations_file_fails() {
    let dir = TempDir::new().unwrap();
    cli()
        .current_dir(dir.path())
        .args(["--declarations", "missing.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load declarations"));
}

#[test]
fn test_stats_report() {
    let dir = TempDir::new().unwrap();
    let tree = write_tree(dir.path());

    cli()
        .current_dir(dir.path())
        .args(["--declarations", &tree, "--stats"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Annotations: 2 extracted"))
        .stdout(predicate::str::contains("androidx.annotation.Nullable"));
}

#[test]
fn test_quiet_suppresses_summary() {
    let dir = TempDir::new().unwrap();
    let tree = write_tree(dir.path());
    let output = dir.path().join("annotations.zip");

    cli()
        .current_dir(dir.path())
        .args(["--quiet", "--declarations", &tree, "--output"])
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_config_file_is_picked_up() {
    let dir = TempDir::new().unwrap();
    let tree = write_tree(dir.path());
    fs::write(
        dir.path().join(".extractannotations.yml"),
        "variants: [debug, release]\nvariant: debug\n",
    )
    .unwrap();

    cli()
        .current_dir(dir.path())
        .args(["--declarations", &tree, "--stats"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Does not apply to variants: release"));
}

// ============================================================================
// Typedef conventions
// ============================================================================

const PUBLIC_TYPEDEF_TREE: &str = r#"{
    "units": [{
        "package": "com.example",
        "classes": [{
            "name": "Mode",
            "kind": "annotation",
            "visibility": "public",
            "annotations": [
                {"name": "androidx.annotation.IntDef"},
                {
                    "name": "java.lang.annotation.Retention",
                    "attributes": [{"name": "value", "value": {"reference": {
                        "qualifier": "java.lang.annotation.RetentionPolicy",
                        "name": "SOURCE"
                    }}}]
                }
            ]
        }]
    }]
}"#;

#[test]
fn test_strict_typedefs_from_environment() {
    let dir = TempDir::new().unwrap();
    let tree = dir.path().join("declarations.json");
    fs::write(&tree, PUBLIC_TYPEDEF_TREE).unwrap();

    cli()
        .current_dir(dir.path())
        .env("EXTRACT_ANNOTATIONS_STRICT_TYPEDEFS", "true")
        .arg("--declarations")
        .arg(&tree)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Typedef convention violated"))
        .stderr(predicate::str::contains("com.example.Mode"));
}

#[test]
fn test_typedef_violations_only_warn_by_default() {
    let dir = TempDir::new().unwrap();
    let tree = dir.path().join("declarations.json");
    fs::write(&tree, PUBLIC_TYPEDEF_TREE).unwrap();

    cli()
        .current_dir(dir.path())
        .env_remove("EXTRACT_ANNOTATIONS_STRICT_TYPEDEFS")
        .arg("--declarations")
        .arg(&tree)
        .assert()
        .success();
}
