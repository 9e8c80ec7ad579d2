//! End-to-end pipeline tests
//!
//! Extract from a declaration tree, write the archive and side files, then
//! read the archive back the way a downstream module would.

use extractannotations::{
    write_keep_rules, write_typedef_manifest, AnnotationsWriter, ApiSurface, Config,
    DeclarationTree, Extractor, Merger, Session,
};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use tempfile::TempDir;
use zip::ZipArchive;

const WIDGET_TREE: &str = r#"{
    "units": [{
        "path": "src/com/example/Widget.java",
        "package": "com.example",
        "classes": [{
            "name": "Widget",
            "fields": [
                {"name": "MODE_A", "type": "int"},
                {"name": "MODE_B", "type": "int"}
            ],
            "methods": [
                {
                    "name": "setMode",
                    "return_type": "void",
                    "parameters": [{
                        "name": "mode",
                        "type": "int",
                        "annotations": [{"name": "com.example.Widget.Mode"}]
                    }]
                },
                {
                    "name": "getLabel",
                    "return_type": "java.lang.String",
                    "annotations": [
                        {"name": "android.support.annotation.Nullable"},
                        {"name": "java.lang.Deprecated"}
                    ]
                },
                {
                    "name": "setLevel",
                    "return_type": "void",
                    "parameters": [{
                        "name": "level",
                        "type": "int",
                        "annotations": [{
                            "name": "androidx.annotation.IntRange",
                            "attributes": [
                                {"name": "from", "value": {"literal": "0"}},
                                {"name": "to", "value": {"literal": "10"}}
                            ]
                        }]
                    }]
                },
                {
                    "name": "Widget",
                    "constructor": true,
                    "parameters": [{
                        "name": "context",
                        "type": "android.content.Context",
                        "annotations": [{"name": "org.jetbrains.annotations.NotNull"}]
                    }]
                }
            ],
            "classes": [{
                "name": "Mode",
                "kind": "annotation",
                "visibility": "package",
                "annotations": [
                    {
                        "name": "androidx.annotation.IntDef",
                        "attributes": [{"name": "value", "value": {"array": [
                            {"reference": {"qualifier": "com.example.Widget", "name": "MODE_A"}},
                            {"reference": {"qualifier": "com.example.Widget", "name": "MODE_B"}}
                        ]}}]
                    },
                    {
                        "name": "java.lang.annotation.Retention",
                        "attributes": [{"name": "value", "value": {"reference": {
                            "qualifier": "java.lang.annotation.RetentionPolicy",
                            "name": "SOURCE"
                        }}}]
                    }
                ]
            }]
        }, {
            "name": "Helper",
            "annotations": [{"name": "androidx.annotation.Keep"}],
            "methods": [{
                "name": "run",
                "return_type": "void",
                "annotations": [{"name": "androidx.annotation.Keep"}]
            }]
        }]
    }]
}"#;

const WIDGET_DOCUMENT: &str = r#"<root>
  <item name="com.example.Widget java.lang.String getLabel()">
    <annotation name="androidx.annotation.Nullable" />
  </item>
  <item name="com.example.Widget void setLevel(int) 0">
    <annotation name="androidx.annotation.IntRange">
      <val name="from" val="0" />
      <val name="to" val="10" />
    </annotation>
  </item>
  <item name="com.example.Widget void setMode(int) 0">
    <annotation name="androidx.annotation.IntDef">
      <val name="value" val="{com.example.Widget.MODE_A, com.example.Widget.MODE_B}" />
    </annotation>
  </item>
  <item name="com.example.Widget Widget(android.content.Context) 0">
    <annotation name="androidx.annotation.NonNull" />
  </item>
</root>
"#;

fn extract(config: &Config, api: Option<&ApiSurface>) -> Session {
    let tree = DeclarationTree::from_json(WIDGET_TREE).unwrap();
    let mut session = Session::from_config(config);
    let api = api.map(|a| a as &dyn extractannotations::ApiDatabase);
    Extractor::new(&mut session, config, api).extract(&tree).unwrap();
    session
}

fn read_archive(path: &Path) -> BTreeMap<String, String> {
    let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut entries = BTreeMap::new();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).unwrap();
        let mut text = String::new();
        entry.read_to_string(&mut text).unwrap();
        entries.insert(entry.name().to_string(), text);
    }
    entries
}

// ============================================================================
// Extraction and export
// ============================================================================

#[test]
fn test_archive_has_one_document_per_package() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("annotations.zip");
    let config = Config::default();
    let session = extract(&config, None);

    let summary = AnnotationsWriter::new(&config, None)
        .write(&session.index, &output)
        .unwrap();
    assert_eq!(summary.entries, 1);
    assert_eq!(summary.items, 4);
    assert_eq!(summary.annotations, 4);

    let entries = read_archive(&output);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries["com/example/annotations.xml"], WIDGET_DOCUMENT);
}

#[test]
fn test_no_temporary_file_left_behind() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("annotations.zip");
    let config = Config::default();
    let session = extract(&config, None);

    AnnotationsWriter::new(&config, None)
        .write(&session.index, &output)
        .unwrap();

    let names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["annotations.zip".to_string()]);
}

#[test]
fn test_keep_rules_and_typedef_manifest() {
    let dir = TempDir::new().unwrap();
    let keep = dir.path().join("keep.txt");
    let typedefs = dir.path().join("typedefs.txt");
    let session = extract(&Config::default(), None);

    assert_eq!(write_keep_rules(&session.tracker, &keep).unwrap(), 2);
    assert_eq!(
        fs::read_to_string(&keep).unwrap(),
        "-keep class com.example.Helper\n-keep class com.example.Helper {\n    void run()\n}\n"
    );

    assert_eq!(write_typedef_manifest(&session.tracker, &typedefs).unwrap(), 1);
    assert_eq!(
        fs::read_to_string(&typedefs).unwrap(),
        "D com/example/Widget$Mode\n"
    );
}

#[test]
fn test_keep_items_not_in_archive() {
    let session = extract(&Config::default(), None);
    assert!(session.index.iter().all(|item| item.container != "com.example.Helper"));
    assert_eq!(session.stats.kept, 2);
}

#[test]
fn test_api_filter_drops_unlisted_members() {
    let api = ApiSurface::parse_content(
        "package com.example\n\
         com.example.Widget\n\
         \x20   java.lang.String getLabel()\n\
         \x20   Widget(android.content.Context)\n",
    )
    .unwrap();
    let session = extract(&Config::default(), Some(&api));

    let signatures: Vec<String> = session.index.iter().map(|item| item.signature()).collect();
    assert_eq!(signatures.len(), 2);
    assert!(signatures.contains(&"com.example.Widget java.lang.String getLabel()".to_string()));
    assert!(signatures.contains(&"com.example.Widget Widget(android.content.Context) 0".to_string()));
    assert_eq!(session.stats.filtered, 2);
    // Keep-marked items bypass the API filter
    assert_eq!(session.tracker.keep_items().len(), 2);
}

#[test]
fn test_sorted_attributes() {
    let config = Config {
        sort_attributes: true,
        ..Config::default()
    };
    let tree = DeclarationTree::from_json(
        r#"{"units": [{"package": "p", "classes": [{
            "name": "C",
            "fields": [{
                "name": "SIZE",
                "type": "int",
                "annotations": [{
                    "name": "androidx.annotation.Size",
                    "attributes": [
                        {"name": "multiple", "value": {"literal": "2"}},
                        {"name": "max", "value": {"literal": "8"}},
                        {"name": "value", "value": {"literal": "4"}}
                    ]
                }]
            }]
        }]}]}"#,
    )
    .unwrap();
    let mut session = Session::from_config(&config);
    Extractor::new(&mut session, &config, None).extract(&tree).unwrap();

    let (_, classes) = session.index.packages().next().unwrap();
    let document = AnnotationsWriter::new(&config, None).render_package(classes);
    assert_eq!(
        document.text,
        "<root>\n\
         \x20 <item name=\"p.C SIZE\">\n\
         \x20   <annotation name=\"androidx.annotation.Size\">\n\
         \x20     <val name=\"value\" val=\"4\" />\n\
         \x20     <val name=\"max\" val=\"8\" />\n\
         \x20     <val name=\"multiple\" val=\"2\" />\n\
         \x20   </annotation>\n\
         \x20 </item>\n\
         </root>\n"
    );
}

// ============================================================================
// Round trip through the merge pass
// ============================================================================

#[test]
fn test_archive_merges_back() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("annotations.zip");
    let config = Config::default();
    let session = extract(&config, None);
    AnnotationsWriter::new(&config, None)
        .write(&session.index, &output)
        .unwrap();

    let mut imported = Session::from_config(&config);
    let summary = Merger::new(&mut imported, &config, None)
        .merge_path(&output)
        .unwrap();

    assert_eq!(summary.items, 4);
    assert_eq!(summary.skipped, 0);
    for item in imported.index.iter() {
        let original = session
            .index
            .find_item(&item.container, &item.signature())
            .expect("imported item exists in the original index");
        assert_eq!(original.annotations, item.annotations);
    }
    let level = imported
        .index
        .find_item("com.example.Widget", "com.example.Widget void setLevel(int) 0")
        .unwrap();
    let range = level.annotation("androidx.annotation.IntRange").unwrap();
    assert_eq!(range.attribute("from"), Some("0"));
    assert_eq!(range.attribute("to"), Some("10"));

    // The typedef usage survives without the typedef's own declaration
    let mode = imported
        .index
        .find_item("com.example.Widget", "com.example.Widget void setMode(int) 0")
        .unwrap();
    let typedef = mode.annotation("androidx.annotation.IntDef").unwrap();
    assert_eq!(
        typedef.attribute("value"),
        Some("{com.example.Widget.MODE_A, com.example.Widget.MODE_B}")
    );
}

#[test]
fn test_merge_into_extracted_session_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("annotations.zip");
    let config = Config::default();
    let mut session = extract(&config, None);
    AnnotationsWriter::new(&config, None)
        .write(&session.index, &output)
        .unwrap();
    let before = session.index.len();

    let summary = Merger::new(&mut session, &config, None)
        .merge_path(&output)
        .unwrap();
    assert_eq!(summary.annotations, 0);
    assert_eq!(session.index.len(), before);
    assert_eq!(session.stats.total_merged(), 0);
}
