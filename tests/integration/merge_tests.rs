//! Merge pass integration tests
//!
//! Databases arrive as loose XML files, zip/jar archives and directory
//! trees mixing both.

use extractannotations::{ApiSurface, Config, Merger, Session};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;
use zip::write::FileOptions;
use zip::ZipWriter;

const VIEW_DOCUMENT: &str = r#"<root>
  <item name="android.view.View void setVisibility(int) 0">
    <annotation name="android.support.annotation.IntDef">
      <val name="value" val="{android.view.View.VISIBLE, android.view.View.GONE}" />
    </annotation>
  </item>
  <item name="android.view.View android.view.View findFocus()">
    <annotation name="android.support.annotation.Nullable" />
  </item>
</root>
"#;

const CONTEXT_DOCUMENT: &str = r#"<root>
  <item name="android.content.Context java.lang.String getString(int) 0">
    <annotation name="android.support.annotation.StringRes" />
  </item>
  <item name="android.content.Context java.lang.String getString(int)">
    <annotation name="androidx.annotation.NonNull" />
  </item>
</root>
"#;

fn write_archive(path: &Path, entries: &[(&str, &str)]) {
    let mut zip = ZipWriter::new(File::create(path).unwrap());
    for (name, text) in entries {
        zip.start_file(*name, FileOptions::default()).unwrap();
        zip.write_all(text.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

fn merge(session: &mut Session, config: &Config, path: &Path) -> extractannotations::MergeSummary {
    Merger::new(session, config, None).merge_path(path).unwrap()
}

// ============================================================================
// Sources
// ============================================================================

#[test]
fn test_merge_single_xml_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("annotations.xml");
    fs::write(&path, VIEW_DOCUMENT).unwrap();

    let config = Config::default();
    let mut session = Session::from_config(&config);
    let summary = merge(&mut session, &config, &path);

    assert_eq!(summary.items, 2);
    assert_eq!(summary.annotations, 2);
    let item = session
        .index
        .find_item("android.view.View", "android.view.View void setVisibility(int) 0")
        .unwrap();
    // Legacy namespace rewritten to the canonical one
    let typedef = item.annotation("androidx.annotation.IntDef").unwrap();
    assert_eq!(
        typedef.attribute("value"),
        Some("{android.view.View.VISIBLE, android.view.View.GONE}")
    );
}

#[test]
fn test_merge_jar_entries() {
    let dir = TempDir::new().unwrap();
    let jar = dir.path().join("platform.jar");
    write_archive(
        &jar,
        &[
            ("android/view/annotations.xml", VIEW_DOCUMENT),
            ("android/content/annotations.xml", CONTEXT_DOCUMENT),
            ("META-INF/MANIFEST.MF", "Manifest-Version: 1.0\n"),
        ],
    );

    let config = Config::default();
    let mut session = Session::from_config(&config);
    let summary = merge(&mut session, &config, &jar);

    assert_eq!(summary.items, 4);
    assert_eq!(session.index.package_count(), 2);
    assert_eq!(session.stats.merged["androidx.annotation.StringRes"], 1);
    assert_eq!(session.stats.total_merged(), 4);
}

#[test]
fn test_merge_directory_skips_excluded_paths() {
    let dir = TempDir::new().unwrap();
    let view = dir.path().join("view");
    let build = dir.path().join("build");
    fs::create_dir_all(&view).unwrap();
    fs::create_dir_all(&build).unwrap();
    fs::write(view.join("annotations.xml"), VIEW_DOCUMENT).unwrap();
    fs::write(build.join("annotations.xml"), CONTEXT_DOCUMENT).unwrap();
    fs::write(view.join("notes.txt"), "not a database").unwrap();
    write_archive(
        &dir.path().join("extra.zip"),
        &[("android/content/annotations.xml", CONTEXT_DOCUMENT)],
    );

    let config = Config::default();
    let mut session = Session::from_config(&config);
    let summary = merge(&mut session, &config, dir.path());

    // view/annotations.xml and extra.zip; build/ is excluded
    assert_eq!(summary.items, 4);
    assert_eq!(session.index.package_count(), 2);
}

#[test]
fn test_missing_source_is_an_error() {
    let dir = TempDir::new().unwrap();
    let config = Config::default();
    let mut session = Session::from_config(&config);

    let result = Merger::new(&mut session, &config, None).merge_path(&dir.path().join("nope.zip"));
    assert!(result.is_err());
}

#[test]
fn test_corrupt_archive_is_skipped() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("broken.zip"), "this is not a zip").unwrap();
    fs::write(dir.path().join("view.xml"), VIEW_DOCUMENT).unwrap();

    let config = Config::default();
    let mut session = Session::from_config(&config);
    let summary = merge(&mut session, &config, dir.path());

    assert_eq!(summary.items, 2);
}

#[test]
fn test_broken_document_does_not_stop_the_merge() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.xml"), "<root>\n  <item name=\"x.Y z\">\n").unwrap();
    fs::write(dir.path().join("b.xml"), VIEW_DOCUMENT).unwrap();

    let config = Config::default();
    let mut session = Session::from_config(&config);
    let summary = merge(&mut session, &config, dir.path());

    assert_eq!(summary.items, 2);
    assert_eq!(session.index.len(), 2);
}

#[test]
fn test_undecodable_document_does_not_stop_the_merge() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.xml"), VIEW_DOCUMENT).unwrap();
    fs::write(dir.path().join("b.xml"), b"<root>\xff\xfe</root>").unwrap();

    let config = Config::default();
    let mut session = Session::from_config(&config);
    let summary = merge(&mut session, &config, dir.path());

    assert_eq!(summary.items, 2);
    assert_eq!(session.index.len(), 2);
}

// ============================================================================
// Semantics
// ============================================================================

#[test]
fn test_merging_twice_changes_nothing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("annotations.xml");
    fs::write(&path, VIEW_DOCUMENT).unwrap();

    let config = Config::default();
    let mut session = Session::from_config(&config);
    merge(&mut session, &config, &path);
    let second = merge(&mut session, &config, &path);

    assert_eq!(second.annotations, 0);
    assert_eq!(second.skipped, 2);
    assert_eq!(session.index.len(), 2);
    assert_eq!(session.stats.total_merged(), 2);
}

#[test]
fn test_later_conflicting_nullability_is_dropped() {
    let dir = TempDir::new().unwrap();
    let first = dir.path().join("first.xml");
    let second = dir.path().join("second.xml");
    fs::write(&first, VIEW_DOCUMENT).unwrap();
    fs::write(
        &second,
        r#"<root>
  <item name="android.view.View android.view.View findFocus()">
    <annotation name="androidx.annotation.NonNull" />
    <annotation name="androidx.annotation.CheckResult" />
  </item>
</root>
"#,
    )
    .unwrap();

    let config = Config::default();
    let mut session = Session::from_config(&config);
    merge(&mut session, &config, &first);
    let summary = merge(&mut session, &config, &second);

    assert_eq!(summary.annotations, 1);
    assert_eq!(session.stats.conflicts, 1);
    let item = session
        .index
        .find_item("android.view.View", "android.view.View android.view.View findFocus()")
        .unwrap();
    assert!(item.has_annotation("androidx.annotation.Nullable"));
    assert!(!item.has_annotation("androidx.annotation.NonNull"));
    assert!(item.has_annotation("androidx.annotation.CheckResult"));
}

#[test]
fn test_api_filter_spares_historic_entries() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("annotations.xml");
    fs::write(
        &path,
        r#"<root>
  <item name="android.view.View void setAlpha(float) 0">
    <annotation name="androidx.annotation.FloatRange">
      <val name="from" val="0.0" />
      <val name="to" val="1.0" />
    </annotation>
  </item>
  <item name="android.view.View void setLegacy(int) 0">
    <annotation name="androidx.annotation.IntRange">
      <val name="from" val="0" />
      <val name="apis" val="&quot;..22&quot;" />
    </annotation>
  </item>
  <item name="android.view.View void setRemoved(int) 0">
    <annotation name="androidx.annotation.IntRange">
      <val name="from" val="0" />
    </annotation>
  </item>
</root>
"#,
    )
    .unwrap();
    let api = ApiSurface::parse_content("android.view.View\n    void setAlpha(float)\n").unwrap();

    let config = Config::default();
    let mut session = Session::from_config(&config);
    let summary = Merger::new(&mut session, &config, Some(&api))
        .merge_path(&path)
        .unwrap();

    assert_eq!(summary.items, 2);
    assert_eq!(session.stats.filtered, 1);
    assert!(session
        .index
        .find_item("android.view.View", "android.view.View void setLegacy(int) 0")
        .is_some());
    assert!(session
        .index
        .find_item("android.view.View", "android.view.View void setRemoved(int) 0")
        .is_none());
}

#[test]
fn test_keep_entries_go_to_the_tracker() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("annotations.xml");
    fs::write(
        &path,
        r#"<root>
  <item name="com.example.Widget void onAttached()">
    <annotation name="android.support.annotation.Keep" />
  </item>
</root>
"#,
    )
    .unwrap();

    let config = Config::default();
    let mut session = Session::from_config(&config);
    merge(&mut session, &config, &path);

    assert!(session.index.is_empty());
    assert_eq!(session.tracker.keep_items().len(), 1);
    assert_eq!(session.stats.kept, 1);
}

#[test]
fn test_keep_entries_outside_the_api_are_kept() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("annotations.xml");
    fs::write(
        &path,
        r#"<root>
  <item name="com.example.Widget int compute(int, int)">
    <annotation name="androidx.annotation.Keep" />
  </item>
</root>
"#,
    )
    .unwrap();
    let api = ApiSurface::parse_content("com.example.Widget
    int other()
").unwrap();

    let config = Config::default();
    let mut session = Session::from_config(&config);
    Merger::new(&mut session, &config, Some(&api))
        .merge_path(&path)
        .unwrap();

    assert_eq!(session.tracker.keep_items().len(), 1);
    assert_eq!(session.stats.filtered, 0);
    assert_eq!(session.stats.merged["androidx.annotation.Keep"], 1);
}
