// Annotation database archive writer
//
// One `annotations.xml` per package, items in sort-signature order. The
// archive is built next to its destination and renamed into place.

use crate::annotations::names;
use crate::api::ApiDatabase;
use crate::config::Config;
use crate::error::{ExtractError, Result};
use crate::item::signature::{escape_xml, split_top_level};
use crate::item::{AnnotationData, Item, ItemIndex};
use crate::merge::parse_document;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use zip::write::FileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Outcome of re-parsing a generated document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Valid,
    Invalid {
        message: String,
        line: usize,
        column: usize,
    },
}

/// Check that a generated document parses back
pub fn validate_document(text: &str) -> Validation {
    match parse_document(text) {
        Ok(_) => Validation::Valid,
        Err(failure) => Validation::Invalid {
            message: failure.message,
            line: failure.line,
            column: failure.column,
        },
    }
}

/// Counts of what ended up in the archive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub entries: usize,
    pub items: usize,
    pub annotations: usize,
}

/// Writes an [`ItemIndex`] as an annotation database archive
pub struct AnnotationsWriter<'a> {
    api: Option<&'a dyn ApiDatabase>,
    sort_attributes: bool,
    assertions: bool,
}

impl<'a> AnnotationsWriter<'a> {
    pub fn new(config: &Config, api: Option<&'a dyn ApiDatabase>) -> Self {
        Self {
            api,
            sort_attributes: config.sort_attributes,
            assertions: config.assertions,
        }
    }

    /// Write the archive to `path`; on failure no archive is left behind
    pub fn write(&self, index: &ItemIndex, path: &Path) -> Result<ExportSummary> {
        let temp = temp_sibling(path);
        let result = self
            .write_archive(index, &temp)
            .and_then(|summary| {
                fs::rename(&temp, path).map_err(|e| archive_error(path, e))?;
                Ok(summary)
            });
        if result.is_err() && temp.exists() {
            if let Err(e) = fs::remove_file(&temp) {
                debug!("Could not remove {}: {}", temp.display(), e);
            }
        }
        let summary = result?;
        info!(
            "Wrote {} annotations on {} items in {} packages to {}",
            summary.annotations,
            summary.items,
            summary.entries,
            path.display()
        );
        Ok(summary)
    }

    fn write_archive(&self, index: &ItemIndex, path: &Path) -> Result<ExportSummary> {
        let file = File::create(path).map_err(|e| archive_error(path, e))?;
        let mut zip = ZipWriter::new(BufWriter::new(file));
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default());

        let mut summary = ExportSummary::default();
        for (package, classes) in index.packages() {
            let document = self.render_package(classes);
            if document.items == 0 {
                continue;
            }

            let entry = entry_name(package);
            match validate_document(&document.text) {
                Validation::Valid => {}
                Validation::Invalid {
                    message,
                    line,
                    column,
                } => {
                    let error = ExtractError::InvalidDocument {
                        entry: entry.clone(),
                        message: format!("{} at {}:{}", message, line, column),
                    };
                    if self.assertions {
                        return Err(error);
                    }
                    warn!("{}", error);
                }
            }

            zip.start_file(entry.as_str(), options)
                .map_err(|e| archive_error(path, e))?;
            zip.write_all(document.text.as_bytes())
                .map_err(|e| archive_error(path, e))?;

            summary.entries += 1;
            summary.items += document.items;
            summary.annotations += document.annotations;
        }

        let mut writer = zip.finish().map_err(|e| archive_error(path, e))?;
        writer.flush().map_err(|e| archive_error(path, e))?;
        Ok(summary)
    }

    /// Render the document for one package
    pub fn render_package(&self, classes: &BTreeMap<String, Vec<Item>>) -> RenderedDocument {
        let mut document = RenderedDocument {
            text: String::from("<root>\n"),
            items: 0,
            annotations: 0,
        };
        for items in classes.values() {
            let mut sorted: Vec<&Item> = items.iter().collect();
            sorted.sort();
            for item in sorted {
                self.render_item(&mut document, item);
            }
        }
        document.text.push_str("</root>\n");
        document
    }

    fn render_item(&self, document: &mut RenderedDocument, item: &Item) {
        if !item.has_writable_annotations() {
            return;
        }
        let item_mark = document.text.len();
        document
            .text
            .push_str(&format!("  <item name=\"{}\">\n", item.signature()));

        let mut written = 0;
        for annotation in &item.annotations {
            let mark = document.text.len();
            if self.render_annotation(&mut document.text, annotation) {
                written += 1;
            } else {
                document.text.truncate(mark);
            }
        }

        if written == 0 {
            document.text.truncate(item_mark);
            return;
        }
        document.text.push_str("  </item>\n");
        document.items += 1;
        document.annotations += written;
    }

    /// Append one annotation; `false` if nothing should be written for it
    fn render_annotation(&self, out: &mut String, annotation: &AnnotationData) -> bool {
        if annotation.is_empty_after_drop() {
            return false;
        }

        let had_attributes = !annotation.attributes.is_empty();
        let mut attributes: Vec<(&str, String)> = Vec::with_capacity(annotation.attributes.len());
        for (name, value) in &annotation.attributes {
            let value = if name == "value" && is_typedef(&annotation.name) {
                match self.filter_constants(value) {
                    Some(value) => value,
                    None => continue,
                }
            } else {
                value.clone()
            };
            attributes.push((name.as_str(), value));
        }
        if had_attributes && attributes.is_empty() {
            return false;
        }

        if self.sort_attributes {
            attributes.sort_by(|(a, _), (b, _)| match (*a == "value", *b == "value") {
                (true, false) => std::cmp::Ordering::Less,
                (false, true) => std::cmp::Ordering::Greater,
                _ => a.cmp(b),
            });
        }

        let name = escape_xml(&annotation.name);
        if attributes.is_empty() {
            out.push_str(&format!("    <annotation name=\"{}\" />\n", name));
            return true;
        }
        out.push_str(&format!("    <annotation name=\"{}\">\n", name));
        for (attribute, value) in attributes {
            out.push_str(&format!(
                "      <val name=\"{}\" val=\"{}\" />\n",
                escape_xml(attribute),
                escape_xml(&value)
            ));
        }
        out.push_str("    </annotation>\n");
        true
    }

    /// Drop typedef constants the API database does not list.
    ///
    /// Returns `None` when every constant was dropped.
    fn filter_constants(&self, value: &str) -> Option<String> {
        let api = match self.api {
            Some(api) => api,
            None => return Some(value.to_string()),
        };
        let inner = match value.trim().strip_prefix('{').and_then(|v| v.strip_suffix('}')) {
            Some(inner) => inner,
            None => return Some(value.to_string()),
        };
        if inner.trim().is_empty() {
            return Some(value.to_string());
        }

        let kept: Vec<&str> = split_top_level(inner)
            .into_iter()
            .map(str::trim)
            .filter(|constant| is_known_constant(api, constant))
            .collect();
        if kept.is_empty() {
            return None;
        }
        Some(format!("{{{}}}", kept.join(", ")))
    }
}

/// One rendered package document
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub text: String,
    pub items: usize,
    pub annotations: usize,
}

fn is_typedef(name: &str) -> bool {
    names::is_typedef_marker(name)
}

/// Literals always survive; `pkg.Class.NAME` must be a known field
fn is_known_constant(api: &dyn ApiDatabase, constant: &str) -> bool {
    let starts_like_reference = constant
        .chars()
        .next()
        .map(|c| c.is_alphabetic() || c == '_')
        .unwrap_or(false);
    if !starts_like_reference {
        return true;
    }
    match constant.rsplit_once('.') {
        Some((class, field)) => api.has_field(class, field),
        None => true,
    }
}

fn entry_name(package: &str) -> String {
    if package.is_empty() {
        "annotations.xml".to_string()
    } else {
        format!("{}/annotations.xml", package.replace('.', "/"))
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "annotations.zip".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}

fn archive_error(path: &Path, error: impl std::fmt::Display) -> ExtractError {
    ExtractError::ArchiveWrite {
        path: path.to_path_buf(),
        message: error.to_string(),
    }
}
