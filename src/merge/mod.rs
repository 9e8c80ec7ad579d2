//! Merge pass: folds previously exported annotation documents into the
//! item index.
//!
//! Imported entries are identified only by their signature text, so each
//! one is decomposed back into class, member, return type, parameters and
//! argument index before it can be matched against extracted items.

mod source;
pub mod xml;

pub use source::{discover, read_documents, Document, SourceKind};
pub use xml::{parse_document, ImportedAnnotation, ImportedItem, ParseFailure};

use crate::annotations::names;
use crate::api::ApiDatabase;
use crate::config::Config;
use crate::decl::NoTypes;
use crate::error::{ExtractError, Result};
use crate::extract::Session;
use crate::item::signature::{normalize_parameter_list, package_of_class, unescape_xml};
use crate::item::{AnnotationData, Item, ItemKind, MethodSig};
use crate::stats::Stats;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// Historical signatures that are known to be wrong and never merged
const DENY_LIST: &[&str] = &[
    "java.util.Calendar int get(int) 0",
    "java.util.Date Date(int, int, int) 1",
];

/// Only the first parameter of these overloads carries valid annotations
const CALENDAR_SET_PREFIX: &str = "java.util.Calendar void set(int, int, int";

fn signature_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // class, then either a method (return type optional, trailing
        // argument index optional) or a field name
        Regex::new(r"^(\S+) (?:((.*)\s+)?(\S+)\((.*)\)( \d+)?|(\S+))$")
            .expect("signature pattern compiles")
    })
}

/// A signature recovered from free text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedSignature {
    Field {
        class: String,
        name: String,
    },
    Method {
        class: String,
        return_type: Option<String>,
        name: String,
        parameters: String,
        index: Option<usize>,
    },
}

impl ParsedSignature {
    /// Decompose an unescaped signature; `None` if it does not match
    pub fn parse(signature: &str) -> Option<Self> {
        let captures = signature_pattern().captures(signature)?;
        let class = captures.get(1)?.as_str().to_string();

        if let Some(name) = captures.get(4) {
            let return_type = captures
                .get(3)
                .map(|m| m.as_str().trim().to_string())
                .filter(|r| !r.is_empty());
            let index = match captures.get(6) {
                Some(m) => Some(m.as_str().trim().parse().ok()?),
                None => None,
            };
            return Some(ParsedSignature::Method {
                class,
                return_type,
                name: name.as_str().to_string(),
                parameters: normalize_parameter_list(captures.get(5).map_or("", |m| m.as_str())),
                index,
            });
        }

        let name = captures.get(7)?.as_str().to_string();
        Some(ParsedSignature::Field { class, name })
    }

    pub fn class(&self) -> &str {
        match self {
            ParsedSignature::Field { class, .. } | ParsedSignature::Method { class, .. } => class,
        }
    }

    /// Build the item this signature identifies
    pub fn to_item(&self) -> Item {
        match self {
            ParsedSignature::Field { class, name } => Item::field(class.as_str(), name.as_str(), None),
            ParsedSignature::Method {
                class,
                return_type,
                name,
                parameters,
                index,
            } => {
                let sig = match return_type {
                    Some(ret) => MethodSig::method(name.as_str(), ret.as_str(), parameters.as_str()),
                    None => MethodSig::constructor(name.as_str(), parameters.as_str()),
                };
                match index {
                    Some(index) => Item::parameter(class.as_str(), sig, *index),
                    None => Item::method(class.as_str(), sig),
                }
            }
        }
    }
}

/// Result of merging one document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub items: usize,
    pub annotations: usize,
    pub skipped: usize,
}

impl std::ops::AddAssign for MergeSummary {
    fn add_assign(&mut self, other: Self) {
        self.items += other.items;
        self.annotations += other.annotations;
        self.skipped += other.skipped;
    }
}

/// Merges annotation documents into a [`Session`]
pub struct Merger<'a> {
    session: &'a mut Session,
    api: Option<&'a dyn ApiDatabase>,
    config: &'a Config,
}

impl<'a> Merger<'a> {
    pub fn new(session: &'a mut Session, config: &'a Config, api: Option<&'a dyn ApiDatabase>) -> Self {
        Self { session, api, config }
    }

    /// Merge an `.xml` file, a `.zip`/`.jar` archive or a directory tree
    pub fn merge_path(&mut self, path: &Path) -> Result<MergeSummary> {
        let mut summary = MergeSummary::default();
        for file in discover(path, self.config)? {
            for document in read_documents(&file)? {
                summary += self.merge_document(&document.source, &document.text);
            }
        }
        info!(
            "Merged {} annotations on {} items from {}",
            summary.annotations,
            summary.items,
            path.display()
        );
        Ok(summary)
    }

    /// Merge one document. A document that fails to parse contributes
    /// nothing; the failure is logged.
    pub fn merge_document(&mut self, source: &str, text: &str) -> MergeSummary {
        let items = match parse_document(text) {
            Ok(items) => items,
            Err(failure) => {
                warn!(
                    "{}",
                    ExtractError::DocumentParse {
                        source_name: source.to_string(),
                        line: Some(failure.line),
                        column: Some(failure.column),
                        message: failure.message,
                    }
                );
                return MergeSummary::default();
            }
        };

        let mut summary = MergeSummary::default();
        for imported in &items {
            match self.merge_item(imported) {
                Some(0) | None => summary.skipped += 1,
                Some(count) => {
                    summary.items += 1;
                    summary.annotations += count;
                }
            }
        }
        debug!("{}: {} items merged, {} skipped", source, summary.items, summary.skipped);
        summary
    }

    /// Merge one imported entry, returning how many annotations were attached
    fn merge_item(&mut self, imported: &ImportedItem) -> Option<usize> {
        let raw_name = imported.name.as_deref().filter(|n| !n.is_empty() && *n != "null")?;

        let annotations: Vec<AnnotationData> = imported
            .annotations
            .iter()
            .filter_map(|a| {
                self.session
                    .filter
                    .normalize_import(&a.name, &a.attributes, &NoTypes)
            })
            .collect();
        if annotations.is_empty() {
            return None;
        }

        let signature = unescape_xml(raw_name);
        if DENY_LIST.contains(&signature.as_str()) {
            debug!("Skipping known-bad signature {}", signature);
            return None;
        }

        let parsed = match ParsedSignature::parse(&signature) {
            Some(parsed) => parsed,
            None => {
                // Class-level entries are expected and not worth a warning
                if signature.contains(' ') {
                    warn!("{}", ExtractError::MalformedSignature { signature });
                }
                return None;
            }
        };

        let mut item = parsed.to_item();
        if is_calendar_set_artifact(&item) {
            return None;
        }

        // Keep-marked entries bypass the API filter, as in extraction
        if annotations.iter().any(|a| a.name == names::KEEP) {
            let merged: Vec<String> = annotations.iter().map(|a| a.name.clone()).collect();
            item.annotations = annotations;
            if !self.session.tracker.divert(&mut self.session.index, item) {
                return Some(0);
            }
            self.session.stats.kept += 1;
            for name in &merged {
                self.session.stats.record_merged(name);
            }
            return Some(merged.len());
        }

        if let Some(api) = self.api {
            if !imported.is_historic() && !item.is_known_to(api) {
                debug!("Filtered imported {}: not in API", item.signature());
                item.annotations = annotations;
                self.session.stats.record_filtered(&item);
                return None;
            }
        }

        let class = parsed.class();
        let package = package_of_class(class);

        let key = item.signature();
        match self.session.index.find_item_mut(class, &key) {
            Some(existing) => {
                let mut attached = 0;
                for annotation in annotations {
                    if existing.annotations.contains(&annotation) {
                        continue;
                    }
                    if let Some(current) = existing
                        .annotations
                        .iter()
                        .find(|a| names::is_nullability_conflict(&a.name, &annotation.name))
                    {
                        warn!(
                            "{}",
                            ExtractError::ConflictingNullability {
                                signature: key.clone(),
                                existing: current.name.clone(),
                                imported: annotation.name.clone(),
                            }
                        );
                        self.session.stats.conflicts += 1;
                        continue;
                    }
                    self.session.stats.record_merged(&annotation.name);
                    existing.annotations.push(annotation);
                    attached += 1;
                }
                Some(attached)
            }
            None => {
                item.annotations = dedup_nullability(annotations, &key, &mut self.session.stats);
                for annotation in &item.annotations {
                    self.session.stats.record_merged(&annotation.name);
                }
                let count = item.annotations.len();
                self.session.index.add_item_unconditionally(&package, item);
                Some(count)
            }
        }
    }
}

/// An imported entry may itself carry both markers; the first one wins
fn dedup_nullability(
    annotations: Vec<AnnotationData>,
    signature: &str,
    stats: &mut Stats,
) -> Vec<AnnotationData> {
    let mut kept: Vec<AnnotationData> = Vec::with_capacity(annotations.len());
    for annotation in annotations {
        if kept.contains(&annotation) {
            continue;
        }
        if let Some(current) = kept
            .iter()
            .find(|a| names::is_nullability_conflict(&a.name, &annotation.name))
        {
            warn!(
                "{}",
                ExtractError::ConflictingNullability {
                    signature: signature.to_string(),
                    existing: current.name.clone(),
                    imported: annotation.name.clone(),
                }
            );
            stats.conflicts += 1;
            continue;
        }
        kept.push(annotation);
    }
    kept
}

/// Parameters past the first of `Calendar.set(int, int, int...)`
fn is_calendar_set_artifact(item: &Item) -> bool {
    match &item.kind {
        ItemKind::Parameter { index, .. } => {
            *index > 0 && item.raw_signature().starts_with(CALENDAR_SET_PREFIX)
        }
        _ => false,
    }
}
