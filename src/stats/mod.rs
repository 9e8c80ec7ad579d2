//! Counters collected while extracting and merging, for diagnostics only.

mod terminal;

pub use terminal::TerminalReport;

use crate::item::Item;
use std::collections::BTreeMap;

/// Per-name annotation counts
#[derive(Debug, Clone, Default)]
pub struct Stats {
    /// Annotations attached by the extraction pass, per canonical name
    pub extracted: BTreeMap<String, usize>,
    /// Annotations attached by merge passes, per canonical name
    pub merged: BTreeMap<String, usize>,
    /// Annotations lost with items rejected by the API database, per name
    pub filtered_by_name: BTreeMap<String, usize>,
    /// Items rejected by the API database
    pub filtered: usize,
    /// Items diverted to keep rules
    pub kept: usize,
    /// Nullability conflicts resolved in favor of the existing marker
    pub conflicts: usize,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_extracted(&mut self, item: &Item) {
        for annotation in &item.annotations {
            *self.extracted.entry(annotation.name.clone()).or_default() += 1;
        }
    }

    pub fn record_merged(&mut self, name: &str) {
        *self.merged.entry(name.to_string()).or_default() += 1;
    }

    pub fn record_filtered(&mut self, item: &Item) {
        self.filtered += 1;
        for annotation in &item.annotations {
            *self.filtered_by_name.entry(annotation.name.clone()).or_default() += 1;
        }
    }

    pub fn total_extracted(&self) -> usize {
        self.extracted.values().sum()
    }

    pub fn total_merged(&self) -> usize {
        self.merged.values().sum()
    }
}

/// Describe which build variants a result applies to.
///
/// Lists the included variants while they are the majority; at an exact
/// tie the excluded ones are listed instead.
pub fn describe_variants(included: &[String], all: &[String]) -> Option<String> {
    let excluded: Vec<&str> = all
        .iter()
        .filter(|v| !included.contains(v))
        .map(String::as_str)
        .collect();
    if excluded.is_empty() || included.is_empty() {
        return None;
    }
    if excluded.len() <= included.len() {
        Some(format!("Does not apply to variants: {}", excluded.join(", ")))
    } else {
        let included: Vec<&str> = included.iter().map(String::as_str).collect();
        Some(format!("Applies to variants: {}", included.join(", ")))
    }
}
