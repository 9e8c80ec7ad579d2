use super::{describe_variants, Stats};
use colored::Colorize;
use std::collections::BTreeSet;
use std::io::{self, Write};

/// Colored per-annotation summary of a run
pub struct TerminalReport<'a> {
    stats: &'a Stats,
    variants: Option<(Vec<String>, Vec<String>)>,
}

impl<'a> TerminalReport<'a> {
    pub fn new(stats: &'a Stats) -> Self {
        Self {
            stats,
            variants: None,
        }
    }

    /// Mention which of the known variants this run covered
    pub fn with_variants(mut self, included: Vec<String>, all: Vec<String>) -> Self {
        self.variants = Some((included, all));
        self
    }

    pub fn print(&self) -> io::Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.write(&mut out, true)
    }

    /// Render the report; `color` is off when writing to files or tests
    pub fn write(&self, out: &mut dyn Write, color: bool) -> io::Result<()> {
        let header = format!(
            "Annotations: {} extracted, {} merged, {} items filtered, {} kept",
            self.stats.total_extracted(),
            self.stats.total_merged(),
            self.stats.filtered,
            self.stats.kept
        );
        if color {
            writeln!(out, "{}", header.bold())?;
        } else {
            writeln!(out, "{}", header)?;
        }

        if let Some((included, all)) = &self.variants {
            if let Some(line) = describe_variants(included, all) {
                writeln!(out, "  {}", if color { line.dimmed().to_string() } else { line })?;
            }
        }

        let names: BTreeSet<&String> = self
            .stats
            .extracted
            .keys()
            .chain(self.stats.merged.keys())
            .chain(self.stats.filtered_by_name.keys())
            .collect();
        if names.is_empty() {
            return Ok(());
        }

        let width = names.iter().map(|n| n.len()).max().unwrap_or(0);
        for name in names {
            let extracted = self.stats.extracted.get(name).copied().unwrap_or(0);
            let merged = self.stats.merged.get(name).copied().unwrap_or(0);
            let filtered = self.stats.filtered_by_name.get(name).copied().unwrap_or(0);
            let padded = format!("{:width$}", name, width = width);
            let counts = format!(
                "{:>6} extracted {:>6} merged {:>6} filtered",
                extracted, merged, filtered
            );
            if color {
                writeln!(out, "  {} {}", padded.cyan(), counts)?;
            } else {
                writeln!(out, "  {} {}", padded, counts)?;
            }
        }

        if self.stats.conflicts > 0 {
            let line = format!("{} nullability conflicts skipped", self.stats.conflicts);
            if color {
                writeln!(out, "{}", line.yellow())?;
            } else {
                writeln!(out, "{}", line)?;
            }
        }
        Ok(())
    }
}
