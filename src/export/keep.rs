// ProGuard keep rules for keep-marked items

use crate::error::{ExtractError, Result};
use crate::extract::Tracker;
use crate::item::signature::compact_parameter_list;
use crate::item::{Item, ItemKind, MethodSig};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing::info;

/// The rule preserving one item.
///
/// Classes and packages keep the type itself; members keep the member
/// inside its class, and a parameter keeps its method.
pub fn keep_rule(item: &Item) -> String {
    let keyword = item.container_kind.keep_keyword();
    let member = match &item.kind {
        ItemKind::Package | ItemKind::Class => {
            return format!("-keep {} {}\n", keyword, item.container);
        }
        ItemKind::Field { name, type_name } => {
            format!("{} {}", type_name.as_deref().unwrap_or("*"), name)
        }
        ItemKind::Method(sig) | ItemKind::Parameter { method: sig, .. } => method_member(sig),
    };
    format!("-keep {} {} {{\n    {}\n}}\n", keyword, item.container, member)
}

fn method_member(sig: &MethodSig) -> String {
    let parameters = compact_parameter_list(&sig.parameters);
    match &sig.return_type {
        Some(ret) if !sig.constructor => format!("{} {}({})", ret, sig.name, parameters),
        _ => format!("<init>({})", parameters),
    }
}

/// Write the keep rules, sorted by signature.
///
/// With nothing to keep the file is removed instead. Returns the number of
/// rules written.
pub fn write_keep_rules(tracker: &Tracker, path: &Path) -> Result<usize> {
    let write_error = |source: io::Error| ExtractError::KeepRulesWrite {
        path: path.to_path_buf(),
        source,
    };

    let mut rules: Vec<String> = tracker.sorted_keep_items().into_iter().map(keep_rule).collect();
    // Several parameters of one method produce the same rule
    rules.dedup();

    if rules.is_empty() {
        if path.exists() {
            fs::remove_file(path).map_err(write_error)?;
        }
        return Ok(0);
    }

    let file = File::create(path).map_err(write_error)?;
    let mut writer = BufWriter::new(file);
    for rule in &rules {
        writer.write_all(rule.as_bytes()).map_err(write_error)?;
    }
    writer.flush().map_err(write_error)?;

    info!("Wrote {} keep rules to {}", rules.len(), path.display());
    Ok(rules.len())
}
