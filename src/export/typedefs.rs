// Manifest of hidden typedef classes to strip from compiled output

use crate::error::Result;
use crate::extract::Tracker;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Write one `D <internal-name>` line per hidden typedef, sorted.
///
/// Removes the file when there is nothing to list.
pub fn write_typedef_manifest(tracker: &Tracker, path: &Path) -> Result<usize> {
    if !tracker.has_hidden_typedefs() {
        if path.exists() {
            fs::remove_file(path)?;
        }
        return Ok(0);
    }

    let mut writer = BufWriter::new(File::create(path)?);
    let mut count = 0;
    for name in tracker.hidden_typedefs() {
        writeln!(writer, "D {}", name)?;
        count += 1;
    }
    writer.flush()?;

    info!("Wrote {} hidden typedefs to {}", count, path.display());
    Ok(count)
}
