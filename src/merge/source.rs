// Merge inputs: single documents, archives and directory trees

use crate::config::Config;
use crate::error::{ExtractError, Result};
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;
use zip::ZipArchive;

/// One annotation document ready to be merged
#[derive(Debug, Clone)]
pub struct Document {
    /// Display name, `archive.zip!pkg/annotations.xml` for archive entries
    pub source: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Xml,
    Archive,
}

impl SourceKind {
    pub fn of(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("xml") => Some(SourceKind::Xml),
            Some("zip") | Some("jar") => Some(SourceKind::Archive),
            _ => None,
        }
    }
}

/// Files under `path` that can be merged, in a stable order
pub fn discover(path: &Path, config: &Config) -> Result<Vec<PathBuf>> {
    if !path.exists() {
        return Err(ExtractError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("merge source not found: {}", path.display()),
        )));
    }
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let walker = WalkDir::new(path)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !config.should_exclude(e.path()));

    let mut files = Vec::new();
    for entry in walker.flatten() {
        if entry.file_type().is_file() && SourceKind::of(entry.path()).is_some() {
            files.push(entry.path().to_path_buf());
        }
    }
    debug!("Found {} merge sources under {}", files.len(), path.display());
    Ok(files)
}

/// Read the documents contained in one file.
///
/// Unreadable documents and archives are reported and yield no documents;
/// only a failure to open an archive at all is returned as an error.
pub fn read_documents(path: &Path) -> Result<Vec<Document>> {
    match SourceKind::of(path) {
        Some(SourceKind::Xml) => {
            let source = path.display().to_string();
            match fs::read_to_string(path) {
                Ok(text) => Ok(vec![Document { source, text }]),
                Err(e) => {
                    warn!(
                        "{}",
                        ExtractError::DocumentParse {
                            source_name: source,
                            line: None,
                            column: None,
                            message: e.to_string(),
                        }
                    );
                    Ok(Vec::new())
                }
            }
        }
        Some(SourceKind::Archive) => read_archive(path),
        None => {
            debug!("Ignoring unsupported merge source {}", path.display());
            Ok(Vec::new())
        }
    }
}

fn read_archive(path: &Path) -> Result<Vec<Document>> {
    let file = File::open(path)?;
    let mut archive = match ZipArchive::new(BufReader::new(file)) {
        Ok(archive) => archive,
        Err(e) => {
            warn!(
                "{}",
                ExtractError::DocumentParse {
                    source_name: path.display().to_string(),
                    line: None,
                    column: None,
                    message: e.to_string(),
                }
            );
            return Ok(Vec::new());
        }
    };

    let mut documents = Vec::new();
    for idx in 0..archive.len() {
        let mut entry = match archive.by_index(idx) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping entry {} of {}: {}", idx, path.display(), e);
                continue;
            }
        };
        if !entry.is_file() || !entry.name().ends_with(".xml") {
            continue;
        }

        let source = format!("{}!{}", path.display(), entry.name());
        let mut text = String::new();
        if let Err(e) = entry.read_to_string(&mut text) {
            warn!(
                "{}",
                ExtractError::DocumentParse {
                    source_name: source,
                    line: None,
                    column: None,
                    message: e.to_string(),
                }
            );
            continue;
        }
        documents.push(Document { source, text });
    }
    Ok(documents)
}
