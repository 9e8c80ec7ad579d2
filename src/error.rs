use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while extracting, merging or exporting annotations.
///
/// Only the write-stage variants are ever returned from the pipeline; the
/// per-item and per-document variants are logged and the unit is skipped.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("No merge match for signature {signature}")]
    MalformedSignature { signature: String },

    #[error("Unsupported annotation import: {name}")]
    UnsupportedAnnotationImport { name: String },

    #[error("Found both @{existing} and @{imported} on {signature}; keeping @{existing}")]
    ConflictingNullability {
        signature: String,
        existing: String,
        imported: String,
    },

    #[error("Failed to parse {source_name}{}: {message}", location_suffix(.line, .column))]
    DocumentParse {
        source_name: String,
        line: Option<usize>,
        column: Option<usize>,
        message: String,
    },

    #[error("Generated document {entry} is not well formed: {message}")]
    InvalidDocument { entry: String, message: String },

    #[error("Failed to write annotation archive {path}: {message}")]
    ArchiveWrite { path: PathBuf, message: String },

    #[error("Failed to write keep rules {path}: {source}")]
    KeepRulesWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Typedef convention violated: {0}")]
    TypedefConvention(String),

    #[error("Failed to parse API file {path} at line {line}: {message}")]
    ApiParse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Failed to parse declaration tree: {0}")]
    DeclarationParse(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn location_suffix(line: &Option<usize>, column: &Option<usize>) -> String {
    match (line, column) {
        (Some(line), Some(column)) => format!(":{}:{}", line, column),
        (Some(line), None) => format!(":{}", line),
        _ => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, ExtractError>;
