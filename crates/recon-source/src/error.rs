//! Source error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from loading an export into a table source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// A file or directory could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A TSV file could not be split into records.
    #[error("Malformed TSV {path}: {source}")]
    Tsv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A schema document could not be parsed.
    #[error("Invalid schema document {path}: {source}")]
    Schema {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A table was inserted twice.
    #[error("Table '{0}' is already loaded")]
    DuplicateTable(String),

    /// A row does not fit its table's declared columns.
    #[error("Row {row} of table '{table}' has {found} cells, expected {expected}")]
    RowShape {
        table: String,
        row: usize,
        found: usize,
        expected: usize,
    },
}
