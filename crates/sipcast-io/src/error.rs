//! I/O error types for sipcast-io.

use std::path::PathBuf;

/// Errors from reading and validating sales CSV files.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when the input file does not exist or is unreadable.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when an upload is not a tabular (CSV) file.
    #[error("unsupported file format \"{kind}\" for {path}: expected csv")]
    UnsupportedFormat {
        /// Path of the rejected file.
        path: PathBuf,
        /// The detected file kind (extension), or empty when there is none.
        kind: String,
    },

    /// Returned when the CSV parser encounters a malformed record.
    #[error("CSV parse error in {path} at byte offset {offset}")]
    CsvParse {
        /// Path to the CSV file.
        path: PathBuf,
        /// Byte offset where the error occurred.
        offset: u64,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Returned when the header lacks one of the required columns.
    #[error("missing {column} column in header of {path}")]
    MissingColumn {
        /// Path to the CSV file.
        path: PathBuf,
        /// The column role that could not be located.
        column: crate::ColumnRole,
    },

    /// Returned when the CSV file contains a header but zero data rows.
    #[error("empty dataset (no data rows) in {path}")]
    EmptyDataset {
        /// Path to the CSV file.
        path: PathBuf,
    },

    /// Returned when a non-blank temperature cell is not a finite number.
    #[error("invalid temperature in {path}: row {row_index}, raw value \"{raw}\"")]
    InvalidTemperature {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// The raw string value that failed to parse.
        raw: String,
    },
}
