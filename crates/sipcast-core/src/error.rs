use std::path::PathBuf;

use sipcast_gbdt::GbdtError;
use sipcast_io::{ColumnRole, IoError};

/// Errors from encoding, training and serving predictions.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Returned when a record lacks its weather or product value.
    #[error("malformed input: record {row_index} has no {field} value")]
    MalformedInput {
        /// Zero-based index of the record within its batch.
        row_index: usize,
        /// The missing categorical field.
        field: ColumnRole,
    },

    /// Returned when an upload is not a tabular file.
    #[error("unsupported file format \"{kind}\" for {path}")]
    UnsupportedFormat {
        /// Path of the rejected upload.
        path: PathBuf,
        /// The detected file kind.
        kind: String,
    },

    /// Returned when a prediction request carries an unusable value.
    #[error("invalid {field} \"{value}\": {reason}")]
    InvalidInput {
        /// Which request field was rejected.
        field: &'static str,
        /// The rejected value as received.
        value: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Returned when the model was fitted against a different corpus schema.
    #[error("schema mismatch: model has {fitted_columns} columns, corpus has {corpus_columns}")]
    SchemaMismatch {
        /// Column count of the schema the model was fitted on.
        fitted_columns: usize,
        /// Column count of the current corpus schema.
        corpus_columns: usize,
    },

    /// Returned when the model predates the latest corpus append.
    #[error("stale model: fitted at generation {fitted_generation}, corpus at {corpus_generation}")]
    StaleModel {
        /// Corpus generation the model was fitted on.
        fitted_generation: u64,
        /// Current corpus generation.
        corpus_generation: u64,
    },

    /// Returned when reading a sales file fails.
    #[error(transparent)]
    Io(IoError),

    /// Returned when fitting or evaluating the boosting model fails.
    #[error("model training failed")]
    Training(#[from] GbdtError),
}

impl From<IoError> for CoreError {
    fn from(err: IoError) -> Self {
        match err {
            IoError::UnsupportedFormat { path, kind } => {
                CoreError::UnsupportedFormat { path, kind }
            }
            other => CoreError::Io(other),
        }
    }
}
