//! Upload format screening.

use std::path::Path;

use tracing::debug;

use crate::IoError;

/// Reject files whose extension is not `csv` (case-insensitive).
///
/// Front ends call this before handing an upload to the pipeline; the
/// pipeline itself only ever sees tabular text.
///
/// # Errors
///
/// Returns [`IoError::UnsupportedFormat`] carrying the offending extension.
pub fn ensure_tabular(path: &Path) -> Result<(), IoError> {
    let kind = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    if kind == "csv" {
        return Ok(());
    }
    debug!(path = %path.display(), kind, "rejected non-tabular upload");
    Err(IoError::UnsupportedFormat {
        path: path.to_path_buf(),
        kind,
    })
}
