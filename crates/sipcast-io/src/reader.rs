//! CSV sales reader with full input validation.

use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::IoError;
use crate::record::{ColumnRole, SalesRecord};

/// Cell contents treated as a missing value, compared case-insensitively.
const MISSING_MARKERS: [&str; 8] = ["", "na", "n/a", "#n/a", "<na>", "nan", "null", "none"];

/// Reads beverage sales records from a CSV file.
///
/// Expected CSV format:
/// - Header row required, naming a temperature, a weather and a product
///   column (see [`ColumnRole::aliases`]); order is free, extra columns are
///   ignored
/// - One sales observation per subsequent row
/// - Temperature may be blank; blank categorical cells are kept as `None`
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::MissingColumn`] | Header lacks a required column |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
/// | [`IoError::InvalidTemperature`] | Temperature cell is not a finite number |
pub struct SalesReader {
    path: PathBuf,
}

impl SalesReader {
    /// Create a new reader for the given CSV file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Read and validate the CSV file.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<Vec<SalesRecord>, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;
        self.read_from(file)
    }

    /// Parse already-fetched file contents, attributing errors to this reader's path.
    pub fn read_str(&self, contents: &str) -> Result<Vec<SalesRecord>, IoError> {
        self.read_from(contents.as_bytes())
    }

    fn read_from<R: Read>(&self, source: R) -> Result<Vec<SalesRecord>, IoError> {
        // flexible(true) lets short rows through so that missing cells surface
        // as absent fields instead of a low-level CsvParse error.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(source);

        let header = rdr.headers().map_err(|e| self.csv_error(e))?;
        let mut columns = [0usize; 3];
        for (slot, role) in columns.iter_mut().zip(ColumnRole::ALL) {
            *slot = header
                .iter()
                .position(|h| role.matches(h))
                .ok_or_else(|| IoError::MissingColumn {
                    path: self.path.clone(),
                    column: role,
                })?;
        }
        let [temp_col, weather_col, product_col] = columns;
        debug!(temp_col, weather_col, product_col, "resolved CSV header");

        let mut records = Vec::new();
        let mut n_missing_temperature = 0usize;
        for (row_index, result) in rdr.records().enumerate() {
            let row = result.map_err(|e| self.csv_error(e))?;

            let temperature = match present(row.get(temp_col)) {
                None => {
                    n_missing_temperature += 1;
                    None
                }
                Some(raw) => Some(self.parse_temperature(raw, row_index)?),
            };

            records.push(SalesRecord {
                temperature,
                weather: present(row.get(weather_col)).map(String::from),
                product: present(row.get(product_col)).map(String::from),
            });
        }

        if records.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        info!(
            n_records = records.len(),
            n_missing_temperature,
            "sales records loaded"
        );

        Ok(records)
    }

    fn parse_temperature(&self, raw: &str, row_index: usize) -> Result<f64, IoError> {
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| IoError::InvalidTemperature {
                path: self.path.clone(),
                row_index,
                raw: raw.to_string(),
            })
    }

    fn csv_error(&self, e: csv::Error) -> IoError {
        IoError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        }
    }
}

/// Trim a cell and map missing-value markers to `None`.
fn present(cell: Option<&str>) -> Option<&str> {
    let trimmed = cell?.trim();
    let lowered = trimmed.to_ascii_lowercase();
    if MISSING_MARKERS.contains(&lowered.as_str()) {
        None
    } else {
        Some(trimmed)
    }
}
