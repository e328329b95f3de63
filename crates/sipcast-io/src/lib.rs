//! CSV ingestion and validation for beverage sales records.

mod error;
mod format;
mod reader;
mod record;

pub use error::IoError;
pub use format::ensure_tabular;
pub use reader::SalesReader;
pub use record::{ColumnRole, SalesRecord};
