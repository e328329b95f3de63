//! The accumulated, fully encoded training data.

use std::path::Path;

use sipcast_io::{SalesReader, SalesRecord};
use tracing::{info, instrument};

use crate::encoder::{EncodedRow, EncoderConfig, FeatureEncoder, Imputation};
use crate::error::CoreError;
use crate::registry::{CategoryDomain, CategoryRegistry};

/// Name of the temperature column.
pub const TEMPERATURE_COLUMN: &str = "temperature";
/// Name of the weather-id column.
pub const WEATHER_COLUMN: &str = "weather";
/// Prefix of the one-hot product columns; the suffix is the product id.
pub const PRODUCT_COLUMN_PREFIX: &str = "product_";

/// Ordered column names of an encoded corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusSchema {
    columns: Vec<String>,
}

impl CorpusSchema {
    /// Schema for a corpus with `n_products` registered products.
    #[must_use]
    pub fn for_products(n_products: usize) -> Self {
        let mut columns = Vec::with_capacity(2 + n_products);
        columns.push(TEMPERATURE_COLUMN.to_string());
        columns.push(WEATHER_COLUMN.to_string());
        columns.extend((0..n_products).map(|k| format!("{PRODUCT_COLUMN_PREFIX}{k}")));
        Self { columns }
    }

    /// Return all column names in order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Return the columns the classifier is fitted on.
    #[must_use]
    pub fn predictor_columns(&self) -> &[String] {
        &self.columns[..2]
    }

    /// Return the number of one-hot product columns.
    #[must_use]
    pub fn n_product_columns(&self) -> usize {
        self.columns.len() - 2
    }

    /// Return the total column count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Always `false`: the two predictor columns are always present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Outcome of one append.
#[derive(Debug, Clone, PartialEq)]
pub struct AppendSummary {
    /// Rows appended.
    pub rows_added: usize,
    /// Weather categories first seen in this batch.
    pub new_weathers: usize,
    /// Product categories first seen in this batch.
    pub new_products: usize,
    /// How blank temperatures in the batch were filled.
    pub imputation: Imputation,
}

/// Encoded rows plus the registries that produced them.
///
/// Every row is as wide as [`TrainingCorpus::schema`]: when a batch
/// introduces new products, earlier rows gain zero-valued columns. Each
/// successful append bumps [`TrainingCorpus::generation`].
#[derive(Debug, Clone)]
pub struct TrainingCorpus {
    rows: Vec<EncodedRow>,
    weathers: CategoryRegistry,
    products: CategoryRegistry,
    encoder: FeatureEncoder,
    generation: u64,
}

impl TrainingCorpus {
    /// Create an empty corpus with fresh registries.
    #[must_use]
    pub fn new(config: EncoderConfig) -> Self {
        Self {
            rows: Vec::new(),
            weathers: CategoryRegistry::new(CategoryDomain::Weather),
            products: CategoryRegistry::new(CategoryDomain::Product),
            encoder: FeatureEncoder::new(config),
            generation: 0,
        }
    }

    /// Build a corpus from a sales CSV file.
    ///
    /// # Errors
    ///
    /// Propagates reader errors as [`CoreError::Io`] and encoding errors as
    /// [`CoreError::MalformedInput`].
    pub fn from_file(path: &Path, config: EncoderConfig) -> Result<Self, CoreError> {
        let mut corpus = Self::new(config);
        corpus.append(path)?;
        Ok(corpus)
    }

    /// Build a corpus from in-memory records.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MalformedInput`] when a record lacks a category.
    pub fn from_records(records: &[SalesRecord], config: EncoderConfig) -> Result<Self, CoreError> {
        let mut corpus = Self::new(config);
        corpus.append_records(records)?;
        Ok(corpus)
    }

    /// Read a sales CSV file and append its rows.
    ///
    /// # Errors
    ///
    /// See [`TrainingCorpus::append_records`]; reader errors come back as
    /// [`CoreError::Io`]. The corpus is unchanged on error.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn append(&mut self, path: &Path) -> Result<AppendSummary, CoreError> {
        let records = SalesReader::new(path).read()?;
        self.append_records(&records)
    }

    /// Encode and append a batch of records.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MalformedInput`] when a record lacks weather or
    /// product; the corpus is unchanged on error.
    pub fn append_records(&mut self, records: &[SalesRecord]) -> Result<AppendSummary, CoreError> {
        let weathers_before = self.weathers.len();
        let products_before = self.products.len();

        let batch = self
            .encoder
            .encode(records, &mut self.weathers, &mut self.products)?;

        let width = self.products.len();
        if width > products_before {
            for row in &mut self.rows {
                row.pad_to(width);
            }
        }
        let rows_added = batch.rows.len();
        self.rows.extend(batch.rows);
        self.generation += 1;

        let summary = AppendSummary {
            rows_added,
            new_weathers: self.weathers.len() - weathers_before,
            new_products: width - products_before,
            imputation: batch.imputation,
        };
        info!(
            rows_added,
            total_rows = self.rows.len(),
            new_weathers = summary.new_weathers,
            new_products = summary.new_products,
            generation = self.generation,
            "corpus appended"
        );
        Ok(summary)
    }

    /// Return the current column layout.
    #[must_use]
    pub fn schema(&self) -> CorpusSchema {
        CorpusSchema::for_products(self.products.len())
    }

    /// Return all encoded rows.
    #[must_use]
    pub fn rows(&self) -> &[EncodedRow] {
        &self.rows
    }

    /// Return every row as a full-width numeric vector.
    #[must_use]
    pub fn value_matrix(&self) -> Vec<Vec<f64>> {
        self.rows.iter().map(EncodedRow::values).collect()
    }

    /// Return the `[temperature, weather id]` rows the classifier trains on.
    #[must_use]
    pub fn predictor_matrix(&self) -> Vec<Vec<f64>> {
        self.rows.iter().map(EncodedRow::predictors).collect()
    }

    /// Return the product id of every row.
    #[must_use]
    pub fn labels(&self) -> Vec<usize> {
        self.rows.iter().map(|r| r.product().index()).collect()
    }

    /// Return the weather registry.
    #[must_use]
    pub fn weathers(&self) -> &CategoryRegistry {
        &self.weathers
    }

    /// Return the product registry.
    #[must_use]
    pub fn products(&self) -> &CategoryRegistry {
        &self.products
    }

    /// Return the number of successful appends so far.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Return the row count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Return `true` if no rows have been appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn initial() -> TrainingCorpus {
        TrainingCorpus::from_records(
            &[
                SalesRecord::new(Some(25.0), "Sunny", "Cola"),
                SalesRecord::new(Some(15.0), "Rainy", "Tea"),
            ],
            EncoderConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn schema_names_columns() {
        let corpus = initial();
        let schema = corpus.schema();
        assert_eq!(
            schema.columns(),
            &["temperature", "weather", "product_0", "product_1"]
        );
        assert_eq!(schema.predictor_columns(), &["temperature", "weather"]);
        assert_eq!(schema.n_product_columns(), 2);
    }

    #[test]
    fn new_product_widens_old_rows_with_zeros() {
        let mut corpus = initial();
        let summary = corpus
            .append_records(&[SalesRecord::new(Some(5.0), "Snowy", "Coffee")])
            .unwrap();
        assert_eq!(summary.new_products, 1);
        assert_eq!(summary.new_weathers, 1);
        assert_eq!(corpus.products().id_of("Coffee").map(|id| id.index()), Some(2));
        assert_eq!(corpus.value_matrix()[0], vec![25.0, 0.0, 1.0, 0.0, 0.0]);
        assert_eq!(corpus.value_matrix()[1], vec![15.0, 1.0, 0.0, 1.0, 0.0]);
        assert_eq!(corpus.value_matrix()[2], vec![5.0, 2.0, 0.0, 0.0, 1.0]);
        assert!(corpus.rows().iter().all(|r| r.values().len() == corpus.schema().len()));
    }

    #[test]
    fn malformed_append_leaves_corpus_unchanged() {
        let mut corpus = initial();
        let bad = SalesRecord {
            temperature: Some(20.0),
            weather: Some("Foggy".to_string()),
            product: None,
        };
        let result = corpus.append_records(&[SalesRecord::new(Some(1.0), "Snowy", "Coffee"), bad]);
        assert!(matches!(result, Err(CoreError::MalformedInput { .. })));
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.products().len(), 2);
        assert_eq!(corpus.weathers().len(), 2);
        assert_eq!(corpus.generation(), 1);
    }

    #[test]
    fn labels_follow_product_ids() {
        let mut corpus = initial();
        corpus
            .append_records(&[SalesRecord::new(Some(27.0), "Sunny", "Cola")])
            .unwrap();
        assert_eq!(corpus.labels(), vec![0, 1, 0]);
        assert_eq!(corpus.predictor_matrix()[2], vec![27.0, 0.0]);
    }

    #[test]
    fn imputation_is_batch_local() {
        let mut corpus = initial();
        let summary = corpus
            .append_records(&[
                SalesRecord::new(None, "Sunny", "Cola"),
                SalesRecord::new(Some(10.0), "Rainy", "Tea"),
            ])
            .unwrap();
        assert_eq!(summary.imputation, Imputation::BatchMean(10.0));
        assert_eq!(corpus.rows()[2].temperature(), 10.0);
    }

    #[test]
    fn from_file_reads_csv() {
        let mut f = NamedTempFile::with_suffix(".csv").unwrap();
        f.write_all("weather,temperature,product\nSunny,30,Cola\nRainy,,Tea\n".as_bytes())
            .unwrap();
        f.flush().unwrap();
        let corpus = TrainingCorpus::from_file(f.path(), EncoderConfig::default()).unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.rows()[1].temperature(), 30.0);
    }

    #[test]
    fn from_file_missing_path_is_io_error() {
        let result = TrainingCorpus::from_file(
            Path::new("/nonexistent/sales.csv"),
            EncoderConfig::default(),
        );
        assert!(matches!(result, Err(CoreError::Io(_))));
    }
}
