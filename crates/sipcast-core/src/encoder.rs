//! Turns raw sales records into numeric rows.

use sipcast_io::{ColumnRole, SalesRecord};
use tracing::debug;

use crate::error::CoreError;
use crate::registry::{CategoryId, CategoryRegistry};

/// Encoding parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct EncoderConfig {
    missing_temperature_fallback: f64,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            missing_temperature_fallback: 0.0,
        }
    }
}

impl EncoderConfig {
    /// Create a config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the temperature used when a batch has no temperature readings at all.
    #[must_use]
    pub fn with_missing_temperature_fallback(mut self, value: f64) -> Self {
        self.missing_temperature_fallback = value;
        self
    }

    /// Return the all-missing temperature fallback.
    #[must_use]
    pub fn missing_temperature_fallback(&self) -> f64 {
        self.missing_temperature_fallback
    }
}

/// How blank temperatures in a batch were filled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Imputation {
    /// Every record carried a temperature.
    NotNeeded,
    /// Blanks took the mean of the batch's present readings.
    BatchMean(f64),
    /// The batch had no readings; blanks took the configured fallback.
    Fallback(f64),
}

impl Imputation {
    /// Return the value written into blank cells, if any were filled.
    #[must_use]
    pub fn value(self) -> Option<f64> {
        match self {
            Imputation::NotNeeded => None,
            Imputation::BatchMean(v) | Imputation::Fallback(v) => Some(v),
        }
    }
}

/// One fully numeric sales row.
///
/// `product_indicators[k]` is 1.0 exactly when `product` has id `k`. The
/// indicator vector is as wide as the product registry was when the row
/// was last reconciled, see [`EncodedRow::pad_to`].
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedRow {
    temperature: f64,
    weather: CategoryId,
    product: CategoryId,
    product_indicators: Vec<f64>,
}

impl EncodedRow {
    /// Return the (possibly imputed) temperature.
    #[must_use]
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Return the weather id.
    #[must_use]
    pub fn weather(&self) -> CategoryId {
        self.weather
    }

    /// Return the product id, which is also the training label.
    #[must_use]
    pub fn product(&self) -> CategoryId {
        self.product
    }

    /// Return the one-hot product columns.
    #[must_use]
    pub fn product_indicators(&self) -> &[f64] {
        &self.product_indicators
    }

    /// Return the predictor pair `[temperature, weather id]`.
    #[must_use]
    pub fn predictors(&self) -> Vec<f64> {
        predictor_row(self.temperature, self.weather)
    }

    /// Return every column: temperature, weather id, then the indicators.
    #[must_use]
    pub fn values(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(2 + self.product_indicators.len());
        out.push(self.temperature);
        out.push(self.weather.index() as f64);
        out.extend_from_slice(&self.product_indicators);
        out
    }

    /// Widen the indicator vector with zero columns up to `n_products`.
    pub fn pad_to(&mut self, n_products: usize) {
        if self.product_indicators.len() < n_products {
            self.product_indicators.resize(n_products, 0.0);
        }
    }
}

/// Build the predictor vector the classifier consumes.
pub(crate) fn predictor_row(temperature: f64, weather: CategoryId) -> Vec<f64> {
    vec![temperature, weather.index() as f64]
}

/// Result of encoding one batch.
#[derive(Debug, Clone)]
pub struct EncodedBatch {
    /// Encoded rows, in input order.
    pub rows: Vec<EncodedRow>,
    /// How blank temperatures were filled.
    pub imputation: Imputation,
}

/// Encodes record batches against a pair of registries.
#[derive(Debug, Clone, Default)]
pub struct FeatureEncoder {
    config: EncoderConfig,
}

impl FeatureEncoder {
    /// Create an encoder with the given configuration.
    #[must_use]
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }

    /// Return the encoder configuration.
    #[must_use]
    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Encode a batch, registering any new weather or product strings.
    ///
    /// All categories of the batch are registered before any row is encoded,
    /// so every row's indicator vector has the registry's final width. Blank
    /// temperatures take the mean of the batch's present readings, or the
    /// configured fallback when the batch has none.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MalformedInput`] when a record lacks weather or
    /// product. Validation happens before registration, so on error neither
    /// registry has changed.
    pub fn encode(
        &self,
        records: &[SalesRecord],
        weathers: &mut CategoryRegistry,
        products: &mut CategoryRegistry,
    ) -> Result<EncodedBatch, CoreError> {
        let mut complete = Vec::with_capacity(records.len());
        for (row_index, record) in records.iter().enumerate() {
            let weather = record.weather.as_deref().ok_or(CoreError::MalformedInput {
                row_index,
                field: ColumnRole::Weather,
            })?;
            let product = record.product.as_deref().ok_or(CoreError::MalformedInput {
                row_index,
                field: ColumnRole::Product,
            })?;
            complete.push((record.temperature, weather, product));
        }

        let ids: Vec<(CategoryId, CategoryId)> = complete
            .iter()
            .map(|&(_, weather, product)| (weathers.register(weather), products.register(product)))
            .collect();

        let imputation = self.imputation(records);
        let fill = imputation.value().unwrap_or(self.config.missing_temperature_fallback);
        let width = products.len();

        let rows = complete
            .iter()
            .zip(ids)
            .map(|(&(temperature, _, _), (weather, product))| {
                let mut product_indicators = vec![0.0; width];
                product_indicators[product.index()] = 1.0;
                EncodedRow {
                    temperature: temperature.unwrap_or(fill),
                    weather,
                    product,
                    product_indicators,
                }
            })
            .collect::<Vec<_>>();

        debug!(
            n_rows = rows.len(),
            n_weathers = weathers.len(),
            n_products = width,
            ?imputation,
            "encoded batch"
        );

        Ok(EncodedBatch { rows, imputation })
    }

    fn imputation(&self, records: &[SalesRecord]) -> Imputation {
        let present: Vec<f64> = records.iter().filter_map(|r| r.temperature).collect();
        if present.len() == records.len() {
            Imputation::NotNeeded
        } else if present.is_empty() {
            Imputation::Fallback(self.config.missing_temperature_fallback)
        } else {
            Imputation::BatchMean(running_mean(&present))
        }
    }
}

/// Mean that stays finite for any finite inputs.
fn running_mean(values: &[f64]) -> f64 {
    let mut mean = 0.0;
    for (n, &x) in values.iter().enumerate() {
        let k = (n + 1) as f64;
        mean += x / k - mean / k;
    }
    mean
}
