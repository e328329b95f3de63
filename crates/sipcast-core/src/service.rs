//! Prediction service: owns the corpus and classifier, serves predictions,
//! and absorbs new sales data.
//!
//! Concurrency policy: predictions are served from the snapshot current at
//! the time of the call. An ingest builds its new corpus and classifier off
//! to the side and swaps them in as one [`Snapshot`] only after both
//! succeed, so readers never block on a retrain and never observe a
//! half-updated state. Ingests are serialized among themselves.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use sipcast_gbdt::{ClassDistribution, GradientBoostingConfig};
use sipcast_io::{SalesReader, SalesRecord};
use tracing::{debug, info, instrument};

use crate::classifier::Classifier;
use crate::corpus::{AppendSummary, TrainingCorpus};
use crate::encoder::EncoderConfig;
use crate::error::CoreError;
use crate::registry::CategoryId;

/// Settings for building and retraining the service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    encoder: EncoderConfig,
    boosting: GradientBoostingConfig,
}

impl ServiceConfig {
    /// Create a config with the given boosting parameters and default encoding.
    #[must_use]
    pub fn new(boosting: GradientBoostingConfig) -> Self {
        Self {
            encoder: EncoderConfig::default(),
            boosting,
        }
    }

    /// Replace the encoder configuration.
    #[must_use]
    pub fn with_encoder(mut self, encoder: EncoderConfig) -> Self {
        self.encoder = encoder;
        self
    }

    /// Return the encoder configuration.
    #[must_use]
    pub fn encoder(&self) -> &EncoderConfig {
        &self.encoder
    }

    /// Return the boosting configuration.
    #[must_use]
    pub fn boosting(&self) -> &GradientBoostingConfig {
        &self.boosting
    }
}

/// A corpus together with the classifier fitted on it.
#[derive(Debug)]
pub struct Snapshot {
    corpus: TrainingCorpus,
    classifier: Classifier,
}

impl Snapshot {
    fn fit(corpus: TrainingCorpus, config: &GradientBoostingConfig) -> Result<Self, CoreError> {
        let classifier = Classifier::fit(&corpus, config)?;
        Ok(Self { corpus, classifier })
    }

    /// Return the training corpus.
    #[must_use]
    pub fn corpus(&self) -> &TrainingCorpus {
        &self.corpus
    }

    /// Return the classifier fitted on [`Snapshot::corpus`].
    #[must_use]
    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }
}

/// Display name of a predicted product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductName {
    /// The id resolved through the product registry.
    Known(String),
    /// The id is not in the product registry.
    Unresolved(CategoryId),
}

impl fmt::Display for ProductName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProductName::Known(name) => f.write_str(name),
            ProductName::Unresolved(_) => f.write_str("?"),
        }
    }
}

impl serde::Serialize for ProductName {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A predicted product with its model probability.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Prediction {
    /// Predicted product id.
    pub product_id: CategoryId,
    /// Display name for `product_id`.
    pub product: ProductName,
    /// Softmax probability the model assigns to `product_id`.
    pub probability: f64,
}

/// A prediction request as received from a text front end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionRequest {
    /// Temperature in degrees.
    pub temperature: f64,
    /// Weather id from [`PredictionService::list_weather_options`].
    pub weather: CategoryId,
}

impl PredictionRequest {
    /// Parse a temperature and a weather id from their text forms.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidInput`] if either value is not a number.
    pub fn parse(temperature: &str, weather: &str) -> Result<Self, CoreError> {
        let temperature = temperature
            .trim()
            .parse::<f64>()
            .map_err(|_| CoreError::InvalidInput {
                field: "temperature",
                value: temperature.to_string(),
                reason: "not a number",
            })?;
        let weather = weather
            .trim()
            .parse::<usize>()
            .map_err(|_| CoreError::InvalidInput {
                field: "weather id",
                value: weather.to_string(),
                reason: "not a non-negative integer",
            })?;
        Ok(Self {
            temperature,
            weather: CategoryId::new(weather),
        })
    }
}

/// Outcome of an ingest.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct IngestSummary {
    /// Rows added by this ingest.
    pub rows_added: usize,
    /// Corpus rows after the ingest.
    pub total_rows: usize,
    /// Weather categories first seen in this ingest.
    pub new_weathers: usize,
    /// Product categories first seen in this ingest.
    pub new_products: usize,
}

/// Serves best-seller predictions and retrains on new sales data.
#[derive(Debug)]
pub struct PredictionService {
    config: ServiceConfig,
    current: RwLock<Arc<Snapshot>>,
    ingest_lock: Mutex<()>,
}

impl PredictionService {
    /// Build the corpus from an initial sales file and fit the first model.
    ///
    /// # Errors
    ///
    /// Propagates reading, encoding and training failures.
    #[instrument(skip(config), fields(path = %path.display()))]
    pub fn initialize(path: &Path, config: ServiceConfig) -> Result<Self, CoreError> {
        let corpus = TrainingCorpus::from_file(path, config.encoder.clone())?;
        Self::from_corpus(corpus, config)
    }

    /// Fit the first model on in-memory records.
    ///
    /// # Errors
    ///
    /// Propagates encoding and training failures.
    pub fn from_records(records: &[SalesRecord], config: ServiceConfig) -> Result<Self, CoreError> {
        let corpus = TrainingCorpus::from_records(records, config.encoder.clone())?;
        Self::from_corpus(corpus, config)
    }

    /// Fit the first model on an existing corpus.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Training`] if fitting fails.
    pub fn from_corpus(corpus: TrainingCorpus, config: ServiceConfig) -> Result<Self, CoreError> {
        let snapshot = Snapshot::fit(corpus, &config.boosting)?;
        info!(
            n_rows = snapshot.corpus.len(),
            n_weathers = snapshot.corpus.weathers().len(),
            n_products = snapshot.corpus.products().len(),
            "prediction service ready"
        );
        Ok(Self {
            config,
            current: RwLock::new(Arc::new(snapshot)),
            ingest_lock: Mutex::new(()),
        })
    }

    /// Return the snapshot currently serving predictions.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Predict the best-selling product for a temperature and weather id.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`CoreError::InvalidInput`] | Non-finite temperature or unregistered weather id |
    /// | [`CoreError::SchemaMismatch`] | The model does not match the corpus (internal fault) |
    /// | [`CoreError::StaleModel`] | The model predates the corpus (internal fault) |
    pub fn predict(&self, temperature: f64, weather: CategoryId) -> Result<Prediction, CoreError> {
        let (snapshot, dist) = self.distribution(temperature, weather)?;
        let product_id = CategoryId::new(dist.predicted_class());
        let prediction = resolve(&snapshot, product_id, dist.as_slice()[product_id.index()]);
        debug!(temperature, %weather, product = %prediction.product, "prediction served");
        Ok(prediction)
    }

    /// Predict from a parsed text request.
    ///
    /// # Errors
    ///
    /// See [`PredictionService::predict`].
    pub fn predict_request(&self, request: PredictionRequest) -> Result<Prediction, CoreError> {
        self.predict(request.temperature, request.weather)
    }

    /// Return up to `k` products, most probable first.
    ///
    /// Ties keep the lower product id first, so the head of the list agrees
    /// with [`PredictionService::predict`].
    ///
    /// # Errors
    ///
    /// See [`PredictionService::predict`].
    pub fn predict_ranked(
        &self,
        temperature: f64,
        weather: CategoryId,
        k: usize,
    ) -> Result<Vec<Prediction>, CoreError> {
        let (snapshot, dist) = self.distribution(temperature, weather)?;
        Ok(dist
            .top_k(k)
            .into_iter()
            .map(|(idx, probability)| resolve(&snapshot, CategoryId::new(idx), probability))
            .collect())
    }

    fn distribution(
        &self,
        temperature: f64,
        weather: CategoryId,
    ) -> Result<(Arc<Snapshot>, ClassDistribution), CoreError> {
        if !temperature.is_finite() {
            return Err(CoreError::InvalidInput {
                field: "temperature",
                value: temperature.to_string(),
                reason: "not a finite number",
            });
        }
        let snapshot = self.snapshot();
        if !snapshot.corpus.weathers().contains(weather) {
            return Err(CoreError::InvalidInput {
                field: "weather id",
                value: weather.to_string(),
                reason: "not a registered weather",
            });
        }
        snapshot.classifier.ensure_fitted_on(&snapshot.corpus)?;
        let dist = snapshot.classifier.predict_distribution(temperature, weather)?;
        Ok((snapshot, dist))
    }

    /// Read a sales file, append it and retrain.
    ///
    /// On any failure the previous corpus and model keep serving.
    ///
    /// # Errors
    ///
    /// Propagates reading, encoding and training failures.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn ingest_additional_data(&self, path: &Path) -> Result<IngestSummary, CoreError> {
        let records = SalesReader::new(path).read()?;
        self.ingest_records(&records)
    }

    /// Parse already-fetched CSV contents, append them and retrain.
    ///
    /// `source` is only used to label errors.
    ///
    /// # Errors
    ///
    /// Propagates parsing, encoding and training failures.
    pub fn ingest_contents(
        &self,
        source: &Path,
        contents: &str,
    ) -> Result<IngestSummary, CoreError> {
        let records = SalesReader::new(source).read_str(contents)?;
        self.ingest_records(&records)
    }

    /// Append in-memory records and retrain.
    ///
    /// # Errors
    ///
    /// Propagates encoding and training failures.
    pub fn ingest_records(&self, records: &[SalesRecord]) -> Result<IngestSummary, CoreError> {
        let _guard = self.ingest_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut corpus = self.snapshot().corpus.clone();
        let AppendSummary {
            rows_added,
            new_weathers,
            new_products,
            ..
        } = corpus.append_records(records)?;
        let next = Snapshot::fit(corpus, &self.config.boosting)?;
        let total_rows = next.corpus.len();

        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(next);

        info!(rows_added, total_rows, new_weathers, new_products, "model retrained");
        Ok(IngestSummary {
            rows_added,
            total_rows,
            new_weathers,
            new_products,
        })
    }

    /// Return `(name, id)` for every known weather, in id order.
    #[must_use]
    pub fn list_weather_options(&self) -> Vec<(String, CategoryId)> {
        self.snapshot()
            .corpus
            .weathers()
            .iter()
            .map(|(name, id)| (name.to_string(), id))
            .collect()
    }

    /// Return every known product keyed by id.
    #[must_use]
    pub fn list_product_names(&self) -> BTreeMap<CategoryId, String> {
        self.snapshot()
            .corpus
            .products()
            .iter()
            .map(|(name, id)| (id, name.to_string()))
            .collect()
    }

    /// Return the number of training rows.
    #[must_use]
    pub fn corpus_len(&self) -> usize {
        self.snapshot().corpus.len()
    }

    /// Return the service configuration.
    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}

fn resolve(snapshot: &Snapshot, product_id: CategoryId, probability: f64) -> Prediction {
    let product = match snapshot.corpus.products().name_of(product_id) {
        Some(name) => ProductName::Known(name.to_string()),
        None => ProductName::Unresolved(product_id),
    };
    Prediction {
        product_id,
        product,
        probability,
    }
}
