//! Beverage best-seller prediction: category registries, feature encoding,
//! the training corpus, the boosted classifier and the prediction service.
//!
//! Raw sales records flow through [`FeatureEncoder`] into a
//! [`TrainingCorpus`]; a [`Classifier`] is fitted on the corpus, and a
//! [`PredictionService`] keeps the two consistent across ingests.

mod classifier;
mod corpus;
mod encoder;
mod error;
mod registry;
mod service;

pub use classifier::Classifier;
pub use corpus::{
    AppendSummary, CorpusSchema, PRODUCT_COLUMN_PREFIX, TEMPERATURE_COLUMN, TrainingCorpus,
    WEATHER_COLUMN,
};
pub use encoder::{EncodedBatch, EncodedRow, EncoderConfig, FeatureEncoder, Imputation};
pub use error::CoreError;
pub use registry::{CategoryDomain, CategoryId, CategoryRegistry};
pub use service::{
    IngestSummary, Prediction, PredictionRequest, PredictionService, ProductName, ServiceConfig,
    Snapshot,
};
