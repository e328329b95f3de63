//! Boosted-tree product classifier fitted on a corpus snapshot.

use sipcast_gbdt::{ClassDistribution, GradientBoostedClassifier, GradientBoostingConfig};
use tracing::{info, instrument};

use crate::corpus::{CorpusSchema, TrainingCorpus};
use crate::encoder::predictor_row;
use crate::error::CoreError;
use crate::registry::CategoryId;

/// Maps `(temperature, weather id)` to a product id.
///
/// A classifier remembers the schema and generation of the corpus it was
/// fitted on. Once that corpus is appended to, the classifier is stale and
/// must be refitted before serving predictions against it.
#[derive(Debug, Clone)]
pub struct Classifier {
    model: GradientBoostedClassifier,
    schema: CorpusSchema,
    generation: u64,
}

impl Classifier {
    /// Fit a fresh model on the corpus's predictor columns, with the
    /// product id as label.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Training`] when the corpus is empty or the
    /// boosting configuration is invalid.
    #[instrument(skip_all, fields(n_rows = corpus.len(), n_products = corpus.products().len()))]
    pub fn fit(
        corpus: &TrainingCorpus,
        config: &GradientBoostingConfig,
    ) -> Result<Self, CoreError> {
        let model = config.fit(
            &corpus.predictor_matrix(),
            &corpus.labels(),
            corpus.products().len(),
        )?;
        info!(
            n_rounds = model.n_rounds(),
            generation = corpus.generation(),
            "classifier fitted"
        );
        Ok(Self {
            model,
            schema: corpus.schema(),
            generation: corpus.generation(),
        })
    }

    /// Check that this classifier was fitted on `corpus` as it stands now.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`CoreError::SchemaMismatch`] | The corpus has different columns |
    /// | [`CoreError::StaleModel`] | The corpus was appended to since fitting |
    pub fn ensure_fitted_on(&self, corpus: &TrainingCorpus) -> Result<(), CoreError> {
        let current = corpus.schema();
        if current != self.schema {
            return Err(CoreError::SchemaMismatch {
                fitted_columns: self.schema.len(),
                corpus_columns: current.len(),
            });
        }
        if corpus.generation() != self.generation {
            return Err(CoreError::StaleModel {
                fitted_generation: self.generation,
                corpus_generation: corpus.generation(),
            });
        }
        Ok(())
    }

    /// Predict the best-selling product id.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Training`] if the model rejects the input.
    pub fn predict(&self, temperature: f64, weather: CategoryId) -> Result<CategoryId, CoreError> {
        Ok(CategoryId::new(
            self.predict_distribution(temperature, weather)?.predicted_class(),
        ))
    }

    /// Return the softmax distribution over product ids.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Training`] if the model rejects the input.
    pub fn predict_distribution(
        &self,
        temperature: f64,
        weather: CategoryId,
    ) -> Result<ClassDistribution, CoreError> {
        Ok(self.model.predict_proba(&predictor_row(temperature, weather))?)
    }

    /// Return the schema the model was fitted on.
    #[must_use]
    pub fn schema(&self) -> &CorpusSchema {
        &self.schema
    }

    /// Return the corpus generation the model was fitted on.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Return the number of product classes.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.model.n_classes()
    }
}
