//! Configuration builder for gradient boosting training.

use crate::booster::GradientBoostedClassifier;
use crate::error::GbdtError;
use crate::tree::RegressionTreeConfig;

/// Configuration for multi-class gradient boosting.
///
/// Construct via [`GradientBoostingConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter          | Default             |
/// |--------------------|---------------------|
/// | `learning_rate`    | 0.3                 |
/// | `max_depth`        | 6                   |
/// | `min_child_weight` | 1.0                 |
/// | `lambda`           | 1.0                 |
/// | `gamma`            | 0.0                 |
/// | `subsample`        | 1.0                 |
/// | `seed`             | `None` (entropy)    |
#[derive(Debug, Clone)]
pub struct GradientBoostingConfig {
    pub(crate) n_rounds: usize,
    pub(crate) learning_rate: f64,
    pub(crate) tree: RegressionTreeConfig,
    pub(crate) subsample: f64,
    pub(crate) seed: Option<u64>,
}

impl GradientBoostingConfig {
    /// Create a new config with the given number of boosting rounds.
    ///
    /// # Errors
    ///
    /// Returns [`GbdtError::InvalidRoundCount`] if `n_rounds` is zero.
    pub fn new(n_rounds: usize) -> Result<Self, GbdtError> {
        if n_rounds == 0 {
            return Err(GbdtError::InvalidRoundCount { n_rounds });
        }
        Ok(Self {
            n_rounds,
            learning_rate: 0.3,
            tree: RegressionTreeConfig::new(),
            subsample: 1.0,
            seed: None,
        })
    }

    // --- Setters ---

    /// Set the shrinkage applied to every tree's contribution.
    #[must_use]
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Set the maximum depth of each tree.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.tree = self.tree.with_max_depth(max_depth);
        self
    }

    /// Set the minimum hessian sum required in each child of a split.
    #[must_use]
    pub fn with_min_child_weight(mut self, min_child_weight: f64) -> Self {
        self.tree = self.tree.with_min_child_weight(min_child_weight);
        self
    }

    /// Set the L2 regularization on leaf weights.
    #[must_use]
    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.tree = self.tree.with_lambda(lambda);
        self
    }

    /// Set the minimum loss reduction required to make a split.
    #[must_use]
    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.tree = self.tree.with_gamma(gamma);
        self
    }

    /// Set the fraction of rows sampled (without replacement) per round.
    #[must_use]
    pub fn with_subsample(mut self, subsample: f64) -> Self {
        self.subsample = subsample;
        self
    }

    /// Set the random seed. `None` seeds from OS entropy.
    #[must_use]
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    // --- Getters ---

    /// Return the number of boosting rounds.
    #[must_use]
    pub fn n_rounds(&self) -> usize {
        self.n_rounds
    }

    /// Return the learning rate.
    #[must_use]
    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// Return the per-tree configuration.
    #[must_use]
    pub fn tree(&self) -> &RegressionTreeConfig {
        &self.tree
    }

    /// Return the row subsample fraction.
    #[must_use]
    pub fn subsample(&self) -> f64 {
        self.subsample
    }

    /// Return the random seed, if any.
    #[must_use]
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Check every parameter without touching data.
    ///
    /// # Errors
    ///
    /// Returns the first out-of-range parameter as its dedicated variant.
    pub fn validate(&self) -> Result<(), GbdtError> {
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(GbdtError::InvalidLearningRate {
                learning_rate: self.learning_rate,
            });
        }
        if !(self.subsample > 0.0 && self.subsample <= 1.0) {
            return Err(GbdtError::InvalidSubsample {
                fraction: self.subsample,
            });
        }
        self.tree.validate()
    }

    /// Train a softmax gradient boosting classifier.
    ///
    /// `features[sample_idx][feature_idx]`, row-major.
    /// `labels[sample_idx]`: class labels in `0..n_classes`.
    ///
    /// # Errors
    ///
    /// | Variant                                | When                                   |
    /// |----------------------------------------|----------------------------------------|
    /// | [`GbdtError::InvalidClassCount`]       | `n_classes` is zero                    |
    /// | [`GbdtError::EmptyDataset`]            | `features` is empty                    |
    /// | [`GbdtError::ZeroFeatures`]            | rows have zero feature columns         |
    /// | [`GbdtError::FeatureCountMismatch`]    | rows have inconsistent lengths         |
    /// | [`GbdtError::NonFiniteValue`]          | any value is NaN or infinite           |
    /// | [`GbdtError::SampleCountMismatch`]     | `labels.len() != features.len()`       |
    /// | [`GbdtError::LabelOutOfRange`]         | a label is `>= n_classes`              |
    /// | [`GbdtError::InvalidLearningRate`] etc.| a parameter is out of range            |
    pub fn fit(
        &self,
        features: &[Vec<f64>],
        labels: &[usize],
        n_classes: usize,
    ) -> Result<GradientBoostedClassifier, GbdtError> {
        crate::booster::train(self, features, labels, n_classes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_rounds_rejected() {
        assert!(matches!(
            GradientBoostingConfig::new(0),
            Err(GbdtError::InvalidRoundCount { n_rounds: 0 })
        ));
    }

    #[test]
    fn defaults_validate() {
        let config = GradientBoostingConfig::new(10).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.seed(), None);
        assert_eq!(config.tree().max_depth(), 6);
    }

    #[test]
    fn out_of_range_parameters_rejected() {
        let base = GradientBoostingConfig::new(10).unwrap();
        assert!(matches!(
            base.clone().with_learning_rate(0.0).validate(),
            Err(GbdtError::InvalidLearningRate { .. })
        ));
        assert!(matches!(
            base.clone().with_learning_rate(f64::NAN).validate(),
            Err(GbdtError::InvalidLearningRate { .. })
        ));
        assert!(matches!(
            base.clone().with_subsample(1.5).validate(),
            Err(GbdtError::InvalidSubsample { .. })
        ));
        assert!(matches!(
            base.clone().with_lambda(-1.0).validate(),
            Err(GbdtError::InvalidLambda { .. })
        ));
        assert!(matches!(
            base.with_min_child_weight(f64::INFINITY).validate(),
            Err(GbdtError::InvalidMinChildWeight { .. })
        ));
    }
}
