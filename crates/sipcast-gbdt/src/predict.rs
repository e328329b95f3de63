//! Prediction methods for the boosting ensemble.

use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::booster::GradientBoostedClassifier;
use crate::error::GbdtError;

/// Class probability distribution from a prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDistribution {
    probs: Vec<f64>,
}

impl ClassDistribution {
    /// Create a new class distribution.
    pub(crate) fn new(probs: Vec<f64>) -> Self {
        Self { probs }
    }

    /// Return the predicted class (argmax of probabilities, lowest index on ties).
    #[must_use]
    pub fn predicted_class(&self) -> usize {
        let mut best = 0usize;
        for (idx, p) in self.probs.iter().enumerate() {
            if *p > self.probs[best] {
                best = idx;
            }
        }
        best
    }

    /// Return the top-k classes sorted by descending probability, lower
    /// index first among equal probabilities.
    #[must_use]
    pub fn top_k(&self, k: usize) -> Vec<(usize, f64)> {
        let mut indexed: Vec<(usize, f64)> = self.probs.iter().copied().enumerate().collect();
        indexed.sort_by(|a, b| b.1.total_cmp(&a.1));
        indexed.truncate(k);
        indexed
    }

    /// Return the probability distribution as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.probs
    }
}

/// Numerically stable in-place softmax.
pub(crate) fn softmax_inplace(scores: &mut [f64]) {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut sum = 0.0;
    for s in scores.iter_mut() {
        *s = (*s - max).exp();
        sum += *s;
    }
    if sum > 0.0 {
        scores.iter_mut().for_each(|s| *s /= sum);
    }
}

impl GradientBoostedClassifier {
    /// Predict the class label for a single sample.
    ///
    /// # Errors
    ///
    /// Returns [`GbdtError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn predict(&self, sample: &[f64]) -> Result<usize, GbdtError> {
        Ok(self.predict_proba(sample)?.predicted_class())
    }

    /// Return the softmax class distribution for a single sample.
    ///
    /// # Errors
    ///
    /// Returns [`GbdtError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn predict_proba(&self, sample: &[f64]) -> Result<ClassDistribution, GbdtError> {
        if sample.len() != self.n_features {
            return Err(GbdtError::PredictionFeatureMismatch {
                expected: self.n_features,
                got: sample.len(),
            });
        }
        Ok(self.raw_distribution(sample))
    }

    /// Predict class labels for a batch of samples in parallel.
    ///
    /// # Errors
    ///
    /// Returns [`GbdtError::PredictionFeatureMismatch`] if any sample has the wrong feature count.
    pub fn predict_batch(&self, features: &[Vec<f64>]) -> Result<Vec<usize>, GbdtError> {
        features
            .into_par_iter()
            .map(|sample| self.predict(sample))
            .collect()
    }

    pub(crate) fn raw_distribution(&self, sample: &[f64]) -> ClassDistribution {
        let mut probs = self.margins(sample);
        softmax_inplace(&mut probs);
        ClassDistribution::new(probs)
    }

    fn margins(&self, sample: &[f64]) -> Vec<f64> {
        let mut scores = vec![0.0f64; self.n_classes];
        for trees in &self.rounds {
            for (score, tree) in scores.iter_mut().zip(trees) {
                *score += self.learning_rate * tree.leaf_weight(sample);
            }
        }
        scores
    }

    /// Return the number of features this model was trained on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Return the number of classes.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Return the number of boosting rounds.
    #[must_use]
    pub fn n_rounds(&self) -> usize {
        self.rounds.len()
    }
}

#[cfg(test)]
mod tests {
    use super::{ClassDistribution, softmax_inplace};

    #[test]
    fn softmax_sums_to_one() {
        let mut scores = vec![1.0, 2.0, 3.0];
        softmax_inplace(&mut scores);
        let sum: f64 = scores.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
        assert!(scores[2] > scores[1] && scores[1] > scores[0]);
    }

    #[test]
    fn softmax_survives_large_margins() {
        let mut scores = vec![1000.0, 0.0];
        softmax_inplace(&mut scores);
        assert!(scores.iter().all(|p| p.is_finite()));
        assert!((scores[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn argmax_prefers_lowest_index_on_ties() {
        let dist = ClassDistribution::new(vec![0.25, 0.25, 0.5]);
        assert_eq!(dist.predicted_class(), 2);
        let uniform = ClassDistribution::new(vec![0.5, 0.5]);
        assert_eq!(uniform.predicted_class(), 0);
    }

    #[test]
    fn top_k_sorted_descending() {
        let dist = ClassDistribution::new(vec![0.1, 0.6, 0.3]);
        let top = dist.top_k(2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].0, 1);
        assert_eq!(top[1].0, 2);
    }

    #[test]
    fn top_k_ties_keep_lowest_index_first() {
        let dist = ClassDistribution::new(vec![0.2, 0.4, 0.4]);
        let top = dist.top_k(3);
        assert_eq!(top.iter().map(|&(c, _)| c).collect::<Vec<_>>(), vec![1, 2, 0]);
        assert_eq!(top[0].0, dist.predicted_class());
    }
}
