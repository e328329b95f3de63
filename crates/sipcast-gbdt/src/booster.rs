//! Softmax gradient boosting with per-class parallel tree fitting.

use rand::SeedableRng;
use rand::seq::index;
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, info, instrument};

use crate::config::GradientBoostingConfig;
use crate::error::GbdtError;
use crate::predict::softmax_inplace;
use crate::tree::RegressionTree;

/// Floor applied to softmax hessians so leaves never divide by zero.
const MIN_HESSIAN: f64 = 1e-6;

/// A fitted multi-class gradient boosting ensemble.
///
/// Each boosting round holds one regression tree per class; a sample's raw
/// score for class `k` is the shrunken sum of the class-`k` trees.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct GradientBoostedClassifier {
    pub(crate) rounds: Vec<Vec<RegressionTree>>,
    pub(crate) learning_rate: f64,
    pub(crate) n_features: usize,
    pub(crate) n_classes: usize,
}

/// Train the boosting ensemble.
#[instrument(skip_all, fields(n_rounds = config.n_rounds, n_samples = features.len()))]
pub(crate) fn train(
    config: &GradientBoostingConfig,
    features: &[Vec<f64>],
    labels: &[usize],
    n_classes: usize,
) -> Result<GradientBoostedClassifier, GbdtError> {
    // --- Validate inputs ---
    if n_classes == 0 {
        return Err(GbdtError::InvalidClassCount { n_classes });
    }
    let n_features = crate::validate_features(features)?;
    let n_samples = features.len();
    if labels.len() != n_samples {
        return Err(GbdtError::SampleCountMismatch {
            what: "labels",
            expected: n_samples,
            got: labels.len(),
        });
    }
    if let Some((sample_index, &label)) = labels.iter().enumerate().find(|&(_, &l)| l >= n_classes)
    {
        return Err(GbdtError::LabelOutOfRange {
            sample_index,
            label,
            n_classes,
        });
    }

    // --- Validate config ---
    config.validate()?;

    let draw_count = ((n_samples as f64) * config.subsample).ceil() as usize;
    info!(
        n_rounds = config.n_rounds,
        n_samples,
        n_features,
        n_classes,
        draw_count,
        seeded = config.seed.is_some(),
        "training gradient boosted classifier"
    );

    let mut rng = match config.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };

    let col_features = crate::to_columns(features, n_features);
    let all_indices: Vec<usize> = (0..n_samples).collect();
    let mut scores = vec![vec![0.0f64; n_classes]; n_samples];
    let mut rounds = Vec::with_capacity(config.n_rounds);

    for round in 0..config.n_rounds {
        let sample_indices = if draw_count < n_samples {
            let mut drawn = index::sample(&mut rng, n_samples, draw_count).into_vec();
            drawn.sort_unstable();
            drawn
        } else {
            all_indices.clone()
        };

        let probabilities: Vec<Vec<f64>> = scores
            .iter()
            .map(|row| {
                let mut p = row.clone();
                softmax_inplace(&mut p);
                p
            })
            .collect();

        // One tree per class, fitted independently against that class's gradients.
        let trees: Vec<RegressionTree> = (0..n_classes)
            .into_par_iter()
            .map(|class| {
                let mut gradients = Vec::with_capacity(n_samples);
                let mut hessians = Vec::with_capacity(n_samples);
                for (p, &label) in probabilities.iter().zip(labels) {
                    let p_k = p[class];
                    let target = if label == class { 1.0 } else { 0.0 };
                    gradients.push(p_k - target);
                    hessians.push((2.0 * p_k * (1.0 - p_k)).max(MIN_HESSIAN));
                }
                config
                    .tree
                    .fit_columns(&col_features, &gradients, &hessians, &sample_indices)
            })
            .collect();

        for (row, sample) in scores.iter_mut().zip(features) {
            for (score, tree) in row.iter_mut().zip(&trees) {
                *score += config.learning_rate * tree.leaf_weight(sample);
            }
        }

        debug!(
            round,
            n_nodes = trees.iter().map(RegressionTree::n_nodes).sum::<usize>(),
            "boosting round complete"
        );
        rounds.push(trees);
    }

    let classifier = GradientBoostedClassifier {
        rounds,
        learning_rate: config.learning_rate,
        n_features,
        n_classes,
    };

    info!(
        training_accuracy = classifier.accuracy_on(features, labels),
        "gradient boosted classifier trained"
    );

    Ok(classifier)
}

impl GradientBoostedClassifier {
    /// Fraction of samples whose predicted class equals the label.
    fn accuracy_on(&self, features: &[Vec<f64>], labels: &[usize]) -> f64 {
        let correct = features
            .iter()
            .zip(labels)
            .filter(|&(sample, &label)| self.raw_distribution(sample).predicted_class() == label)
            .count();
        correct as f64 / labels.len().max(1) as f64
    }
}
