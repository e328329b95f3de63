//! Multi-class gradient-boosted decision trees: train, predict.
//!
//! Provides a hand-rolled softmax boosting classifier built from
//! second-order CART regression trees, with per-class tree fitting in
//! parallel via rayon and optional seeded row subsampling.

mod booster;
mod config;
mod error;
mod node;
mod predict;
mod split;
mod tree;

pub use booster::GradientBoostedClassifier;
pub use config::GradientBoostingConfig;
pub use error::GbdtError;
pub use node::{FeatureIndex, Node, NodeIndex};
pub use predict::ClassDistribution;
pub use tree::{RegressionTree, RegressionTreeConfig};

/// Check a row-major feature matrix and return its width.
pub(crate) fn validate_features(features: &[Vec<f64>]) -> Result<usize, GbdtError> {
    let first = features.first().ok_or(GbdtError::EmptyDataset)?;
    let n_features = first.len();
    if n_features == 0 {
        return Err(GbdtError::ZeroFeatures);
    }
    for (sample_index, row) in features.iter().enumerate() {
        if row.len() != n_features {
            return Err(GbdtError::FeatureCountMismatch {
                expected: n_features,
                got: row.len(),
                sample_index,
            });
        }
        if let Some(feature_index) = row.iter().position(|v| !v.is_finite()) {
            return Err(GbdtError::NonFiniteValue {
                sample_index,
                feature_index,
            });
        }
    }
    Ok(n_features)
}

/// Transpose row-major features into column-major layout.
pub(crate) fn to_columns(features: &[Vec<f64>], n_features: usize) -> Vec<Vec<f64>> {
    (0..n_features)
        .map(|feat_idx| features.iter().map(|row| row[feat_idx]).collect())
        .collect()
}
