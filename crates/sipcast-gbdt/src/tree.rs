use tracing::{debug, instrument};

use crate::{
    GbdtError,
    node::{Node, NodeIndex},
    split::{GradientStats, SplitParams, find_best_split},
};

/// Configuration for a single gradient-fitted regression tree.
///
/// Construct via [`RegressionTreeConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter          | Default |
/// |--------------------|---------|
/// | `max_depth`        | 6       |
/// | `min_child_weight` | 1.0     |
/// | `lambda`           | 1.0     |
/// | `gamma`            | 0.0     |
#[derive(Debug, Clone)]
pub struct RegressionTreeConfig {
    pub(crate) max_depth: usize,
    pub(crate) min_child_weight: f64,
    pub(crate) lambda: f64,
    pub(crate) gamma: f64,
}

impl RegressionTreeConfig {
    /// Create a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_depth: 6,
            min_child_weight: 1.0,
            lambda: 1.0,
            gamma: 0.0,
        }
    }

    /// Set the maximum tree depth (root is depth 0).
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the minimum hessian sum required in each child of a split.
    #[must_use]
    pub fn with_min_child_weight(mut self, min_child_weight: f64) -> Self {
        self.min_child_weight = min_child_weight;
        self
    }

    /// Set the L2 regularization on leaf weights.
    #[must_use]
    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.lambda = lambda;
        self
    }

    /// Set the minimum loss reduction required to make a split.
    #[must_use]
    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    /// Return the maximum depth.
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Return the minimum child hessian sum.
    #[must_use]
    pub fn min_child_weight(&self) -> f64 {
        self.min_child_weight
    }

    /// Return the L2 regularization term.
    #[must_use]
    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    /// Return the minimum split loss.
    #[must_use]
    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    /// Check the regularization parameters.
    pub(crate) fn validate(&self) -> Result<(), GbdtError> {
        if self.max_depth == 0 {
            return Err(GbdtError::InvalidMaxDepth { max_depth: 0 });
        }
        if !self.min_child_weight.is_finite() || self.min_child_weight < 0.0 {
            return Err(GbdtError::InvalidMinChildWeight {
                min_child_weight: self.min_child_weight,
            });
        }
        if !self.lambda.is_finite() || self.lambda < 0.0 {
            return Err(GbdtError::InvalidLambda { lambda: self.lambda });
        }
        if !self.gamma.is_finite() || self.gamma < 0.0 {
            return Err(GbdtError::InvalidGamma { gamma: self.gamma });
        }
        Ok(())
    }

    /// Fit a regression tree to per-sample gradients and hessians.
    ///
    /// `features[sample_idx][feature_idx]`, row-major.
    ///
    /// # Errors
    ///
    /// | Variant                                | When                                         |
    /// |----------------------------------------|----------------------------------------------|
    /// | [`GbdtError::EmptyDataset`]            | `features` is empty                          |
    /// | [`GbdtError::ZeroFeatures`]            | rows have zero feature columns               |
    /// | [`GbdtError::FeatureCountMismatch`]    | rows have inconsistent lengths               |
    /// | [`GbdtError::NonFiniteValue`]          | any feature value is NaN or infinite         |
    /// | [`GbdtError::SampleCountMismatch`]     | gradients/hessians don't match the row count |
    /// | [`GbdtError::InvalidMaxDepth`] et al.  | a regularization parameter is out of range   |
    pub fn fit(
        &self,
        features: &[Vec<f64>],
        gradients: &[f64],
        hessians: &[f64],
    ) -> Result<RegressionTree, GbdtError> {
        let n_features = crate::validate_features(features)?;
        let n_samples = features.len();
        for (what, got) in [("gradients", gradients.len()), ("hessians", hessians.len())] {
            if got != n_samples {
                return Err(GbdtError::SampleCountMismatch {
                    what,
                    expected: n_samples,
                    got,
                });
            }
        }
        self.validate()?;

        let col_features = crate::to_columns(features, n_features);
        let sample_indices: Vec<usize> = (0..n_samples).collect();
        Ok(self.fit_columns(&col_features, gradients, hessians, &sample_indices))
    }

    /// Grow a tree on pre-validated column-major data restricted to `sample_indices`.
    #[instrument(level = "trace", skip_all, fields(n_samples = sample_indices.len()))]
    pub(crate) fn fit_columns(
        &self,
        col_features: &[Vec<f64>],
        gradients: &[f64],
        hessians: &[f64],
        sample_indices: &[usize],
    ) -> RegressionTree {
        let params = SplitParams {
            lambda: self.lambda,
            gamma: self.gamma,
            min_child_weight: self.min_child_weight,
        };
        let mut arena: Vec<Node> = Vec::new();
        build_tree(
            col_features,
            gradients,
            hessians,
            sample_indices,
            self,
            &params,
            0,
            &mut arena,
        );

        debug!(n_nodes = arena.len(), "regression tree built");

        RegressionTree {
            nodes: arena,
            n_features: col_features.len(),
        }
    }
}

impl Default for RegressionTreeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Recursively build the arena-based tree, returning the index of the node just created.
#[allow(clippy::too_many_arguments)]
fn build_tree(
    col_features: &[Vec<f64>],
    gradients: &[f64],
    hessians: &[f64],
    sample_indices: &[usize],
    config: &RegressionTreeConfig,
    params: &SplitParams,
    depth: usize,
    arena: &mut Vec<Node>,
) -> NodeIndex {
    let n_samples = sample_indices.len();
    let stats = GradientStats::over(gradients, hessians, sample_indices);

    let make_leaf = |arena: &mut Vec<Node>| -> NodeIndex {
        let idx = arena.len();
        arena.push(Node::Leaf {
            weight: stats.leaf_weight(config.lambda),
            cover: stats.hess,
            n_samples,
        });
        NodeIndex::new(idx)
    };

    if depth >= config.max_depth {
        return make_leaf(arena);
    }

    let Some(split) = find_best_split(col_features, gradients, hessians, sample_indices, params)
    else {
        return make_leaf(arena);
    };

    // Reserve the parent slot so children get the following indices.
    let node_idx = arena.len();
    arena.push(Node::Leaf {
        weight: 0.0,
        cover: stats.hess,
        n_samples,
    });

    let left = build_tree(
        col_features,
        gradients,
        hessians,
        &split.left_indices,
        config,
        params,
        depth + 1,
        arena,
    );
    let right = build_tree(
        col_features,
        gradients,
        hessians,
        &split.right_indices,
        config,
        params,
        depth + 1,
        arena,
    );

    arena[node_idx] = Node::Split {
        feature: split.feature,
        threshold: split.threshold,
        left,
        right,
        gain: split.gain,
        cover: stats.hess,
        n_samples,
    };

    NodeIndex::new(node_idx)
}

/// A fitted regression tree whose leaves hold additive scores.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RegressionTree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) n_features: usize,
}

impl RegressionTree {
    /// Return the leaf weight reached by a single sample.
    ///
    /// # Errors
    ///
    /// Returns [`GbdtError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn predict(&self, sample: &[f64]) -> Result<f64, GbdtError> {
        if sample.len() != self.n_features {
            return Err(GbdtError::PredictionFeatureMismatch {
                expected: self.n_features,
                got: sample.len(),
            });
        }
        Ok(self.leaf_weight(sample))
    }

    /// Traverse from the root; callers guarantee the sample width.
    pub(crate) fn leaf_weight(&self, sample: &[f64]) -> f64 {
        let mut idx = 0usize;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { weight, .. } => return *weight,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    idx = if sample[feature.index()] <= *threshold {
                        left.index()
                    } else {
                        right.index()
                    };
                }
            }
        }
    }

    /// Borrow the node arena (root at index 0).
    #[cfg(test)]
    #[must_use]
    pub(crate) fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Return the total number of nodes in the tree.
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Return the number of leaf nodes.
    #[cfg(test)]
    #[must_use]
    pub(crate) fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Return the maximum depth of the tree. A lone root leaf has depth 0.
    #[cfg(test)]
    #[must_use]
    pub(crate) fn depth(&self) -> usize {
        if self.nodes.is_empty() {
            return 0;
        }
        let mut max_depth = 0usize;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((node_idx, d)) = stack.pop() {
            match &self.nodes[node_idx] {
                Node::Leaf { .. } => max_depth = max_depth.max(d),
                Node::Split { left, right, .. } => {
                    stack.push((left.index(), d + 1));
                    stack.push((right.index(), d + 1));
                }
            }
        }
        max_depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step_data() -> (Vec<Vec<f64>>, Vec<f64>, Vec<f64>) {
        let features = vec![
            vec![10.0, 0.0],
            vec![12.0, 1.0],
            vec![14.0, 0.0],
            vec![25.0, 1.0],
            vec![27.0, 0.0],
            vec![29.0, 1.0],
        ];
        let gradients = vec![-1.0, -1.0, -1.0, 1.0, 1.0, 1.0];
        let hessians = vec![1.0; 6];
        (features, gradients, hessians)
    }

    #[test]
    fn fits_step_function() {
        let (features, gradients, hessians) = step_data();
        let tree = RegressionTreeConfig::new()
            .with_min_child_weight(0.0)
            .fit(&features, &gradients, &hessians)
            .unwrap();

        // Left leaf: -(-3)/(3+1) = 0.75, right leaf: -0.75.
        assert!((tree.predict(&[11.0, 0.0]).unwrap() - 0.75).abs() < 1e-12);
        assert!((tree.predict(&[28.0, 1.0]).unwrap() + 0.75).abs() < 1e-12);
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.n_leaves(), 2);
    }

    #[test]
    fn zero_gradients_give_single_zero_leaf() {
        let (features, _, hessians) = step_data();
        let tree = RegressionTreeConfig::new()
            .fit(&features, &[0.0; 6], &hessians)
            .unwrap();
        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.predict(&[20.0, 0.0]).unwrap(), 0.0);
    }

    #[test]
    fn max_depth_limits_tree() {
        let features: Vec<Vec<f64>> = (0..16).map(|i| vec![i as f64]).collect();
        let gradients: Vec<f64> = (0..16).map(|i| if i % 2 == 0 { -1.0 } else { 1.0 }).collect();
        let hessians = vec![1.0; 16];
        let tree = RegressionTreeConfig::new()
            .with_max_depth(2)
            .with_min_child_weight(0.0)
            .with_lambda(0.0)
            .fit(&features, &gradients, &hessians)
            .unwrap();
        assert!(tree.depth() <= 2);
    }

    #[test]
    fn empty_dataset_error() {
        let err = RegressionTreeConfig::new().fit(&[], &[], &[]).unwrap_err();
        assert!(matches!(err, GbdtError::EmptyDataset));
    }

    #[test]
    fn gradient_count_mismatch() {
        let (features, _, hessians) = step_data();
        let err = RegressionTreeConfig::new()
            .fit(&features, &[0.0; 3], &hessians)
            .unwrap_err();
        assert!(matches!(
            err,
            GbdtError::SampleCountMismatch { what: "gradients", expected: 6, got: 3 }
        ));
    }

    #[test]
    fn invalid_depth_rejected() {
        let (features, gradients, hessians) = step_data();
        let err = RegressionTreeConfig::new()
            .with_max_depth(0)
            .fit(&features, &gradients, &hessians)
            .unwrap_err();
        assert!(matches!(err, GbdtError::InvalidMaxDepth { max_depth: 0 }));
    }

    #[test]
    fn prediction_feature_mismatch() {
        let (features, gradients, hessians) = step_data();
        let tree = RegressionTreeConfig::new()
            .fit(&features, &gradients, &hessians)
            .unwrap();
        let err = tree.predict(&[1.0]).unwrap_err();
        assert!(matches!(
            err,
            GbdtError::PredictionFeatureMismatch { expected: 2, got: 1 }
        ));
    }
}
