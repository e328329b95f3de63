use crate::node::FeatureIndex;

/// Running sum of first- and second-order gradients over a set of samples.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct GradientStats {
    pub(crate) grad: f64,
    pub(crate) hess: f64,
}

impl GradientStats {
    /// Sum the gradient pairs of the given samples.
    pub(crate) fn over(gradients: &[f64], hessians: &[f64], sample_indices: &[usize]) -> Self {
        let mut stats = Self::default();
        for &si in sample_indices {
            stats.add(gradients[si], hessians[si]);
        }
        stats
    }

    pub(crate) fn add(&mut self, grad: f64, hess: f64) {
        self.grad += grad;
        self.hess += hess;
    }

    pub(crate) fn minus(self, other: Self) -> Self {
        Self {
            grad: self.grad - other.grad,
            hess: self.hess - other.hess,
        }
    }

    /// Structure score `G² / (H + λ)`; zero when the denominator vanishes.
    pub(crate) fn score(self, lambda: f64) -> f64 {
        let denom = self.hess + lambda;
        if denom <= 0.0 {
            return 0.0;
        }
        self.grad * self.grad / denom
    }

    /// Optimal leaf weight `-G / (H + λ)`; zero when the denominator vanishes.
    pub(crate) fn leaf_weight(self, lambda: f64) -> f64 {
        let denom = self.hess + lambda;
        if denom <= 0.0 {
            return 0.0;
        }
        -self.grad / denom
    }
}

/// Regularization knobs consulted while searching for a split.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SplitParams {
    /// L2 penalty on leaf weights.
    pub(crate) lambda: f64,
    /// Minimum loss reduction required to keep a split.
    pub(crate) gamma: f64,
    /// Minimum hessian sum required in each child.
    pub(crate) min_child_weight: f64,
}

/// Result of finding the best split for a node.
#[derive(Debug, Clone)]
pub(crate) struct SplitResult {
    /// Feature used for the split.
    pub(crate) feature: FeatureIndex,
    /// Threshold value.
    pub(crate) threshold: f64,
    /// Loss reduction from this split, net of `gamma`.
    pub(crate) gain: f64,
    /// Sample indices going to the left child.
    pub(crate) left_indices: Vec<usize>,
    /// Sample indices going to the right child.
    pub(crate) right_indices: Vec<usize>,
}

/// Find the split with the largest loss reduction by exact greedy search.
///
/// For every feature, sorts the `(value, sample)` pairs, scans left-to-right
/// moving one sample at a time from the right child to the left child, and
/// scores each boundary between distinct values with
///
/// `gain = ½ [G_L²/(H_L+λ) + G_R²/(H_R+λ) − G²/(H+λ)] − γ`
///
/// Returns `None` when no boundary yields a positive gain while keeping both
/// children at or above `min_child_weight`.
///
/// `features` is column-major: `features[feature_idx][sample_idx]`.
pub(crate) fn find_best_split(
    features: &[Vec<f64>],
    gradients: &[f64],
    hessians: &[f64],
    sample_indices: &[usize],
    params: &SplitParams,
) -> Option<SplitResult> {
    let n_samples = sample_indices.len();
    if n_samples < 2 || features.is_empty() {
        return None;
    }

    let parent = GradientStats::over(gradients, hessians, sample_indices);
    let parent_score = parent.score(params.lambda);

    let mut best_gain = 0.0;
    let mut best: Option<(FeatureIndex, f64)> = None;

    for (feat_idx, feat_col) in features.iter().enumerate() {
        let mut sorted: Vec<(f64, usize)> = sample_indices
            .iter()
            .map(|&si| (feat_col[si], si))
            .collect();
        sorted.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));

        let mut left = GradientStats::default();
        for i in 0..(n_samples - 1) {
            let (val_i, si) = sorted[i];
            left.add(gradients[si], hessians[si]);

            let val_next = sorted[i + 1].0;
            if val_i == val_next {
                continue;
            }

            let right = parent.minus(left);
            if left.hess < params.min_child_weight || right.hess < params.min_child_weight {
                continue;
            }

            let gain = 0.5
                * (left.score(params.lambda) + right.score(params.lambda) - parent_score)
                - params.gamma;

            if gain > best_gain {
                best_gain = gain;
                best = Some((FeatureIndex::new(feat_idx), val_i + (val_next - val_i) / 2.0));
            }
        }
    }

    let (feature, threshold) = best?;

    let feat_col = &features[feature.index()];
    let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = sample_indices
        .iter()
        .partition(|&&si| feat_col[si] <= threshold);

    Some(SplitResult {
        feature,
        threshold,
        gain: best_gain,
        left_indices,
        right_indices,
    })
}
