/// Errors from gradient boosting training and inference.
#[derive(Debug, thiserror::Error)]
pub enum GbdtError {
    /// Returned when n_rounds is zero.
    #[error("n_rounds must be at least 1, got {n_rounds}")]
    InvalidRoundCount {
        /// The invalid n_rounds value provided.
        n_rounds: usize,
    },

    /// Returned when learning_rate is not in (0.0, 1.0].
    #[error("learning_rate must be in (0.0, 1.0], got {learning_rate}")]
    InvalidLearningRate {
        /// The invalid learning rate provided.
        learning_rate: f64,
    },

    /// Returned when max_depth is zero.
    #[error("max_depth must be at least 1, got {max_depth}")]
    InvalidMaxDepth {
        /// The invalid max_depth value provided.
        max_depth: usize,
    },

    /// Returned when min_child_weight is negative or not finite.
    #[error("min_child_weight must be finite and >= 0.0, got {min_child_weight}")]
    InvalidMinChildWeight {
        /// The invalid min_child_weight value provided.
        min_child_weight: f64,
    },

    /// Returned when the L2 regularization term is negative or not finite.
    #[error("lambda must be finite and >= 0.0, got {lambda}")]
    InvalidLambda {
        /// The invalid lambda value provided.
        lambda: f64,
    },

    /// Returned when the minimum split loss is negative or not finite.
    #[error("gamma must be finite and >= 0.0, got {gamma}")]
    InvalidGamma {
        /// The invalid gamma value provided.
        gamma: f64,
    },

    /// Returned when subsample is not in (0.0, 1.0].
    #[error("subsample must be in (0.0, 1.0], got {fraction}")]
    InvalidSubsample {
        /// The invalid subsample fraction provided.
        fraction: f64,
    },

    /// Returned when the number of classes is zero.
    #[error("n_classes must be at least 1, got {n_classes}")]
    InvalidClassCount {
        /// The invalid class count provided.
        n_classes: usize,
    },

    /// Returned when the training dataset has zero samples.
    #[error("training dataset has zero samples")]
    EmptyDataset,

    /// Returned when the training dataset has zero feature columns.
    #[error("training dataset has zero feature columns")]
    ZeroFeatures,

    /// Returned when a sample has a different number of features than expected.
    #[error("sample {sample_index} has {got} features, expected {expected}")]
    FeatureCountMismatch {
        /// The expected number of features.
        expected: usize,
        /// The actual number of features in the sample.
        got: usize,
        /// The zero-based index of the offending sample.
        sample_index: usize,
    },

    /// Returned when a per-sample vector (labels, gradients, hessians) does
    /// not line up with the feature rows.
    #[error("{what} has {got} entries, expected one per sample ({expected})")]
    SampleCountMismatch {
        /// Name of the mismatched input.
        what: &'static str,
        /// Number of feature rows.
        expected: usize,
        /// Number of entries provided.
        got: usize,
    },

    /// Returned when a training label is not below the class count.
    #[error("sample {sample_index} has label {label}, but only {n_classes} classes exist")]
    LabelOutOfRange {
        /// The zero-based index of the offending sample.
        sample_index: usize,
        /// The offending label.
        label: usize,
        /// Number of classes the model is trained for.
        n_classes: usize,
    },

    /// Returned when a training value is NaN or infinite.
    #[error("non-finite value at sample {sample_index}, feature {feature_index}")]
    NonFiniteValue {
        /// The zero-based index of the offending sample.
        sample_index: usize,
        /// The zero-based index of the offending feature column.
        feature_index: usize,
    },

    /// Returned when a sample has a different number of features at prediction time.
    #[error("prediction input has {got} features, expected {expected}")]
    PredictionFeatureMismatch {
        /// The expected number of features.
        expected: usize,
        /// The actual number of features in the prediction input.
        got: usize,
    },
}
