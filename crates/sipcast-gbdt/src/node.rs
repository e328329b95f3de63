use std::fmt;

/// Zero-based feature column index.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    serde::Serialize, serde::Deserialize,
)]
pub struct FeatureIndex(usize);

impl FeatureIndex {
    /// Create a new feature index from a zero-based column position.
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the zero-based feature column index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for FeatureIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index into a `Vec<Node>` arena, identifying a specific node in a tree.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    serde::Serialize, serde::Deserialize,
)]
pub struct NodeIndex(usize);

impl NodeIndex {
    /// Create a new node index from a zero-based arena position.
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the zero-based arena index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A node in a regression tree arena.
///
/// Children are referenced by [`NodeIndex`] rather than pointers, so a tree
/// is a flat `Vec<Node>` with the root at index 0.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum Node {
    /// An interior split node.
    Split {
        /// Feature used for the split.
        feature: FeatureIndex,
        /// Threshold value: samples with feature <= threshold go left.
        threshold: f64,
        /// Index of the left child node.
        left: NodeIndex,
        /// Index of the right child node.
        right: NodeIndex,
        /// Loss reduction achieved by this split.
        gain: f64,
        /// Sum of hessians of the training samples that reached this node.
        cover: f64,
        /// Number of training samples that reached this node.
        n_samples: usize,
    },
    /// A terminal leaf node.
    Leaf {
        /// Additive score contributed by this leaf (before shrinkage).
        weight: f64,
        /// Sum of hessians of the training samples in this leaf.
        cover: f64,
        /// Number of training samples in this leaf.
        n_samples: usize,
    },
}

impl Node {
    /// Return the hessian sum of the samples that reached this node.
    #[cfg(test)]
    #[must_use]
    pub(crate) fn cover(&self) -> f64 {
        match self {
            Node::Split { cover, .. } | Node::Leaf { cover, .. } => *cover,
        }
    }

    /// Return the number of training samples that reached this node.
    #[cfg(test)]
    #[must_use]
    pub(crate) fn n_samples(&self) -> usize {
        match self {
            Node::Split { n_samples, .. } | Node::Leaf { n_samples, .. } => *n_samples,
        }
    }

    /// Return `true` if this node is a leaf.
    #[cfg(test)]
    #[must_use]
    pub(crate) fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::{FeatureIndex, Node, NodeIndex};

    #[test]
    fn feature_index_display() {
        assert_eq!(format!("{}", FeatureIndex::new(3)), "3");
    }

    #[test]
    fn node_index_ordering() {
        assert!(NodeIndex::new(10) < NodeIndex::new(20));
    }

    fn make_leaf() -> Node {
        Node::Leaf {
            weight: -0.4,
            cover: 2.5,
            n_samples: 10,
        }
    }

    fn make_split() -> Node {
        Node::Split {
            feature: FeatureIndex::new(1),
            threshold: 21.5,
            left: NodeIndex::new(1),
            right: NodeIndex::new(2),
            gain: 0.7,
            cover: 5.0,
            n_samples: 20,
        }
    }

    #[test]
    fn leaf_is_leaf() {
        assert!(make_leaf().is_leaf());
        assert!(!make_split().is_leaf());
    }

    #[test]
    fn n_samples_and_cover() {
        assert_eq!(make_leaf().n_samples(), 10);
        assert_eq!(make_split().n_samples(), 20);
        assert!((make_leaf().cover() - 2.5).abs() < f64::EPSILON);
        assert!((make_split().cover() - 5.0).abs() < f64::EPSILON);
    }
}
