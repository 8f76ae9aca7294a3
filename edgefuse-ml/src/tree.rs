//! Isolation tree evaluation
//!
//! A tree is a flat node array in pre-order, root at index 0. Evaluation
//! walks from the root to a leaf and returns the path length `h(x)`: the
//! number of edges traversed plus `c(size)` for the samples left at the
//! leaf.

use serde::{Deserialize, Serialize};

use crate::node::{c_factor, Node};
use crate::{MlError, MlResult};

/// One exported isolation tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsolationTree {
    /// Tree nodes in pre-order
    pub nodes: Vec<Node>,
}

impl IsolationTree {
    /// Wrap a node array
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Check the structure before the tree is ever walked
    ///
    /// Children must point forward inside the array, so a valid tree can
    /// neither cycle nor index out of bounds during evaluation.
    pub fn validate(&self, num_features: usize) -> MlResult<()> {
        if self.nodes.is_empty() {
            return Err(MlError::invalid_model("tree has no nodes"));
        }

        for (index, node) in self.nodes.iter().enumerate() {
            if let Node::Internal { feature, threshold, left, right } = *node {
                if feature >= num_features {
                    return Err(MlError::FeatureMismatch {
                        expected: num_features,
                        found: feature + 1,
                    });
                }
                if !threshold.is_finite() {
                    return Err(MlError::invalid_model(format!(
                        "node {} has a non-finite threshold",
                        index
                    )));
                }
                for child in [left, right] {
                    if child <= index || child >= self.nodes.len() {
                        return Err(MlError::invalid_model(format!(
                            "node {} points at child {} outside the tree",
                            index, child
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Path length `h(x)` for a sample
    ///
    /// Assumes a validated tree. A dangling child on an unvalidated tree
    /// ends the walk at the current depth.
    pub fn path_length(&self, sample: &[f64]) -> f64 {
        let mut index = 0;
        let mut depth = 0usize;

        while let Some(node) = self.nodes.get(index) {
            match node.traverse(sample) {
                Some(next) => {
                    index = next;
                    depth += 1;
                }
                None => {
                    let size = match *node {
                        Node::Leaf { size } => size,
                        Node::Internal { .. } => 1,
                    };
                    return depth as f64 + c_factor(size);
                }
            }
        }

        depth as f64
    }

    /// Get the number of nodes in the tree
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of leaves
    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Root splits feature 0 at 10; the left side splits feature 1 at 0.
    ///
    /// ```text
    ///          [0] x0 <= 10
    ///         /            \
    ///   [1] x1 <= 0      [4] leaf(1)
    ///    /       \
    /// [2] leaf(8) [3] leaf(2)
    /// ```
    fn sample_tree() -> IsolationTree {
        IsolationTree::new(vec![
            Node::Internal { feature: 0, threshold: 10.0, left: 1, right: 4 },
            Node::Internal { feature: 1, threshold: 0.0, left: 2, right: 3 },
            Node::Leaf { size: 8 },
            Node::Leaf { size: 2 },
            Node::Leaf { size: 1 },
        ])
    }

    #[test]
    fn test_path_length() {
        let tree = sample_tree();
        tree.validate(2).unwrap();

        // Outlier on feature 0 is isolated after one split
        assert_eq!(tree.path_length(&[50.0, 0.0]), 1.0);
        // Two edges plus c(2)
        assert_eq!(tree.path_length(&[5.0, 3.0]), 3.0);
        // Dense leaf: two edges plus c(8)
        let dense = tree.path_length(&[5.0, -1.0]);
        assert!((dense - (2.0 + c_factor(8))).abs() < 1e-12);
        assert!(dense > tree.path_length(&[50.0, 0.0]));

        assert_eq!(tree.node_count(), 5);
        assert_eq!(tree.leaf_count(), 3);
    }

    #[test]
    fn single_leaf_tree() {
        let tree = IsolationTree::new(vec![Node::Leaf { size: 1 }]);
        tree.validate(5).unwrap();
        assert_eq!(tree.path_length(&[1.0; 5]), 0.0);
    }

    #[test]
    fn rejects_broken_structure() {
        assert!(IsolationTree::new(Vec::new()).validate(5).is_err());

        let backwards = IsolationTree::new(vec![
            Node::Internal { feature: 0, threshold: 1.0, left: 0, right: 1 },
            Node::Leaf { size: 1 },
        ]);
        assert!(matches!(backwards.validate(5), Err(MlError::InvalidModel { .. })));

        let dangling = IsolationTree::new(vec![
            Node::Internal { feature: 0, threshold: 1.0, left: 1, right: 9 },
            Node::Leaf { size: 1 },
        ]);
        assert!(dangling.validate(5).is_err());

        let wide = IsolationTree::new(vec![
            Node::Internal { feature: 7, threshold: 1.0, left: 1, right: 2 },
            Node::Leaf { size: 1 },
            Node::Leaf { size: 1 },
        ]);
        assert_eq!(
            wide.validate(5),
            Err(MlError::FeatureMismatch { expected: 5, found: 8 })
        );

        let nan = IsolationTree::new(vec![
            Node::Internal { feature: 0, threshold: f64::NAN, left: 1, right: 2 },
            Node::Leaf { size: 1 },
            Node::Leaf { size: 1 },
        ]);
        assert!(nan.validate(5).is_err());
    }
}
