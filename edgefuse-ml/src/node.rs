//! Isolation tree nodes
//!
//! Nodes live in a flat array per tree and refer to their children by
//! index. An exported tree is a pre-order walk, so every child index is
//! strictly greater than its parent's.

use serde::{Deserialize, Serialize};

/// One node of an isolation tree
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    /// Split on one feature
    Internal {
        /// Feature index to split on
        feature: usize,
        /// Samples with `x[feature] <= threshold` go left
        threshold: f64,
        /// Left child index
        left: usize,
        /// Right child index
        right: usize,
    },
    /// Leaf holding the training samples that reached it
    Leaf {
        /// Number of training samples at this leaf
        size: usize,
    },
}

impl Node {
    /// Check if node is a leaf
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }

    /// Child index for a sample, `None` at a leaf
    ///
    /// A missing feature compares as NaN and takes the right branch.
    pub fn traverse(&self, sample: &[f64]) -> Option<usize> {
        match *self {
            Node::Internal { feature, threshold, left, right } => {
                let value = sample.get(feature).copied().unwrap_or(f64::NAN);
                if value <= threshold {
                    Some(left)
                } else {
                    Some(right)
                }
            }
            Node::Leaf { .. } => None,
        }
    }
}

/// Average path length of an unsuccessful BST search over `n` points
///
/// `c(n) = 2 H(n-1) - 2 (n-1) / n` with the harmonic number approximated
/// as `ln(i) + γ`. Used both to normalise forest scores and to extend the
/// path of a leaf that still holds more than one sample.
pub fn c_factor(n: usize) -> f64 {
    const EULER: f64 = 0.577_215_664_901_532_9;

    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER) - 2.0 * (n - 1.0) / n
        }
    }
}
