//! Depth-bounded classification tree
//!
//! CART-style binary tree over weighted Gini impurity. Sample weights carry
//! the class-imbalance correction into every split decision and leaf
//! probability. Split search is exhaustive over feature midpoints in a fixed
//! order, so fitting is deterministic for a given training segment.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Fewest rows a node needs before a split is attempted
const MIN_SAMPLES_SPLIT: usize = 4;

/// Fewest rows allowed in a child node
const MIN_SAMPLES_LEAF: usize = 2;

/// One tree node; leaves carry the weighted positive-class probability
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TreeNode {
    feature_idx: Option<usize>,
    threshold: Option<f64>,
    positive_prob: f64,
    left: Option<Box<TreeNode>>,
    right: Option<Box<TreeNode>>,
}

impl TreeNode {
    fn leaf(positive_prob: f64) -> Self {
        Self {
            feature_idx: None,
            threshold: None,
            positive_prob,
            left: None,
            right: None,
        }
    }

    fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

/// Fitted depth-bounded classification tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeModel {
    root: TreeNode,
    /// Per-feature importance, non-negative, summing to 1 when any split
    /// was made
    importances: Vec<f64>,
    pub max_depth: usize,
}

impl TreeModel {
    /// Fit on a predictor matrix and 0/1 labels with per-sample weights.
    pub fn fit(
        x: &Array2<f64>,
        y: &Array1<f64>,
        sample_weights: &Array1<f64>,
        max_depth: usize,
    ) -> Self {
        let indices: Vec<usize> = (0..x.nrows()).collect();
        let mut importances = vec![0.0; x.ncols()];
        let root = build_node(x, y, sample_weights, &indices, 0, max_depth, &mut importances);

        // Normalize accumulated split gains to a distribution
        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for importance in &mut importances {
                *importance /= total;
            }
        }

        Self {
            root,
            importances,
            max_depth,
        }
    }

    /// Positive-class probability for each row of `x`
    pub fn predict_proba(&self, x: &Array2<f64>) -> Array1<f64> {
        Array1::from_shape_fn(x.nrows(), |i| {
            let mut node = &self.root;
            while !node.is_leaf() {
                // Split nodes always hold both children and a threshold
                let (Some(feature), Some(threshold), Some(left), Some(right)) = (
                    node.feature_idx,
                    node.threshold,
                    node.left.as_deref(),
                    node.right.as_deref(),
                ) else {
                    break;
                };
                node = if x[[i, feature]] <= threshold {
                    left
                } else {
                    right
                };
            }
            node.positive_prob
        })
    }

    /// Normalized per-feature importances in matrix column order
    pub fn importances(&self) -> &[f64] {
        &self.importances
    }

    /// Depth actually reached by the fitted tree
    pub fn depth(&self) -> usize {
        node_depth(&self.root)
    }
}

fn node_depth(node: &TreeNode) -> usize {
    if node.is_leaf() {
        1
    } else {
        let left = node.left.as_deref().map(node_depth).unwrap_or(0);
        let right = node.right.as_deref().map(node_depth).unwrap_or(0);
        1 + left.max(right)
    }
}

/// Weighted share of positive labels among `indices`
fn weighted_positive_prob(y: &Array1<f64>, weights: &Array1<f64>, indices: &[usize]) -> f64 {
    let mut positive = 0.0;
    let mut total = 0.0;
    for &i in indices {
        total += weights[i];
        if y[i] >= 0.5 {
            positive += weights[i];
        }
    }
    if total > 0.0 {
        positive / total
    } else {
        0.0
    }
}

/// Binary Gini impurity from a positive-class probability
fn gini(positive_prob: f64) -> f64 {
    2.0 * positive_prob * (1.0 - positive_prob)
}

fn build_node(
    x: &Array2<f64>,
    y: &Array1<f64>,
    weights: &Array1<f64>,
    indices: &[usize],
    depth: usize,
    max_depth: usize,
    importances: &mut [f64],
) -> TreeNode {
    let positive_prob = weighted_positive_prob(y, weights, indices);
    let impurity = gini(positive_prob);

    if depth >= max_depth || indices.len() < MIN_SAMPLES_SPLIT || impurity < 1e-12 {
        return TreeNode::leaf(positive_prob);
    }

    match find_best_split(x, y, weights, indices, impurity) {
        Some(split) => {
            importances[split.feature_idx] += split.weighted_gain;
            let left = build_node(
                x,
                y,
                weights,
                &split.left_indices,
                depth + 1,
                max_depth,
                importances,
            );
            let right = build_node(
                x,
                y,
                weights,
                &split.right_indices,
                depth + 1,
                max_depth,
                importances,
            );
            TreeNode {
                feature_idx: Some(split.feature_idx),
                threshold: Some(split.threshold),
                positive_prob,
                left: Some(Box::new(left)),
                right: Some(Box::new(right)),
            }
        }
        None => TreeNode::leaf(positive_prob),
    }
}

struct Split {
    feature_idx: usize,
    threshold: f64,
    left_indices: Vec<usize>,
    right_indices: Vec<usize>,
    weighted_gain: f64,
}

/// Exhaustive best-split search over feature midpoints. Features are visited
/// in column order and only a strictly better gain replaces the incumbent,
/// keeping the choice deterministic under ties.
fn find_best_split(
    x: &Array2<f64>,
    y: &Array1<f64>,
    weights: &Array1<f64>,
    indices: &[usize],
    parent_impurity: f64,
) -> Option<Split> {
    let total_weight: f64 = indices.iter().map(|&i| weights[i]).sum();
    let mut best_gain = 1e-12;
    let mut best: Option<Split> = None;

    for feature_idx in 0..x.ncols() {
        let mut values: Vec<f64> = indices.iter().map(|&i| x[[i, feature_idx]]).collect();
        values.sort_by(f64::total_cmp);
        values.dedup();

        for pair in values.windows(2) {
            let threshold = (pair[0] + pair[1]) / 2.0;
            let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
                .iter()
                .partition(|&&i| x[[i, feature_idx]] <= threshold);

            if left_indices.len() < MIN_SAMPLES_LEAF || right_indices.len() < MIN_SAMPLES_LEAF {
                continue;
            }

            let left_weight: f64 = left_indices.iter().map(|&i| weights[i]).sum();
            let right_weight: f64 = right_indices.iter().map(|&i| weights[i]).sum();
            let left_impurity = gini(weighted_positive_prob(y, weights, &left_indices));
            let right_impurity = gini(weighted_positive_prob(y, weights, &right_indices));

            let child_impurity =
                (left_weight * left_impurity + right_weight * right_impurity) / total_weight;
            let gain = parent_impurity - child_impurity;

            if gain > best_gain {
                best_gain = gain;
                best = Some(Split {
                    feature_idx,
                    threshold,
                    left_indices,
                    right_indices,
                    weighted_gain: gain * total_weight,
                });
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two features; only the first carries signal (positives above x0 = 10)
    fn signal_and_noise() -> (Array2<f64>, Array1<f64>) {
        let mut x = Array2::zeros((20, 2));
        for i in 0..20 {
            x[[i, 0]] = i as f64;
            x[[i, 1]] = (i % 4) as f64; // uninformative
        }
        let y = Array1::from_shape_fn(20, |i| if i >= 10 { 1.0 } else { 0.0 });
        (x, y)
    }

    #[test]
    fn test_fit_separates_classes() {
        let (x, y) = signal_and_noise();
        let model = TreeModel::fit(&x, &y, &Array1::ones(20), 5);

        let probs = model.predict_proba(&x);
        assert!(probs[0] < 0.5);
        assert!(probs[19] > 0.5);
    }

    #[test]
    fn test_depth_bound_respected() {
        let (x, y) = signal_and_noise();
        let model = TreeModel::fit(&x, &y, &Array1::ones(20), 2);
        // depth counts nodes along the longest path, so a bound of 2 splits
        // allows at most 3 levels
        assert!(model.depth() <= 3);
    }

    #[test]
    fn test_importances_normalized_and_signal_dominates() {
        let (x, y) = signal_and_noise();
        let model = TreeModel::fit(&x, &y, &Array1::ones(20), 5);

        let importances = model.importances();
        assert!(importances.iter().all(|&v| v >= 0.0));
        let sum: f64 = importances.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        // The informative feature gets essentially all the credit
        assert!(importances[0] > 0.9);
    }

    #[test]
    fn test_fit_is_deterministic() {
        let (x, y) = signal_and_noise();
        let a = TreeModel::fit(&x, &y, &Array1::ones(20), 5);
        let b = TreeModel::fit(&x, &y, &Array1::ones(20), 5);
        assert_eq!(a.importances(), b.importances());
        assert_eq!(a.predict_proba(&x), b.predict_proba(&x));
    }

    #[test]
    fn test_pure_node_becomes_leaf() {
        let x = Array2::from_shape_fn((12, 1), |(i, _)| i as f64);
        let y = Array1::zeros(12);
        let model = TreeModel::fit(&x, &y, &Array1::ones(12), 5);

        // No split possible on a single-class node
        assert_eq!(model.depth(), 1);
        assert!(model.predict_proba(&x).iter().all(|&p| p == 0.0));
    }

    #[test]
    fn test_sample_weights_move_leaf_probabilities() {
        // Mixed leaf: weights decide which class dominates
        let x = Array2::zeros((4, 1));
        let y = Array1::from_vec(vec![1.0, 1.0, 0.0, 0.0]);
        let heavy_pos = Array1::from_vec(vec![3.0, 3.0, 1.0, 1.0]);

        let model = TreeModel::fit(&x, &y, &heavy_pos, 3);
        let p = model.predict_proba(&x)[0];
        // 6 of 8 total weight is positive
        assert!((p - 0.75).abs() < 1e-12);
    }
}
