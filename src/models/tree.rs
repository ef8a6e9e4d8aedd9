//! Regression trees fitted to gradient statistics
//!
//! Each boosting round grows one of these on the per-row gradient and
//! hessian of the loss. Splits maximize the second-order gain
//! `G_L²/(H_L+λ) + G_R²/(H_R+λ) − G²/(H+λ)` and leaves hold the Newton step
//! `−G/(H+λ)`.

use ndarray::{ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

/// Tree growth limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Maximum depth of tree
    pub max_depth: usize,
    /// Minimum samples in leaf node
    pub min_samples_leaf: usize,
    /// Minimum hessian sum in each child
    pub min_child_weight: f64,
    /// L2 regularization on leaf weights
    pub lambda: f64,
}

/// Tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    Leaf {
        weight: f64,
        n_samples: usize,
    },
    Split {
        feature_idx: usize,
        threshold: f64,
        gain: f64,
        n_samples: usize,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    pub fn is_leaf(&self) -> bool {
        matches!(self, TreeNode::Leaf { .. })
    }

    pub fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 1,
            TreeNode::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    pub fn n_leaves(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 1,
            TreeNode::Split { left, right, .. } => left.n_leaves() + right.n_leaves(),
        }
    }
}

struct BestSplit {
    feature_idx: usize,
    threshold: f64,
    gain: f64,
}

/// A fitted gradient tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientTree {
    root: TreeNode,
}

impl GradientTree {
    /// Grow a tree on `rows` of `features`
    ///
    /// Split gains are added to `importances` (one slot per feature).
    pub fn fit(
        config: &TreeConfig,
        features: ArrayView2<'_, f64>,
        grad: &[f64],
        hess: &[f64],
        rows: &[usize],
        importances: &mut [f64],
    ) -> Self {
        let builder = TreeBuilder {
            config,
            features: features.view(),
            grad,
            hess,
        };
        let root = builder.build(rows, 0, importances);
        Self { root }
    }

    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    /// Leaf weight for a single sample
    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut node = &self.root;
        loop {
            match node {
                TreeNode::Leaf { weight, .. } => return *weight,
                TreeNode::Split {
                    feature_idx,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    node = if row[*feature_idx] <= *threshold {
                        left.as_ref()
                    } else {
                        right.as_ref()
                    };
                }
            }
        }
    }
}

struct TreeBuilder<'a> {
    config: &'a TreeConfig,
    features: ArrayView2<'a, f64>,
    grad: &'a [f64],
    hess: &'a [f64],
}

impl TreeBuilder<'_> {
    fn build(&self, rows: &[usize], depth: usize, importances: &mut [f64]) -> TreeNode {
        let (g_sum, h_sum) = self.sums(rows);
        let leaf = TreeNode::Leaf {
            weight: -g_sum / (h_sum + self.config.lambda),
            n_samples: rows.len(),
        };

        if depth >= self.config.max_depth || rows.len() < 2 * self.config.min_samples_leaf.max(1) {
            return leaf;
        }

        let Some(best) = self.find_best_split(rows, g_sum, h_sum) else {
            return leaf;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .iter()
            .partition(|&&r| self.features[[r, best.feature_idx]] <= best.threshold);

        if left_rows.is_empty() || right_rows.is_empty() {
            return leaf;
        }

        importances[best.feature_idx] += best.gain;

        TreeNode::Split {
            feature_idx: best.feature_idx,
            threshold: best.threshold,
            gain: best.gain,
            n_samples: rows.len(),
            left: Box::new(self.build(&left_rows, depth + 1, importances)),
            right: Box::new(self.build(&right_rows, depth + 1, importances)),
        }
    }

    fn sums(&self, rows: &[usize]) -> (f64, f64) {
        rows.iter()
            .fold((0.0, 0.0), |(g, h), &r| (g + self.grad[r], h + self.hess[r]))
    }

    fn score(&self, g: f64, h: f64) -> f64 {
        g * g / (h + self.config.lambda)
    }

    /// Sweep every feature in sorted order and keep the best positive gain
    fn find_best_split(&self, rows: &[usize], g_sum: f64, h_sum: f64) -> Option<BestSplit> {
        let n = rows.len();
        let min_leaf = self.config.min_samples_leaf.max(1);
        let parent_score = self.score(g_sum, h_sum);
        let mut best: Option<BestSplit> = None;

        for feature_idx in 0..self.features.ncols() {
            let mut sorted: Vec<(f64, usize)> = rows
                .iter()
                .map(|&r| (self.features[[r, feature_idx]], r))
                .collect();
            sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut g_left = 0.0;
            let mut h_left = 0.0;

            for k in 0..n - 1 {
                let (value, row) = sorted[k];
                g_left += self.grad[row];
                h_left += self.hess[row];

                let next_value = sorted[k + 1].0;
                if next_value <= value {
                    continue;
                }

                let n_left = k + 1;
                if n_left < min_leaf || n - n_left < min_leaf {
                    continue;
                }

                let g_right = g_sum - g_left;
                let h_right = h_sum - h_left;
                if h_left < self.config.min_child_weight || h_right < self.config.min_child_weight {
                    continue;
                }

                let gain = 0.5
                    * (self.score(g_left, h_left) + self.score(g_right, h_right) - parent_score);

                if gain > best.as_ref().map_or(0.0, |b| b.gain) {
                    let midpoint = (value + next_value) / 2.0;
                    let threshold = if midpoint < next_value { midpoint } else { value };
                    best = Some(BestSplit {
                        feature_idx,
                        threshold,
                        gain,
                    });
                }
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array2;

    fn config(max_depth: usize) -> TreeConfig {
        TreeConfig {
            max_depth,
            min_samples_leaf: 1,
            min_child_weight: 0.0,
            lambda: 0.0,
        }
    }

    #[test]
    fn test_single_split_separates_gradients() {
        let x = Array2::from_shape_vec((6, 1), vec![1.0, 2.0, 3.0, 10.0, 11.0, 12.0]).unwrap();
        let grad = vec![-1.0, -1.0, -1.0, 1.0, 1.0, 1.0];
        let hess = vec![1.0; 6];
        let rows: Vec<usize> = (0..6).collect();
        let mut importances = vec![0.0];

        let tree = GradientTree::fit(&config(3), x.view(), &grad, &hess, &rows, &mut importances);

        assert_eq!(tree.root().depth(), 2);
        assert_eq!(tree.root().n_leaves(), 2);
        assert!(importances[0] > 0.0);
        assert_relative_eq!(tree.predict_row(x.row(0)), 1.0);
        assert_relative_eq!(tree.predict_row(x.row(5)), -1.0);
        match tree.root() {
            TreeNode::Split { threshold, .. } => assert_relative_eq!(*threshold, 6.5),
            TreeNode::Leaf { .. } => panic!("expected a split"),
        }
    }

    #[test]
    fn test_depth_zero_is_a_single_leaf() {
        let x = Array2::from_shape_vec((4, 1), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let grad = vec![1.0, 1.0, -1.0, 3.0];
        let hess = vec![1.0; 4];
        let mut importances = vec![0.0];

        let tree = GradientTree::fit(&config(0), x.view(), &grad, &hess, &[0, 1, 2, 3], &mut importances);

        assert!(tree.root().is_leaf());
        assert_relative_eq!(tree.predict_row(x.row(2)), -1.0);
    }

    #[test]
    fn test_constant_feature_is_never_split() {
        let x = Array2::from_elem((5, 1), 7.0);
        let grad = vec![-1.0, 1.0, -1.0, 1.0, -1.0];
        let hess = vec![1.0; 5];
        let mut importances = vec![0.0];

        let tree = GradientTree::fit(&config(4), x.view(), &grad, &hess, &[0, 1, 2, 3, 4], &mut importances);

        assert!(tree.root().is_leaf());
        assert_eq!(importances[0], 0.0);
    }

    #[test]
    fn test_min_samples_leaf_limits_splits() {
        let x = Array2::from_shape_vec((4, 1), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let grad = vec![-5.0, 1.0, 1.0, 1.0];
        let hess = vec![1.0; 4];
        let mut importances = vec![0.0];
        let cfg = TreeConfig {
            min_samples_leaf: 2,
            ..config(4)
        };

        let tree = GradientTree::fit(&cfg, x.view(), &grad, &hess, &[0, 1, 2, 3], &mut importances);

        match tree.root() {
            TreeNode::Split { threshold, left, right, .. } => {
                assert_relative_eq!(*threshold, 2.5);
                assert!(left.is_leaf() && right.is_leaf());
            }
            TreeNode::Leaf { .. } => panic!("expected a split"),
        }
    }
}
