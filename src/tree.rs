use crate::data::Matrix;
use crate::errors::ColboostError;
use crate::exactsplitter::{ExactSplitter, ROOT};
use crate::node::{NodeStat, NodeType, TreeNode};
use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
}

impl Tree {
    pub fn new() -> Self {
        Tree { nodes: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, node: usize) -> Result<&TreeNode, ColboostError> {
        self.nodes.get(node).ok_or(ColboostError::UnknownNode(node))
    }

    /// Start a new tree, holding only a splittable root.
    pub fn add_root(&mut self, stat: NodeStat) {
        self.nodes.clear();
        self.nodes.push(TreeNode::new(ROOT, None, 0, stat));
    }

    /// Record the split on `parent`, and append its two children,
    /// returning their ids.
    pub fn add_children(
        &mut self,
        parent: usize,
        split_feature: usize,
        split_value: f64,
        split_gain: f64,
        left_stat: NodeStat,
        right_stat: NodeStat,
    ) -> Result<(usize, usize), ColboostError> {
        let left_child = self.nodes.len();
        let right_child = left_child + 1;
        let n = self
            .nodes
            .get_mut(parent)
            .ok_or(ColboostError::UnknownNode(parent))?;
        n.node_type = NodeType::Parent {
            split_feature,
            split_value,
            split_gain,
            left_child,
            right_child,
        };
        let depth = n.depth + 1;
        self.nodes
            .push(TreeNode::new(left_child, Some(parent), depth, left_stat));
        self.nodes
            .push(TreeNode::new(right_child, Some(parent), depth, right_stat));
        Ok((left_child, right_child))
    }

    pub fn set_leaf(&mut self, node: usize, weight: f64) -> Result<(), ColboostError> {
        let n = self
            .nodes
            .get_mut(node)
            .ok_or(ColboostError::UnknownNode(node))?;
        n.node_type = NodeType::Leaf { weight };
        Ok(())
    }

    /// Grow a tree level by level. Every active node is either split, or
    /// if no split with positive gain exists, or it sits at `max_depth`,
    /// finalized as a leaf. Children of one level are registered as the
    /// active nodes of the next. If growing fails, the splitter is
    /// cleared before the error is returned, so it can fit another tree.
    pub fn fit(
        &mut self,
        splitter: &mut ExactSplitter,
        predictions: &[f64],
        targets: &[f64],
        max_depth: usize,
    ) -> Result<(), ColboostError> {
        let root = splitter.compute_gradients(predictions, targets)?;
        self.add_root(root);
        self.grow(splitter, max_depth).map_err(|e| {
            splitter.clear();
            e
        })
    }

    fn grow(&mut self, splitter: &mut ExactSplitter, max_depth: usize) -> Result<(), ColboostError> {
        let mut depth = 0;
        while !splitter.active().is_empty() {
            let candidates = splitter.find_best_splits()?;
            let mut next = Vec::new();
            let mut n_leaves = 0;
            for candidate in candidates.iter() {
                if candidate.split.is_split() && self.get(candidate.node)?.depth < max_depth {
                    let (left, right) = splitter.execute_split(self, candidate)?;
                    next.push((left, candidate.left_stat));
                    next.push((right, candidate.right_stat));
                } else {
                    splitter.finalize(self, candidate.node)?;
                    n_leaves += 1;
                }
            }
            debug!(
                "Depth {}: {} active nodes, {} split, {} leaves.",
                depth,
                candidates.len(),
                next.len() / 2,
                n_leaves
            );
            splitter.update_node_stat(&next)?;
            depth += 1;
        }
        Ok(())
    }

    /// Traverse the tree for a single row. A value below the split value,
    /// or a missing value, goes left, and so does a row too short to hold
    /// the split feature. An empty tree predicts 0.
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        let mut node = match self.nodes.get(ROOT) {
            Some(n) => n,
            None => return 0.0,
        };
        loop {
            match &node.node_type {
                NodeType::Leaf { weight } => return *weight,
                NodeType::Parent {
                    split_feature,
                    split_value,
                    left_child,
                    right_child,
                    ..
                } => {
                    let v = row.get(*split_feature).copied().unwrap_or(f64::NAN);
                    let next = if v.is_nan() || v < *split_value {
                        *left_child
                    } else {
                        *right_child
                    };
                    node = match self.nodes.get(next) {
                        Some(n) => n,
                        None => return 0.0,
                    };
                }
                // Only reachable on a tree that has not finished growing.
                NodeType::Splittable => return 0.0,
            }
        }
    }

    pub fn predict(&self, data: &Matrix<f64>, parallel: bool) -> Vec<f64> {
        if parallel {
            (0..data.rows)
                .into_par_iter()
                .map(|i| self.predict_row(&data.get_row(i)))
                .collect()
        } else {
            (0..data.rows)
                .map(|i| self.predict_row(&data.get_row(i)))
                .collect()
        }
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut print_buffer: Vec<usize> = Vec::new();
        if !self.nodes.is_empty() {
            print_buffer.push(ROOT);
        }
        let mut r = String::new();
        while let Some(idx) = print_buffer.pop() {
            let n = &self.nodes[idx];
            r += format!("{}{}\n", "      ".repeat(n.depth).as_str(), n).as_str();
            if let NodeType::Parent {
                left_child,
                right_child,
                ..
            } = n.node_type
            {
                print_buffer.push(right_child);
                print_buffer.push(left_child);
            }
        }
        write!(f, "{}", r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::FeatureColumns;
    use crate::objective::{ObjectiveFunction, SquaredLoss};

    #[test]
    fn test_tree_fit() {
        // Two features, the first separates the targets, the second is noise
        // and missing for every third row.
        let rows = 60;
        let mut data: Vec<f64> = (0..rows).map(|i| (i % 10) as f64).collect();
        data.extend((0..rows).map(|i| if i % 3 == 0 { f64::NAN } else { ((i * 7) % 5) as f64 }));
        let y: Vec<f64> = (0..rows).map(|i| if i % 10 < 5 { -2.0 } else { 2.0 }).collect();
        let matrix = Matrix::new(&data, rows, 2);
        let columns = FeatureColumns::from_matrix(&matrix);
        let mut splitter = ExactSplitter::new(&columns, 1.0, 0.0);
        let yhat = vec![0.0; rows];

        let mut tree = Tree::new();
        tree.fit(&mut splitter, &yhat, &y, 3).unwrap();
        println!("{}", tree);

        let root = tree.get(ROOT).unwrap();
        match root.node_type {
            NodeType::Parent {
                split_feature,
                split_value,
                ..
            } => {
                assert_eq!(split_feature, 0);
                assert_eq!(split_value, 4.5);
            }
            _ => panic!("Root should have been split."),
        }
        assert!(splitter.active().is_empty());
        assert!(splitter.node_ids().iter().all(|n| n.is_none()));
        assert!(tree.nodes.iter().all(|n| !matches!(n.node_type, NodeType::Splittable)));
        assert!(tree.nodes.iter().all(|n| n.depth <= 3));

        let leaf_cover: f64 = tree
            .nodes
            .iter()
            .filter(|n| n.is_leaf())
            .map(|n| n.stat.sum_hess)
            .sum();
        assert_eq!(leaf_cover, rows as f64);

        let preds = tree.predict(&matrix, false);
        assert_eq!(preds, tree.predict(&matrix, true));
        let before: f64 = SquaredLoss::calc_loss(&y, &yhat).iter().sum();
        let after: f64 = SquaredLoss::calc_loss(&y, &preds).iter().sum();
        assert!(after < before);
        // Each side of the root is pure, so the leaves are shrunk targets.
        assert_eq!(preds[0], 2.0 * 30.0 / 31.0 * -1.0);
    }

    #[test]
    fn test_tree_fit_max_depth_zero() {
        let data = vec![1.0, 2.0, 3.0, 4.0];
        let matrix = Matrix::new(&data, 4, 1);
        let columns = FeatureColumns::from_matrix(&matrix);
        let mut splitter = ExactSplitter::new(&columns, 1.0, 0.0);
        let mut tree = Tree::new();
        tree.fit(&mut splitter, &[0.0; 4], &[1.0, 1.0, 3.0, 3.0], 0)
            .unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.nodes[0].node_type, NodeType::Leaf { weight: 8.0 / 5.0 });
        // Trees can be fit again with the same splitter.
        tree.fit(&mut splitter, &[0.0; 4], &[1.0, 1.0, 3.0, 3.0], 1)
            .unwrap();
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn test_predict_missing_goes_left() {
        let mut tree = Tree::new();
        tree.add_root(NodeStat::new(0.0, 2.0));
        let (l, r) = tree
            .add_children(ROOT, 1, 0.5, 1.0, NodeStat::new(-1.0, 1.0), NodeStat::new(1.0, 1.0))
            .unwrap();
        tree.set_leaf(l, -1.0).unwrap();
        tree.set_leaf(r, 1.0).unwrap();
        assert_eq!(tree.predict_row(&[0.0, f64::NAN]), -1.0);
        assert_eq!(tree.predict_row(&[0.0, 0.5]), 1.0);
        assert_eq!(tree.predict_row(&[0.0, 0.2]), -1.0);
        assert!(tree.set_leaf(9, 0.0).is_err());
        // Too short to hold feature 1, so treated as missing.
        assert_eq!(tree.predict_row(&[0.0]), -1.0);
    }

    #[test]
    fn test_predict_empty_tree() {
        let tree = Tree::new();
        assert_eq!(tree.predict_row(&[1.0, 2.0]), 0.0);
        let data = vec![1.0, 2.0];
        assert_eq!(tree.predict(&Matrix::new(&data, 2, 1), false), vec![0.0, 0.0]);
    }

    #[test]
    fn test_tree_fit_recovers_after_error() {
        let data = vec![1.0, 2.0, 3.0, 4.0];
        let matrix = Matrix::new(&data, 4, 1);
        let columns = FeatureColumns::from_matrix(&matrix);
        let mut splitter = ExactSplitter::new(&columns, 1.0, 0.0);
        let y = [1.0, 1.0, 3.0, 3.0];

        // Growing into a tree that lost its nodes fails half way.
        splitter.compute_gradients(&[0.0; 4], &y).unwrap();
        let mut broken = Tree::new();
        assert!(matches!(
            broken.grow(&mut splitter, 3),
            Err(ColboostError::UnknownNode(ROOT))
        ));
        assert!(!splitter.active().is_empty());
        splitter.clear();
        assert!(splitter.active().is_empty());
        assert!(splitter.node_ids().iter().all(|n| n.is_none()));

        let mut tree = Tree::new();
        tree.fit(&mut splitter, &[0.0; 4], &y, 3).unwrap();
        assert_eq!(tree.len(), 3);
        assert!(splitter.active().is_empty());
    }
}
