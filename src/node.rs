use serde::{Deserialize, Serialize};
use std::fmt;

/// Sufficient statistics of the instances assigned to a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
pub struct NodeStat {
    pub sum_gd: f64,
    pub sum_hess: f64,
}

impl NodeStat {
    pub fn new(sum_gd: f64, sum_hess: f64) -> Self {
        NodeStat { sum_gd, sum_hess }
    }

    pub fn add(&mut self, grad: f64, hess: f64) {
        self.sum_gd += grad;
        self.sum_hess += hess;
    }

    /// Calculate the statistics of one child, using the subtraction
    /// trick on the parent and the other child.
    pub fn from_parent_child(parent: &NodeStat, child: &NodeStat) -> Self {
        NodeStat {
            sum_gd: parent.sum_gd - child.sum_gd,
            sum_hess: parent.sum_hess - child.sum_hess,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum NodeType {
    /// Still eligible for a split attempt.
    Splittable,
    Parent {
        split_feature: usize,
        split_value: f64,
        split_gain: f64,
        left_child: usize,
        right_child: usize,
    },
    Leaf {
        weight: f64,
    },
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TreeNode {
    pub num: usize,
    pub parent: Option<usize>,
    pub depth: usize,
    pub stat: NodeStat,
    pub node_type: NodeType,
}

impl TreeNode {
    pub fn new(num: usize, parent: Option<usize>, depth: usize, stat: NodeStat) -> Self {
        TreeNode {
            num,
            parent,
            depth,
            stat,
            node_type: NodeType::Splittable,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.node_type, NodeType::Leaf { .. })
    }

    pub fn is_parent(&self) -> bool {
        matches!(self.node_type, NodeType::Parent { .. })
    }
}

impl fmt::Display for TreeNode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.node_type {
            NodeType::Leaf { weight } => write!(
                f,
                "{}:leaf={},cover={}",
                self.num, weight, self.stat.sum_hess
            ),
            NodeType::Parent {
                split_feature,
                split_value,
                split_gain,
                left_child,
                right_child,
            } => write!(
                f,
                "{}:[{} < {}] yes={},no={},gain={},cover={}",
                self.num,
                split_feature,
                split_value,
                left_child,
                right_child,
                split_gain,
                self.stat.sum_hess
            ),
            NodeType::Splittable => write!(
                f,
                "{}:splittable,cover={}",
                self.num, self.stat.sum_hess
            ),
        }
    }
}
