use crate::activenodes::ActiveNodes;
use crate::data::FeatureColumns;
use crate::errors::ColboostError;
use crate::node::{NodeStat, NodeType};
use crate::objective::{GradientPair, ObjectiveFunction, SquaredLoss};
use crate::splitter::{ScanState, SplitCandidate, Splitter};
use crate::tree::Tree;
use crate::utils::{check_partition, weight};
use log::trace;
use rayon::prelude::*;

/// Id of the root node of every tree.
pub const ROOT: usize = 0;

/// Minimum hessian sum required on both sides of a split.
pub const MIN_CHILD_WEIGHT: f64 = 1.0;

/// Exact greedy splitter over sparse, sorted feature columns.
///
/// The splitter owns the per instance gradients, the instance to node
/// assignment, and the buffer of active nodes for the tree currently
/// being grown. An assignment of `None` means the instance has been
/// pruned, it sits in a finalized leaf.
pub struct ExactSplitter<'a> {
    pub l2: f64,
    pub gamma: f64,
    pub min_child_weight: f64,
    pub parallel: bool,
    columns: &'a FeatureColumns,
    gradients: Vec<GradientPair>,
    node_ids: Vec<Option<usize>>,
    active: ActiveNodes,
}

impl<'a> Splitter for ExactSplitter<'a> {
    fn get_l2(&self) -> f64 {
        self.l2
    }

    fn get_gamma(&self) -> f64 {
        self.gamma
    }

    fn get_min_child_weight(&self) -> f64 {
        self.min_child_weight
    }
}

impl<'a> ExactSplitter<'a> {
    pub fn new(columns: &'a FeatureColumns, l2: f64, gamma: f64) -> Self {
        ExactSplitter {
            l2,
            gamma,
            min_child_weight: MIN_CHILD_WEIGHT,
            parallel: false,
            columns,
            gradients: Vec::new(),
            node_ids: Vec::new(),
            active: ActiveNodes::new(),
        }
    }

    pub fn set_min_child_weight(mut self, min_child_weight: f64) -> Self {
        self.min_child_weight = min_child_weight;
        self
    }

    pub fn set_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn gradients(&self) -> &[GradientPair] {
        &self.gradients
    }

    pub fn node_ids(&self) -> &[Option<usize>] {
        &self.node_ids
    }

    pub fn active(&self) -> &ActiveNodes {
        &self.active
    }

    /// Compute the squared error gradients for a new boosting round.
    ///
    /// Every instance is assigned to the root, and the root becomes the
    /// only active node, at slot 0. The root statistics are returned.
    pub fn compute_gradients(
        &mut self,
        predictions: &[f64],
        targets: &[f64],
    ) -> Result<NodeStat, ColboostError> {
        let n_instances = self.columns.n_instances();
        if targets.len() != n_instances {
            return Err(ColboostError::DataLength {
                what: "targets",
                expected: n_instances,
                found: targets.len(),
            });
        }
        if predictions.len() != n_instances {
            return Err(ColboostError::DataLength {
                what: "predictions",
                expected: n_instances,
                found: predictions.len(),
            });
        }
        self.gradients = SquaredLoss::calc_gradient_pairs(targets, predictions);
        let mut root = NodeStat::default();
        for p in self.gradients.iter() {
            root.add(p.grad, p.hess);
        }
        self.active.reset(&[(ROOT, root)])?;
        self.node_ids = vec![Some(ROOT); n_instances];
        Ok(root)
    }

    /// Register the nodes that can be split at the next step. The
    /// buffer must have been emptied, by splitting or finalizing every
    /// node of the previous step.
    pub fn update_node_stat(&mut self, nodes: &[(usize, NodeStat)]) -> Result<(), ColboostError> {
        self.active.reset(nodes)
    }

    /// Sum the gradients of every instance currently assigned to `node`.
    pub fn compute_node_stat(&self, node: usize) -> NodeStat {
        let mut stat = NodeStat::default();
        for (node_id, p) in self.node_ids.iter().zip(self.gradients.iter()) {
            if *node_id == Some(node) {
                stat.add(p.grad, p.hess);
            }
        }
        stat
    }

    /// Find the best split of a single feature, for a single node.
    pub fn best_feature_split(
        &self,
        node: usize,
        parent: &NodeStat,
        feature: usize,
    ) -> Result<SplitCandidate, ColboostError> {
        let mut candidate = SplitCandidate::empty(node);
        let mut state = ScanState::default();
        for kv in self.columns.get_col(feature).iter().rev() {
            if self.node_ids[kv.id] != Some(node) {
                continue;
            }
            if let Some(boundary) = state.visit(self, parent, kv.value, &self.gradients[kv.id])? {
                candidate.update(&boundary, feature);
            }
        }
        Ok(candidate)
    }

    /// Find the best split of a single node, looking at every feature.
    pub fn best_split_for_node(
        &self,
        node: usize,
        parent: &NodeStat,
    ) -> Result<SplitCandidate, ColboostError> {
        let mut best = SplitCandidate::empty(node);
        for feature in 0..self.columns.n_features() {
            let candidate = self.best_feature_split(node, parent, feature)?;
            best.merge(&candidate);
        }
        Ok(best)
    }

    /// Scan one feature for every active node at once, returning the
    /// best candidate of each slot.
    fn feature_candidates(&self, feature: usize) -> Result<Vec<SplitCandidate>, ColboostError> {
        let n_slots = self.active.n_slots();
        let mut states = vec![ScanState::default(); n_slots];
        let mut candidates = self.empty_candidates();
        for kv in self.columns.get_col(feature).iter().rev() {
            // Pruned instances, and instances of nodes that are not
            // registered yet, take no part in the search.
            let pos = match self.node_ids[kv.id].and_then(|n| self.active.position(n)) {
                Some(pos) => pos,
                None => continue,
            };
            let parent = self.active.stat_at(pos);
            if let Some(boundary) = states[pos].visit(self, parent, kv.value, &self.gradients[kv.id])? {
                candidates[pos].update(&boundary, feature);
            }
        }
        Ok(candidates)
    }

    fn empty_candidates(&self) -> Vec<SplitCandidate> {
        let mut candidates = vec![SplitCandidate::empty(ROOT); self.active.n_slots()];
        for (pos, node, _) in self.active.iter() {
            candidates[pos].node = node;
        }
        candidates
    }

    /// Find the best split of every active node, scanning each feature
    /// column once. Candidates are returned in slot order. Features are
    /// merged in ascending order, so on equal gain the lowest feature
    /// wins, whether or not the features were scanned in parallel.
    pub fn find_best_splits(&self) -> Result<Vec<SplitCandidate>, ColboostError> {
        let mut best = self.empty_candidates();
        let n_features = self.columns.n_features();
        if self.parallel {
            let per_feature = (0..n_features)
                .into_par_iter()
                .map(|feature| self.feature_candidates(feature))
                .collect::<Result<Vec<_>, _>>()?;
            for candidates in per_feature.iter() {
                merge_candidates(&mut best, candidates);
            }
        } else {
            for feature in 0..n_features {
                let candidates = self.feature_candidates(feature)?;
                merge_candidates(&mut best, &candidates);
            }
        }
        Ok(self.active.iter().map(|(pos, _, _)| best[pos]).collect())
    }

    /// Split the node of `candidate` into two fresh children, moving
    /// every instance of the node into one of them. Instances with a
    /// value at or above the split value go right, the rest go left, and
    /// so do instances missing the split feature. The children take the
    /// statistics recorded by the search. The node leaves the active
    /// buffer, the children are returned, to be registered with
    /// [`ExactSplitter::update_node_stat`].
    pub fn execute_split(
        &mut self,
        tree: &mut Tree,
        candidate: &SplitCandidate,
    ) -> Result<(usize, usize), ColboostError> {
        let node = candidate.node;
        let split = &candidate.split;
        let parent = *self.active.stat(node)?;
        if !matches!(tree.get(node)?.node_type, NodeType::Splittable) {
            return Err(ColboostError::InvalidSplit(node));
        }
        let feature = split
            .split_feature
            .filter(|f| *f < self.columns.n_features())
            .ok_or(ColboostError::InvalidSplit(node))?;
        let (left, right) = (candidate.left_stat, candidate.right_stat);
        check_partition(&parent, &left, &right)?;
        let left_child = tree.len();
        let right_child = left_child + 1;

        self.update_node_ids(feature, split.split_value, node, left_child, right_child);
        tree.add_children(node, feature, split.split_value, split.gain, left, right)?;
        self.active.remove(node);
        trace!(
            "Split node {} on feature {} at {}, gain {}, left cover {}, right cover {}.",
            node,
            feature,
            split.split_value,
            split.gain,
            left.sum_hess,
            right.sum_hess
        );
        Ok((left_child, right_child))
    }

    /// Move the instances of `parent` to its children.
    fn update_node_ids(
        &mut self,
        feature: usize,
        split_value: f64,
        parent: usize,
        left_child: usize,
        right_child: usize,
    ) {
        for kv in self.columns.get_col(feature) {
            if self.node_ids[kv.id] != Some(parent) {
                continue;
            }
            if kv.value >= split_value {
                self.node_ids[kv.id] = Some(right_child);
            } else {
                self.node_ids[kv.id] = Some(left_child);
            }
        }
        // Anything the parent still owns has no value for the feature.
        for node_id in self.node_ids.iter_mut() {
            if *node_id == Some(parent) {
                *node_id = Some(left_child);
            }
        }
    }

    /// Weight of `node` as a leaf, the ridge regularized newton step.
    pub fn leaf_weight(&self, node: usize) -> Result<f64, ColboostError> {
        let stat = self.active.stat(node)?;
        Ok(weight(self.l2, stat.sum_gd, stat.sum_hess))
    }

    /// Turn `node` into a leaf. The leaf weight is stored on the tree
    /// node, the node leaves the active buffer, and its instances are
    /// pruned. Finalizing a leaf twice does nothing, finalizing a node
    /// that has already been split is an error.
    pub fn finalize(&mut self, tree: &mut Tree, node: usize) -> Result<(), ColboostError> {
        let node_type = tree.get(node)?.node_type.clone();
        match node_type {
            NodeType::Leaf { .. } => Ok(()),
            NodeType::Parent { .. } => Err(ColboostError::FinalizeSplitNode(node)),
            NodeType::Splittable => {
                let w = self.leaf_weight(node)?;
                tree.set_leaf(node, w)?;
                self.mark_processed(node);
                trace!("Finalized node {} with weight {}.", node, w);
                Ok(())
            }
        }
    }

    /// Abandon the tree being grown: every active node is dropped and
    /// every instance pruned, so the next round can start.
    pub fn clear(&mut self) {
        self.active.clear();
        self.node_ids.iter_mut().for_each(|node_id| *node_id = None);
    }

    fn mark_processed(&mut self, node: usize) {
        self.active.remove(node);
        for node_id in self.node_ids.iter_mut() {
            if *node_id == Some(node) {
                *node_id = None;
            }
        }
    }
}

fn merge_candidates(best: &mut [SplitCandidate], candidates: &[SplitCandidate]) {
    for (b, c) in best.iter_mut().zip(candidates.iter()) {
        b.merge(c);
    }
}
