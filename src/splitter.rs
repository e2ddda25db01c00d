use crate::errors::ColboostError;
use crate::node::NodeStat;
use crate::objective::GradientPair;
use crate::utils::split_gain;

/// Two consecutive values closer than this are treated as the
/// same value, and are never separated by a split.
pub const VALUE_TOLERANCE: f64 = 0.000002;

/// Below this hessian sum, a scan accumulator is considered
/// untouched, the next instance it sees is its first.
pub const FIRST_HIT_HESSIAN: f64 = 0.0001;

/// Best known split of a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitPoint {
    pub gain: f64,
    pub split_value: f64,
    /// `None` until a candidate with positive gain has been seen.
    pub split_feature: Option<usize>,
}

impl Default for SplitPoint {
    fn default() -> Self {
        SplitPoint {
            gain: 0.0,
            split_value: 0.0,
            split_feature: None,
        }
    }
}

impl SplitPoint {
    /// Replace the split if `gain` is strictly better, returning
    /// whether an update happened.
    pub fn update(&mut self, gain: f64, split_value: f64, split_feature: usize) -> bool {
        if gain > self.gain {
            self.gain = gain;
            self.split_value = split_value;
            self.split_feature = Some(split_feature);
            true
        } else {
            false
        }
    }

    pub fn is_split(&self) -> bool {
        self.split_feature.is_some()
    }
}

/// The outcome of a split search for one node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitCandidate {
    pub node: usize,
    pub split: SplitPoint,
    /// The parent minus `right_stat`. This also holds the instances
    /// missing the split feature, which are sent left.
    pub left_stat: NodeStat,
    /// Statistics of the instances at or above the threshold.
    pub right_stat: NodeStat,
}

impl SplitCandidate {
    pub fn empty(node: usize) -> Self {
        SplitCandidate {
            node,
            split: SplitPoint::default(),
            left_stat: NodeStat::default(),
            right_stat: NodeStat::default(),
        }
    }

    /// Record `boundary` for `feature`, if it beats the current best.
    pub fn update(&mut self, boundary: &Boundary, feature: usize) -> bool {
        let updated = self
            .split
            .update(boundary.gain, boundary.split_value, feature);
        if updated {
            self.left_stat = boundary.complement;
            self.right_stat = boundary.scanned;
        }
        updated
    }

    /// Keep whichever of the two candidates has the higher gain,
    /// on a tie `self` wins.
    pub fn merge(&mut self, other: &SplitCandidate) {
        if let Some(feature) = other.split.split_feature {
            if self
                .split
                .update(other.split.gain, other.split.split_value, feature)
            {
                self.left_stat = other.left_stat;
                self.right_stat = other.right_stat;
            }
        }
    }
}

/// A valid split boundary found while scanning a column.
#[derive(Debug, Clone, Copy)]
pub struct Boundary {
    pub gain: f64,
    pub split_value: f64,
    pub scanned: NodeStat,
    pub complement: NodeStat,
}

/// Running state of one node, while a single feature column is
/// scanned from its largest value down. What has been scanned is the
/// right side of a split, the complement holds the smaller values and
/// the instances missing the feature.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanState {
    /// Statistics of every instance of the node scanned so far.
    pub scanned: NodeStat,
    pub last_value: f64,
}

impl ScanState {
    fn is_first_hit(&self) -> bool {
        self.scanned.sum_hess.abs() < FIRST_HIT_HESSIAN
    }

    /// Visit the next instance of the node. If the value is far enough
    /// from the last one, and both sides would hold enough hessian, the
    /// boundary between the two values is returned.
    pub fn visit<S: Splitter + ?Sized>(
        &mut self,
        splitter: &S,
        parent: &NodeStat,
        value: f64,
        pair: &GradientPair,
    ) -> Result<Option<Boundary>, ColboostError> {
        let mut boundary = None;
        if !self.is_first_hit() {
            let min_child_weight = splitter.get_min_child_weight();
            if (value - self.last_value).abs() > VALUE_TOLERANCE
                && self.scanned.sum_hess >= min_child_weight
            {
                let complement = NodeStat::from_parent_child(parent, &self.scanned);
                if complement.sum_hess >= min_child_weight {
                    let gain = split_gain(
                        splitter.get_l2(),
                        splitter.get_gamma(),
                        parent,
                        &self.scanned,
                        &complement,
                    )?;
                    boundary = Some(Boundary {
                        gain,
                        split_value: (value + self.last_value) * 0.5,
                        scanned: self.scanned,
                        complement,
                    });
                }
            }
        }
        self.scanned.add(pair.grad, pair.hess);
        self.last_value = value;
        Ok(boundary)
    }
}

/// Regularization a split search is run with.
pub trait Splitter {
    fn get_l2(&self) -> f64;
    fn get_gamma(&self) -> f64;
    fn get_min_child_weight(&self) -> f64;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Params;
    impl Splitter for Params {
        fn get_l2(&self) -> f64 {
            1.0
        }
        fn get_gamma(&self) -> f64 {
            0.0
        }
        fn get_min_child_weight(&self) -> f64 {
            1.0
        }
    }

    #[test]
    fn test_split_point_update() {
        let mut sp = SplitPoint::default();
        assert!(!sp.is_split());
        assert!(!sp.update(0.0, 1.0, 0));
        assert!(!sp.update(-1.0, 1.0, 0));
        assert!(sp.update(2.0, 1.5, 3));
        assert!(!sp.update(2.0, 4.5, 1));
        assert_eq!(sp.split_feature, Some(3));
        assert_eq!(sp.split_value, 1.5);
    }

    #[test]
    fn test_scan_state() {
        let parent = NodeStat::new(0.0, 4.0);
        let values = [5.0, 3.0, 1.0 + 1e-7, 1.0];
        let grads = [1.0, 1.0, -1.0, -1.0];
        let mut state = ScanState::default();
        let boundaries: Vec<Option<Boundary>> = values
            .iter()
            .zip(grads)
            .map(|(v, g)| {
                state
                    .visit(&Params, &parent, *v, &GradientPair { grad: g, hess: 1.0 })
                    .unwrap()
            })
            .collect();
        assert!(boundaries[0].is_none());
        let b = boundaries[1].unwrap();
        assert_eq!(b.split_value, 4.0);
        assert!((b.gain - 0.75).abs() < 1e-12);
        let b = boundaries[2].unwrap();
        assert_eq!(b.split_value, (values[2] + 3.0) * 0.5);
        assert_eq!(b.scanned, NodeStat::new(2.0, 2.0));
        assert_eq!(b.complement, NodeStat::new(-2.0, 2.0));
        assert!((b.gain - 8.0 / 3.0).abs() < 1e-12);
        assert!(boundaries[3].is_none());
        assert_eq!(state.scanned, parent);
    }

    #[test]
    fn test_candidate_merge_prefers_self_on_tie() {
        let mut a = SplitCandidate::empty(0);
        let boundary = Boundary {
            gain: 1.0,
            split_value: 2.0,
            scanned: NodeStat::new(-1.0, 1.0),
            complement: NodeStat::new(1.0, 1.0),
        };
        assert!(a.update(&boundary, 0));
        assert_eq!(a.right_stat, boundary.scanned);
        assert_eq!(a.left_stat, boundary.complement);
        let mut b = SplitCandidate::empty(0);
        b.update(&Boundary { split_value: 9.0, ..boundary }, 1);
        a.merge(&b);
        assert_eq!(a.split.split_feature, Some(0));
        b.split.gain = 1.5;
        a.merge(&b);
        assert_eq!(a.split.split_feature, Some(1));
        assert_eq!(a.split.split_value, 9.0);
    }
}
