use crate::errors::ColboostError;
use crate::node::NodeStat;
use std::collections::HashMap;

/// Buffer of the nodes currently eligible for a split.
///
/// Every active node owns one dense slot, holding its statistics.
/// The keys of `positions` are exactly the splittable node ids, and
/// slots are only handed out by [`ActiveNodes::reset`], so no two
/// components can disagree on where a node lives. Slots are valid
/// from one reset to the next; removing a node releases its slot
/// without moving any other node.
#[derive(Debug, Default)]
pub struct ActiveNodes {
    positions: HashMap<usize, usize>,
    slots: Vec<Option<usize>>,
    stats: Vec<NodeStat>,
}

impl ActiveNodes {
    pub fn new() -> Self {
        ActiveNodes::default()
    }

    /// Register the next set of splittable nodes, at slots `0..n`.
    /// Every node from the previous set must have been removed first.
    pub fn reset(&mut self, nodes: &[(usize, NodeStat)]) -> Result<(), ColboostError> {
        if !self.positions.is_empty() {
            return Err(ColboostError::ActiveBufferNotEmpty(self.positions.len()));
        }
        self.slots.clear();
        self.stats.clear();
        for (pos, (node, stat)) in nodes.iter().enumerate() {
            self.positions.insert(*node, pos);
            self.slots.push(Some(*node));
            self.stats.push(*stat);
        }
        Ok(())
    }

    /// Drop every node and slot, whatever state the buffer is in.
    pub fn clear(&mut self) {
        self.positions.clear();
        self.slots.clear();
        self.stats.clear();
    }

    /// Release the slot of a node, returning its statistics. Removing
    /// a node that is not active returns `None`.
    pub fn remove(&mut self, node: usize) -> Option<NodeStat> {
        let pos = self.positions.remove(&node)?;
        self.slots[pos] = None;
        Some(self.stats[pos])
    }

    pub fn position(&self, node: usize) -> Option<usize> {
        self.positions.get(&node).copied()
    }

    pub fn contains(&self, node: usize) -> bool {
        self.positions.contains_key(&node)
    }

    pub fn stat(&self, node: usize) -> Result<&NodeStat, ColboostError> {
        self.position(node)
            .map(|pos| &self.stats[pos])
            .ok_or(ColboostError::NodeNotActive(node))
    }

    /// Statistics held at a slot.
    pub fn stat_at(&self, pos: usize) -> &NodeStat {
        &self.stats[pos]
    }

    /// Number of slots handed out by the last reset, including
    /// released ones. Scratch buffers indexed by slot use this size.
    pub fn n_slots(&self) -> usize {
        self.slots.len()
    }

    /// Number of nodes still active.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Active nodes and their statistics, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &NodeStat)> + '_ {
        self.slots
            .iter()
            .zip(self.stats.iter())
            .enumerate()
            .filter_map(|(pos, (node, stat))| node.map(|n| (pos, n, stat)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn test_reset_requires_empty() {
        let mut active = ActiveNodes::new();
        active.reset(&[(0, NodeStat::new(1.0, 4.0))]).unwrap();
        assert!(matches!(
            active.reset(&[(1, NodeStat::default())]),
            Err(ColboostError::ActiveBufferNotEmpty(1))
        ));
        assert_eq!(active.remove(0), Some(NodeStat::new(1.0, 4.0)));
        assert!(active.is_empty());
        active
            .reset(&[(3, NodeStat::new(1.0, 2.0)), (4, NodeStat::new(0.0, 2.0))])
            .unwrap();
        assert_eq!(active.position(3), Some(0));
        assert_eq!(active.position(4), Some(1));
        assert_eq!(active.len(), 2);
        active.clear();
        assert!(active.is_empty());
        assert_eq!(active.n_slots(), 0);
        active.reset(&[(0, NodeStat::default())]).unwrap();
    }

    #[test]
    fn test_remove_keeps_other_slots() {
        let mut active = ActiveNodes::new();
        active
            .reset(&[
                (1, NodeStat::new(1.0, 1.0)),
                (2, NodeStat::new(2.0, 2.0)),
                (5, NodeStat::new(3.0, 3.0)),
            ])
            .unwrap();
        assert!(active.remove(2).is_some());
        assert!(active.remove(2).is_none());
        assert_eq!(active.n_slots(), 3);
        assert_eq!(active.position(5), Some(2));
        assert_eq!(active.stat(5).unwrap().sum_hess, 3.0);
        assert!(matches!(active.stat(2), Err(ColboostError::NodeNotActive(2))));
        let nodes: Vec<(usize, usize)> = active.iter().map(|(pos, n, _)| (pos, n)).collect();
        assert_eq!(nodes, vec![(0, 1), (2, 5)]);
    }
}
