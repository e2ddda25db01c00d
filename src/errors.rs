use thiserror::Error;

#[derive(Debug, Error)]
pub enum ColboostError {
    #[error("Active node buffer must be empty before it is reinitialized, but it holds {0} nodes.")]
    ActiveBufferNotEmpty(usize),
    #[error("Node {0} is not in the active node buffer.")]
    NodeNotActive(usize),
    #[error("Node {0} does not exist in the tree.")]
    UnknownNode(usize),
    #[error("Node {0} has already been split, and cannot be finalized as a leaf.")]
    FinalizeSplitNode(usize),
    #[error("Split point for node {0} does not name a valid feature.")]
    InvalidSplit(usize),
    #[error("Child statistics do not add up to the parent: parent ({parent_grad}, {parent_hess}), left ({left_grad}, {left_hess}), right ({right_grad}, {right_hess}).")]
    StatisticsMismatch {
        parent_grad: f64,
        parent_hess: f64,
        left_grad: f64,
        left_hess: f64,
        right_grad: f64,
        right_hess: f64,
    },
    #[error("Length mismatch: expected {expected} values for {what}, found {found}.")]
    DataLength {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("Feature {feature} holds an invalid entry for instance {id}: {reason}.")]
    InvalidEntry {
        feature: usize,
        id: usize,
        reason: &'static str,
    },
    #[error("Unable to read or write the model file.")]
    Io(#[from] std::io::Error),
    #[error("Unable to serialize or deserialize the model.")]
    Serialization(#[from] serde_json::Error),
}
