use crate::errors::ColboostError;
use crate::node::NodeStat;

/// Tolerance used when checking that gradient sums of two
/// children add up to their parent.
pub const GRADIENT_TOLERANCE: f64 = 0.0001;

/// Calculate the ridge regularized newton step for a node.
#[inline]
pub fn weight(l2: f64, gradient_sum: f64, hessian_sum: f64) -> f64 {
    -(gradient_sum / (hessian_sum + l2))
}

/// Calculate the score a node contributes to a split.
#[inline]
pub fn gain(l2: f64, gradient_sum: f64, hessian_sum: f64) -> f64 {
    (gradient_sum * gradient_sum) / (hessian_sum + l2)
}

/// Gain of splitting `parent` into `right` and `left`. The
/// complexity penalty `gamma` is taken off every evaluated split,
/// there is no halving of the score difference.
///
/// The children must partition the parent, hessian sums exactly,
/// gradient sums within [`GRADIENT_TOLERANCE`].
pub fn split_gain(
    l2: f64,
    gamma: f64,
    parent: &NodeStat,
    right: &NodeStat,
    left: &NodeStat,
) -> Result<f64, ColboostError> {
    check_partition(parent, left, right)?;
    let split_gain = gain(l2, left.sum_gd, left.sum_hess) + gain(l2, right.sum_gd, right.sum_hess)
        - gain(l2, parent.sum_gd, parent.sum_hess);
    Ok(split_gain - gamma)
}

/// Confirm two children add up to their parent.
pub fn check_partition(parent: &NodeStat, left: &NodeStat, right: &NodeStat) -> Result<(), ColboostError> {
    #[allow(clippy::float_cmp)]
    let hess_matches = parent.sum_hess == left.sum_hess + right.sum_hess;
    let grad_matches = (parent.sum_gd - left.sum_gd - right.sum_gd).abs() < GRADIENT_TOLERANCE;
    if hess_matches && grad_matches {
        Ok(())
    } else {
        Err(ColboostError::StatisticsMismatch {
            parent_grad: parent.sum_gd,
            parent_hess: parent.sum_hess,
            left_grad: left.sum_gd,
            left_hess: left.sum_hess,
            right_grad: right.sum_gd,
            right_hess: right.sum_hess,
        })
    }
}
