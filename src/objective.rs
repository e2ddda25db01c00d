use serde::{Deserialize, Serialize};

/// First and second derivative of the loss for a single instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
pub struct GradientPair {
    pub grad: f64,
    pub hess: f64,
}

pub trait ObjectiveFunction {
    fn calc_loss(y: &[f64], yhat: &[f64]) -> Vec<f64>;
    fn calc_grad(y: &[f64], yhat: &[f64]) -> Vec<f64>;
    fn calc_hess(y: &[f64], yhat: &[f64]) -> Vec<f64>;

    /// Gradient and hessian pairs, one per instance.
    fn calc_gradient_pairs(y: &[f64], yhat: &[f64]) -> Vec<GradientPair> {
        Self::calc_grad(y, yhat)
            .into_iter()
            .zip(Self::calc_hess(y, yhat))
            .map(|(grad, hess)| GradientPair { grad, hess })
            .collect()
    }
}

/// Squared error, the gradient is `yhat - y`, and the
/// hessian is constant at one.
pub struct SquaredLoss {}

impl ObjectiveFunction for SquaredLoss {
    fn calc_loss(y: &[f64], yhat: &[f64]) -> Vec<f64> {
        y.iter()
            .zip(yhat)
            .map(|(y_, yhat_)| {
                let s = *y_ - *yhat_;
                s * s
            })
            .collect()
    }

    fn calc_grad(y: &[f64], yhat: &[f64]) -> Vec<f64> {
        y.iter().zip(yhat).map(|(y_, yhat_)| *yhat_ - *y_).collect()
    }

    fn calc_hess(y: &[f64], _: &[f64]) -> Vec<f64> {
        vec![1.0; y.len()]
    }
}
