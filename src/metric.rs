use crate::objective::{ObjectiveFunction, SquaredLoss};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub enum Metric {
    SquaredError,
    RootMeanSquaredError,
}

impl Metric {
    pub fn calculate(&self, y: &[f64], yhat: &[f64]) -> f64 {
        match self {
            Metric::SquaredError => squared_error(y, yhat),
            Metric::RootMeanSquaredError => root_mean_squared_error(y, yhat),
        }
    }
}

/// Mean of the squared residuals.
pub fn squared_error(y: &[f64], yhat: &[f64]) -> f64 {
    if y.is_empty() {
        return 0.0;
    }
    let loss: f64 = SquaredLoss::calc_loss(y, yhat).iter().sum();
    loss / y.len() as f64
}

pub fn root_mean_squared_error(y: &[f64], yhat: &[f64]) -> f64 {
    squared_error(y, yhat).sqrt()
}
