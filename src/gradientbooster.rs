use crate::data::{FeatureColumns, Matrix};
use crate::errors::ColboostError;
use crate::exactsplitter::ExactSplitter;
use crate::metric::Metric;
use crate::tree::Tree;
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;

/// Gradient booster, growing one exact greedy tree per iteration
/// on the squared error of the current predictions.
#[derive(Debug, Deserialize, Serialize)]
pub struct GradientBooster {
    pub iterations: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub l2: f64,
    pub gamma: f64,
    pub min_child_weight: f64,
    pub base_score: f64,
    pub parallel: bool,
    pub evaluation_metric: Metric,
    pub trees: Vec<Tree>,
}

impl Default for GradientBooster {
    fn default() -> Self {
        Self::new(
            10,
            0.3,
            5,
            1.,
            0.,
            1.,
            0.5,
            true,
            Metric::RootMeanSquaredError,
        )
    }
}

impl GradientBooster {
    /// Gradient booster object
    ///
    /// * `iterations` - Total number of trees to train in the ensemble.
    /// * `learning_rate` - Step size, applied to every tree's output when
    ///   it is added to the predictions.
    /// * `max_depth` - Maximum depth of an individual tree.
    /// * `l2` - L2 regularization term.
    /// * `gamma` - Penalty taken off the gain of every evaluated split.
    /// * `min_child_weight` - Minimum hessian sum on each side of a split.
    /// * `base_score` - The initial prediction value of the model.
    /// * `parallel` - Scan features in parallel when searching for splits.
    /// * `evaluation_metric` - Metric logged after every iteration.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        iterations: usize,
        learning_rate: f64,
        max_depth: usize,
        l2: f64,
        gamma: f64,
        min_child_weight: f64,
        base_score: f64,
        parallel: bool,
        evaluation_metric: Metric,
    ) -> Self {
        GradientBooster {
            iterations,
            learning_rate,
            max_depth,
            l2,
            gamma,
            min_child_weight,
            base_score,
            parallel,
            evaluation_metric,
            trees: Vec::new(),
        }
    }

    /// Fit the booster on a dense, column major matrix, where NaN
    /// values are treated as missing.
    ///
    /// * `data` - The matrix of features.
    /// * `y` - The target values, one per row of `data`.
    pub fn fit(&mut self, data: &Matrix<f64>, y: &[f64]) -> Result<(), ColboostError> {
        if y.len() != data.rows {
            return Err(ColboostError::DataLength {
                what: "targets",
                expected: data.rows,
                found: y.len(),
            });
        }
        let columns = FeatureColumns::from_matrix(data);
        let mut splitter = ExactSplitter::new(&columns, self.l2, self.gamma)
            .set_min_child_weight(self.min_child_weight)
            .set_parallel(self.parallel);

        let mut yhat = vec![self.base_score; y.len()];
        self.trees = Vec::new();
        for i in 0..self.iterations {
            let mut tree = Tree::new();
            tree.fit(&mut splitter, &yhat, y, self.max_depth)?;
            for (p_, val) in yhat.iter_mut().zip(tree.predict(data, self.parallel)) {
                *p_ += self.learning_rate * val;
            }
            info!(
                "Iteration {}, {} nodes, {:?}: {}",
                i,
                tree.len(),
                self.evaluation_metric,
                self.evaluation_metric.calculate(y, &yhat)
            );
            self.trees.push(tree);
        }
        Ok(())
    }

    /// Generate predictions on data using the gradient booster.
    pub fn predict(&self, data: &Matrix<f64>, parallel: bool) -> Vec<f64> {
        let mut init_preds = vec![self.base_score; data.rows];
        self.trees.iter().for_each(|tree| {
            for (p_, val) in init_preds.iter_mut().zip(tree.predict(data, parallel)) {
                *p_ += self.learning_rate * val;
            }
        });
        init_preds
    }

    pub fn set_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn set_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn set_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn set_l2(mut self, l2: f64) -> Self {
        self.l2 = l2;
        self
    }

    pub fn set_gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    pub fn set_min_child_weight(mut self, min_child_weight: f64) -> Self {
        self.min_child_weight = min_child_weight;
        self
    }

    pub fn set_base_score(mut self, base_score: f64) -> Self {
        self.base_score = base_score;
        self
    }

    pub fn set_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn set_evaluation_metric(mut self, evaluation_metric: Metric) -> Self {
        self.evaluation_metric = evaluation_metric;
        self
    }

    /// Dump the booster, parameters and trees, as a JSON string.
    pub fn json_dump(&self) -> Result<String, ColboostError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json_str: &str) -> Result<Self, ColboostError> {
        Ok(serde_json::from_str::<GradientBooster>(json_str)?)
    }

    pub fn save_booster(&self, path: &str) -> Result<(), ColboostError> {
        fs::write(path, self.json_dump()?)?;
        Ok(())
    }

    pub fn load_booster(path: &str) -> Result<Self, ColboostError> {
        let json_str = fs::read_to_string(path)?;
        Self::from_json(&json_str)
    }
}
